use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use docshift_common::{Direction, Error, Result};
use docshift_db::{AppliedLog, AppliedRecord, CollectionLog, DocumentStore};
use tracing::{debug, error, info, warn};

use crate::checksum::checksum;
use crate::migration::{Migration, RegisteredMigration};
use crate::status::{MigrationReport, MigrationStatus};

/// Registers migrations and moves the database between versions, keeping the
/// applied-log in step with what has actually run.
///
/// The applied-log is the only source of truth for whether a version is
/// applied; the in-memory registry holds no state. Steps run strictly in
/// order and a batch stops at the first failure without undoing the steps
/// that already succeeded.
///
/// There is no locking: two processes running `up` against the same log at
/// the same time can both apply the same migration. Callers that need
/// multi-process safety must serialise access themselves.
///
/// ```ignore
/// let db = Arc::new(DocumentStore::open(&path)?);
/// let mut engine = MigrationEngine::new(db, "schema_migrations");
/// engine.register(Arc::new(CreateUsersCollection));
/// engine.up(None).await?;
/// ```
pub struct MigrationEngine {
    db: Arc<DocumentStore>,
    log: Arc<dyn AppliedLog>,
    migrations: HashMap<String, Arc<dyn Migration>>,
}

impl MigrationEngine {
    /// Engine whose applied-log lives in `collection` of the same store the
    /// migrations run against.
    pub fn new(db: Arc<DocumentStore>, collection: impl Into<String>) -> Self {
        let log = Arc::new(CollectionLog::new(db.clone(), collection));
        Self::with_log(db, log)
    }

    pub fn with_log(db: Arc<DocumentStore>, log: Arc<dyn AppliedLog>) -> Self {
        Self {
            db,
            log,
            migrations: HashMap::new(),
        }
    }

    pub fn database(&self) -> &Arc<DocumentStore> {
        &self.db
    }

    /// Add a migration. A migration with the same version replaces the
    /// previously registered one.
    pub fn register(&mut self, migration: Arc<dyn Migration>) {
        let version = migration.version().to_string();
        if self.migrations.insert(version.clone(), migration).is_some() {
            debug!("migration {version} re-registered, replacing previous definition");
        }
    }

    pub fn register_many<I>(&mut self, migrations: I)
    where
        I: IntoIterator<Item = Arc<dyn Migration>>,
    {
        for migration in migrations {
            self.register(migration);
        }
    }

    /// Every registered migration, ascending by version.
    pub fn registered(&self) -> Vec<RegisteredMigration> {
        let mut list: Vec<_> = self
            .migrations
            .values()
            .map(|m| RegisteredMigration {
                version: m.version().to_string(),
                description: m.description().to_string(),
            })
            .collect();
        list.sort_by(|a, b| a.version.cmp(&b.version));
        list
    }

    /// Status of every version that is registered, applied, or both,
    /// ascending by version.
    ///
    /// Applied versions without a registered migration are still reported,
    /// with the description frozen in the applied-log.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>> {
        let applied: HashMap<String, AppliedRecord> = self
            .applied_records()
            .await?
            .into_iter()
            .map(|r| (r.version.clone(), r))
            .collect();

        let mut versions: Vec<&str> = self
            .migrations
            .keys()
            .chain(applied.keys().filter(|v| !self.migrations.contains_key(*v)))
            .map(String::as_str)
            .collect();
        versions.sort_unstable();

        Ok(versions
            .into_iter()
            .map(|version| {
                let record = applied.get(version);
                let description = match (self.migrations.get(version), record) {
                    (Some(m), _) => m.description().to_string(),
                    (None, Some(r)) => r.description.clone(),
                    (None, None) => String::new(),
                };
                MigrationStatus {
                    version: version.to_string(),
                    description,
                    applied: record.is_some(),
                    applied_at: record.map(|r| r.applied_at),
                }
            })
            .collect())
    }

    /// Apply pending migrations in ascending order.
    ///
    /// With a target, stops after applying the target version. A target that
    /// is not pending (already applied or unknown) does not limit the batch.
    pub async fn up(&self, target: Option<&str>) -> Result<MigrationReport> {
        self.migrate(Direction::Up, target).await
    }

    /// Roll back applied migrations in descending order.
    ///
    /// With a target, stops before the target version: the target itself
    /// stays applied. Without one, every applied migration is rolled back.
    pub async fn down(&self, target: Option<&str>) -> Result<MigrationReport> {
        self.migrate(Direction::Down, target).await
    }

    /// Mark a registered migration as applied without running it.
    ///
    /// Overwrites any existing record for the version. For reconciling the
    /// log after a migration was applied by hand.
    pub async fn force(&self, version: &str) -> Result<()> {
        let migration = self
            .migrations
            .get(version)
            .ok_or_else(|| Error::NotFound(format!("migration {version} is not registered")))?;

        let record = applied_record(migration.as_ref());
        self.log
            .upsert(&record)
            .await
            .map_err(|e| e.into_persistence(&format!("force migration {version}")))?;

        warn!("migration {version} marked as applied without running it");
        Ok(())
    }

    async fn applied_records(&self) -> Result<Vec<AppliedRecord>> {
        self.log
            .list()
            .await
            .map_err(|e| e.into_persistence("read applied migrations"))
    }

    async fn migrate(&self, direction: Direction, target: Option<&str>) -> Result<MigrationReport> {
        let target = target.filter(|t| !t.is_empty());
        let applied: Vec<String> = self
            .applied_records()
            .await?
            .into_iter()
            .map(|r| r.version)
            .collect();

        let plan = self.plan(direction, target, &applied);
        let mut report = MigrationReport::new(direction);
        if plan.is_empty() {
            info!("no migrations to run {direction}");
            return Ok(report);
        }

        // Resolve the whole plan first so a missing migration fails the batch
        // before any step runs.
        let steps = plan
            .into_iter()
            .map(|version| {
                self.migrations
                    .get(&version)
                    .cloned()
                    .map(|m| (version.clone(), m))
                    .ok_or_else(|| {
                        Error::NotFound(format!(
                            "migration {version} is applied but not registered, cannot run {direction}"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("running {} migration(s) {direction}", steps.len());
        for (version, migration) in steps {
            self.execute(migration.as_ref(), direction).await?;
            report.executed.push(version);
        }

        Ok(report)
    }

    /// Versions to execute for a batch, in execution order.
    fn plan(&self, direction: Direction, target: Option<&str>, applied: &[String]) -> Vec<String> {
        let mut plan = Vec::new();
        match direction {
            Direction::Up => {
                let applied: HashSet<&str> = applied.iter().map(String::as_str).collect();
                let mut versions: Vec<&str> = self.migrations.keys().map(String::as_str).collect();
                versions.sort_unstable();

                for version in versions {
                    if applied.contains(version) {
                        continue;
                    }
                    plan.push(version.to_string());
                    if target == Some(version) {
                        break;
                    }
                }
            }
            Direction::Down => {
                let mut versions: Vec<&str> = applied.iter().map(String::as_str).collect();
                versions.sort_unstable_by(|a, b| b.cmp(a));
                versions.dedup();

                for version in versions {
                    if target == Some(version) {
                        break;
                    }
                    plan.push(version.to_string());
                }
            }
        }
        plan
    }

    async fn execute(&self, migration: &dyn Migration, direction: Direction) -> Result<()> {
        let version = migration.version();
        info!("migrating {version} {direction}: {}", migration.description());
        let started = Instant::now();

        match direction {
            Direction::Up => {
                migration
                    .up(&self.db)
                    .await
                    .map_err(|e| Error::step(version, direction, e))?;

                let record = applied_record(migration);
                if let Err(e) = self.log.insert(&record).await {
                    error!(
                        "migration {version} ran up but was not recorded, applied-log is behind the database: {e}"
                    );
                    return Err(e.into_persistence(&format!("record migration {version}")));
                }
            }
            Direction::Down => {
                migration
                    .down(&self.db)
                    .await
                    .map_err(|e| Error::step(version, direction, e))?;

                match self.log.remove(version).await {
                    Ok(true) => {}
                    Ok(false) => warn!("migration {version} rolled back but had no applied record"),
                    Err(e) => {
                        error!(
                            "migration {version} ran down but its record was not removed, applied-log is ahead of the database: {e}"
                        );
                        return Err(e.into_persistence(&format!("remove migration record {version}")));
                    }
                }
            }
        }

        info!(
            "migrated {version} {direction} in {}ms",
            started.elapsed().as_millis()
        );
        Ok(())
    }
}

fn applied_record(migration: &dyn Migration) -> AppliedRecord {
    AppliedRecord {
        version: migration.version().to_string(),
        description: migration.description().to_string(),
        applied_at: Utc::now(),
        checksum: checksum(migration),
    }
}

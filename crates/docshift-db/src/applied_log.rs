use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docshift_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::document_store::DocumentStore;

/// One applied migration, as persisted in the applied-log.
///
/// `description` is a snapshot taken when the migration ran. `checksum` is
/// provenance only; nothing compares it against the live migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    pub version: String,
    pub description: String,
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub checksum: String,
}

impl AppliedRecord {
    /// The persisted document shape: the record's fields keyed by `_id = version`.
    pub fn to_document(&self) -> Result<Value> {
        let mut doc = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut doc {
            map.insert("_id".into(), Value::String(self.version.clone()));
        }
        Ok(doc)
    }

    pub fn from_document(doc: Value) -> Result<Self> {
        serde_json::from_value(doc)
            .map_err(|e| Error::Persistence(format!("malformed applied record: {e}")))
    }
}

/// Durable record of which migrations have run.
///
/// Implementations report their failures as [`Error::Persistence`].
#[async_trait]
pub trait AppliedLog: Send + Sync {
    /// Every applied record, ascending by version, read as one snapshot.
    async fn list(&self) -> Result<Vec<AppliedRecord>>;

    /// Add a record for a version that is not yet applied.
    async fn insert(&self, record: &AppliedRecord) -> Result<()>;

    /// Add or overwrite the record for `record.version`.
    async fn upsert(&self, record: &AppliedRecord) -> Result<()>;

    /// Delete the record for `version`. Returns whether one existed.
    async fn remove(&self, version: &str) -> Result<bool>;
}

/// Applied-log kept as a collection inside a [`DocumentStore`].
pub struct CollectionLog {
    store: Arc<DocumentStore>,
    collection: String,
}

impl CollectionLog {
    pub fn new(store: Arc<DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl AppliedLog for CollectionLog {
    async fn list(&self) -> Result<Vec<AppliedRecord>> {
        let docs = self
            .store
            .find_sorted(&self.collection, &json!({}), "version")
            .map_err(|e| e.into_persistence("read applied migrations"))?;

        debug!("read {} applied records from {}", docs.len(), self.collection);
        docs.into_iter().map(AppliedRecord::from_document).collect()
    }

    async fn insert(&self, record: &AppliedRecord) -> Result<()> {
        let doc = record.to_document()?;
        self.store
            .insert_one(&self.collection, doc)
            .map_err(|e| e.into_persistence(&format!("record migration {}", record.version)))?;
        Ok(())
    }

    async fn upsert(&self, record: &AppliedRecord) -> Result<()> {
        let doc = record.to_document()?;
        self.store
            .replace_one(
                &self.collection,
                &json!({ "_id": record.version }),
                doc,
                true,
            )
            .map_err(|e| e.into_persistence(&format!("record migration {}", record.version)))?;
        Ok(())
    }

    async fn remove(&self, version: &str) -> Result<bool> {
        self.store
            .delete_one(&self.collection, &json!({ "_id": version }))
            .map_err(|e| e.into_persistence(&format!("remove migration record {version}")))
    }
}

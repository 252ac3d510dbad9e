use async_trait::async_trait;
use docshift_common::Result;
use docshift_db::DocumentStore;
use serde::{Deserialize, Serialize};

/// A versioned, reversible change to the document database.
///
/// Versions must be unique and sort lexicographically in the order the
/// migrations should run, e.g. `20240101_001` or `20240101_120000_add_index`.
/// The engine does not check the format.
#[async_trait]
pub trait Migration: Send + Sync {
    fn version(&self) -> &str;

    /// Human-readable summary, stored in the applied-log when the migration runs.
    fn description(&self) -> &str;

    /// Apply the change.
    async fn up(&self, db: &DocumentStore) -> Result<()>;

    /// Undo what `up` did.
    async fn down(&self, db: &DocumentStore) -> Result<()>;
}

/// A registered migration, as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredMigration {
    pub version: String,
    pub description: String,
}

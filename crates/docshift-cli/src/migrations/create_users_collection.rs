use async_trait::async_trait;
use docshift_common::Result;
use docshift_db::DocumentStore;
use docshift_engine::Migration;
use tracing::{info, warn};

const COLLECTION: &str = "users";
const INDEXES: &[&str] = &["email_unique", "username_unique", "created_at_status"];

/// Indexes for the `users` collection.
pub struct CreateUsersCollection;

#[async_trait]
impl Migration for CreateUsersCollection {
    fn version(&self) -> &str {
        "20231201_001"
    }

    fn description(&self) -> &str {
        "Create users collection with email and username indexes"
    }

    async fn up(&self, db: &DocumentStore) -> Result<()> {
        db.create_index(COLLECTION, "email_unique", &["email"], true)?;
        db.create_index(COLLECTION, "username_unique", &["username"], true)?;
        db.create_index(COLLECTION, "created_at_status", &["created_at", "status"], false)?;
        info!("created users indexes: {}", INDEXES.join(", "));
        Ok(())
    }

    async fn down(&self, db: &DocumentStore) -> Result<()> {
        // Keep going when one index is already gone.
        for name in INDEXES {
            match db.drop_index(COLLECTION, name) {
                Ok(true) => {}
                Ok(false) => warn!("index {name} on {COLLECTION} did not exist"),
                Err(e) => warn!("failed to drop index {name}: {e}"),
            }
        }
        Ok(())
    }
}

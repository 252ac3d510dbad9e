use async_trait::async_trait;
use chrono::Utc;
use docshift_common::Result;
use docshift_db::DocumentStore;
use docshift_engine::Migration;
use serde_json::json;

const ADMIN_ID: &str = "admin-001";
const CONFIG_IDS: &[&str] = &["app_settings", "email_settings"];

/// Seeds the admin account and the `system_config` documents.
pub struct AddDefaultData;

#[async_trait]
impl Migration for AddDefaultData {
    fn version(&self) -> &str {
        "20231201_002"
    }

    fn description(&self) -> &str {
        "Add default admin user and system configuration"
    }

    async fn up(&self, db: &DocumentStore) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        db.insert_one(
            "users",
            json!({
                "_id": ADMIN_ID,
                "username": "admin",
                "email": "admin@example.com",
                "role": "admin",
                "status": "active",
                "created_at": now,
                "updated_at": now,
            }),
        )?;

        db.insert_many(
            "system_config",
            vec![
                json!({
                    "_id": "app_settings",
                    "max_upload_size": 10_485_760,
                    "allowed_file_types": ["jpg", "png", "pdf", "docx"],
                    "maintenance_mode": false,
                    "created_at": now,
                }),
                json!({
                    "_id": "email_settings",
                    "smtp_host": "localhost",
                    "smtp_port": 587,
                    "from_email": "noreply@example.com",
                    "created_at": now,
                }),
            ],
        )?;
        Ok(())
    }

    async fn down(&self, db: &DocumentStore) -> Result<()> {
        db.delete_one("users", &json!({ "_id": ADMIN_ID }))?;
        for id in CONFIG_IDS {
            db.delete_one("system_config", &json!({ "_id": id }))?;
        }
        Ok(())
    }
}

pub mod checksum;
pub mod engine;
pub mod migration;
pub mod scaffold;
pub mod status;

pub use checksum::checksum;
pub use engine::MigrationEngine;
pub use migration::{Migration, RegisteredMigration};
pub use scaffold::MigrationTemplate;
pub use status::{MigrationReport, MigrationStatus, render_table};

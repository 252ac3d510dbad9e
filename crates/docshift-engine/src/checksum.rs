use ring::digest::{SHA256, digest};

use crate::migration::Migration;

/// Lowercase hex SHA-256 of `version:description`.
///
/// Stored with each applied record as provenance. It does not cover the
/// migration body, so it cannot detect changed migration code.
pub fn checksum(migration: &dyn Migration) -> String {
    checksum_of(migration.version(), migration.description())
}

pub fn checksum_of(version: &str, description: &str) -> String {
    let hash = digest(&SHA256, format!("{version}:{description}").as_bytes());
    hash.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}

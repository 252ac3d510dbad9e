use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use docshift_common::{Error, Result};
use regex::Regex;
use tracing::info;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// A new migration source file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTemplate {
    pub version: String,
    pub struct_name: String,
    pub file_name: String,
    pub contents: String,
}

/// Lowercase `name` and collapse every run of non-alphanumerics to `_`.
pub fn clean_name(name: &str) -> String {
    NON_ALNUM
        .replace_all(&name.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

fn struct_name(clean: &str) -> String {
    let mut out = String::with_capacity(clean.len());
    for part in clean.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    // Identifiers cannot start with a digit.
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'M');
    }
    out
}

impl MigrationTemplate {
    pub fn new(name: &str, description: &str, now: DateTime<Utc>) -> Result<Self> {
        let clean = clean_name(name);
        if clean.is_empty() {
            return Err(Error::Migration(format!(
                "migration name {name:?} has no usable characters"
            )));
        }
        let description = description.trim();
        let description = if description.is_empty() {
            name.trim()
        } else {
            description
        };

        let version = format!("{}_{clean}", now.format("%Y%m%d_%H%M%S"));
        let struct_name = struct_name(&clean);
        let contents = render(&version, &struct_name, description);

        Ok(Self {
            file_name: format!("{version}.rs"),
            version,
            struct_name,
            contents,
        })
    }

    /// Write the template into `dir`, creating the directory if needed.
    /// Fails if a file with the same name already exists.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => Error::Migration(format!(
                    "migration file already exists: {}",
                    path.display()
                )),
                _ => Error::Io(e),
            })?;
        file.write_all(self.contents.as_bytes())?;

        info!("created migration {} at {}", self.version, path.display());
        Ok(path)
    }
}

fn render(version: &str, struct_name: &str, description: &str) -> String {
    let description = description.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"use async_trait::async_trait;
use docshift_common::Result;
use docshift_db::DocumentStore;
use docshift_engine::Migration;

pub struct {struct_name};

#[async_trait]
impl Migration for {struct_name} {{
    fn version(&self) -> &str {{
        "{version}"
    }}

    fn description(&self) -> &str {{
        "{description}"
    }}

    async fn up(&self, db: &DocumentStore) -> Result<()> {{
        // e.g. db.create_index("users", "email_unique", &["email"], true)?;
        let _ = db;
        Ok(())
    }}

    async fn down(&self, db: &DocumentStore) -> Result<()> {{
        // e.g. db.drop_index("users", "email_unique")?;
        let _ = db;
        Ok(())
    }}
}}
"#
    )
}

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use docshift_common::{Error, Result};
use docshift_engine::{MigrationEngine, MigrationTemplate, render_table};
use rmcp::model::{self, JsonObject};
use serde_json::{Value, json};

/// What every tool call runs against.
#[derive(Clone)]
pub struct ToolContext {
    pub engine: Arc<MigrationEngine>,
    /// Directory `migration_create` writes templates into.
    pub migrations_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;
    async fn execute(&self, context: &ToolContext, args: Value) -> Result<ToolOutput>;

    /// Definition as listed by `tools/list`.
    fn definition(&self) -> model::Tool {
        let schema = match self.input_schema() {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        };
        model::Tool::new(self.name(), self.description(), Arc::new(schema))
    }
}

pub fn default_tools() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(MigrationStatusTool),
        Box::new(MigrationUpTool),
        Box::new(MigrationDownTool),
        Box::new(MigrationCreateTool),
        Box::new(MigrationListTool),
    ]
}

fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn version_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "version": { "type": "string", "description": description }
        }
    })
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim())),
        Some(_) => Err(Error::Other(format!("'{key}' must be a string"))),
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    optional_str(args, key)?.ok_or_else(|| Error::Other(format!("'{key}' is required")))
}

pub struct MigrationStatusTool;

#[async_trait]
impl Tool for MigrationStatusTool {
    fn name(&self) -> &'static str {
        "migration_status"
    }

    fn description(&self) -> &'static str {
        "Get the status of all migrations: which are applied and when"
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, context: &ToolContext, _args: Value) -> Result<ToolOutput> {
        let statuses = context.engine.status().await?;
        let pending = statuses.iter().filter(|s| s.is_pending()).count();
        Ok(ToolOutput::text(format!(
            "{}\n{} migration(s), {pending} pending",
            render_table(&statuses),
            statuses.len()
        )))
    }
}

pub struct MigrationUpTool;

#[async_trait]
impl Tool for MigrationUpTool {
    fn name(&self) -> &'static str {
        "migration_up"
    }

    fn description(&self) -> &'static str {
        "Apply pending migrations, up to and including a version if one is given"
    }

    fn input_schema(&self) -> Value {
        version_schema(
            "Migration version to migrate up to (optional, applies all pending migrations when omitted)",
        )
    }

    async fn execute(&self, context: &ToolContext, args: Value) -> Result<ToolOutput> {
        let target = optional_str(&args, "version")?;
        let report = context.engine.up(target).await?;
        if report.is_empty() {
            return Ok(ToolOutput::text("No pending migrations found."));
        }

        let mut out = String::new();
        for version in &report.executed {
            let _ = writeln!(out, "Applied migration: {version}");
        }
        let _ = write!(out, "Successfully applied {} migration(s).", report.executed.len());
        Ok(ToolOutput::text(out))
    }
}

pub struct MigrationDownTool;

#[async_trait]
impl Tool for MigrationDownTool {
    fn name(&self) -> &'static str {
        "migration_down"
    }

    fn description(&self) -> &'static str {
        "Roll back migrations applied after a version, or only the last applied migration when no version is given"
    }

    fn input_schema(&self) -> Value {
        version_schema(
            "Migration version to roll back to; it stays applied (optional, rolls back the last applied migration when omitted)",
        )
    }

    async fn execute(&self, context: &ToolContext, args: Value) -> Result<ToolOutput> {
        let target = match optional_str(&args, "version")? {
            Some(version) => Some(version.to_string()),
            None => {
                let applied: Vec<String> = context
                    .engine
                    .status()
                    .await?
                    .into_iter()
                    .filter(|s| s.applied)
                    .map(|s| s.version)
                    .collect();
                match applied.as_slice() {
                    [] => return Ok(ToolOutput::text("No migrations to roll back.")),
                    [.., previous, _last] => Some(previous.clone()),
                    [_only] => None,
                }
            }
        };

        let report = context.engine.down(target.as_deref()).await?;
        if report.is_empty() {
            return Ok(ToolOutput::text("No migrations to roll back."));
        }

        let mut out = String::new();
        for version in &report.executed {
            let _ = writeln!(out, "Rolled back migration: {version}");
        }
        let _ = write!(
            out,
            "Successfully rolled back {} migration(s).",
            report.executed.len()
        );
        Ok(ToolOutput::text(out))
    }
}

pub struct MigrationListTool;

#[async_trait]
impl Tool for MigrationListTool {
    fn name(&self) -> &'static str {
        "migration_list"
    }

    fn description(&self) -> &'static str {
        "List all registered migrations with their versions and descriptions"
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, context: &ToolContext, _args: Value) -> Result<ToolOutput> {
        let registered = context.engine.registered();
        if registered.is_empty() {
            return Ok(ToolOutput::text("No migrations registered."));
        }

        let mut out = format!("Registered migrations: {}\n", registered.len());
        for (i, m) in registered.iter().enumerate() {
            let _ = write!(out, "\n{}. {}\n   {}", i + 1, m.version, m.description);
        }
        Ok(ToolOutput::text(out))
    }
}

pub struct MigrationCreateTool;

#[async_trait]
impl Tool for MigrationCreateTool {
    fn name(&self) -> &'static str {
        "migration_create"
    }

    fn description(&self) -> &'static str {
        "Create a new migration source file with a given name and description"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Name for the migration, used to build the version and file name"
                },
                "description": {
                    "type": "string",
                    "description": "What the migration does"
                }
            },
            "required": ["name", "description"]
        })
    }

    async fn execute(&self, context: &ToolContext, args: Value) -> Result<ToolOutput> {
        let name = required_str(&args, "name")?;
        let description = required_str(&args, "description")?;

        let template = MigrationTemplate::new(name, description, Utc::now())?;
        let path = template.write_to(&context.migrations_path)?;

        Ok(ToolOutput::text(format!(
            "Created migration file: {}\n\nVersion: {}\nDescription: {description}\n\n\
             Implement up() and down(), then register {} with the engine.",
            path.display(),
            template.version,
            template.struct_name
        )))
    }
}

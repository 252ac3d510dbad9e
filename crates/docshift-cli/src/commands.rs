use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use docshift_engine::{MigrationEngine, MigrationReport, MigrationTemplate, render_table};

pub async fn up(engine: &MigrationEngine, target: Option<&str>, out: &mut impl Write) -> Result<()> {
    match target {
        Some(version) => writeln!(out, "Running migrations up to version: {version}")?,
        None => writeln!(out, "Running all pending migrations...")?,
    }

    let report = engine.up(target).await.context("migration up failed")?;
    print_report(&report, "Applied", "No pending migrations.", out)
}

pub async fn down(engine: &MigrationEngine, target: &str, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Rolling back migrations to version: {target}")?;

    let report = engine.down(Some(target)).await.context("migration down failed")?;
    print_report(&report, "Rolled back", "No migrations to roll back.", out)
}

fn print_report(
    report: &MigrationReport,
    verb: &str,
    nothing: &str,
    out: &mut impl Write,
) -> Result<()> {
    if report.is_empty() {
        writeln!(out, "{nothing}")?;
        return Ok(());
    }
    for version in &report.executed {
        writeln!(out, "  {verb} {version}")?;
    }
    writeln!(
        out,
        "Completed successfully: {} migration(s) {}.",
        report.executed.len(),
        report.direction
    )?;
    Ok(())
}

pub async fn status(engine: &MigrationEngine, out: &mut impl Write) -> Result<()> {
    let statuses = engine
        .status()
        .await
        .context("failed to read migration status")?;
    write!(out, "{}", render_table(&statuses))?;
    Ok(())
}

pub async fn force(engine: &MigrationEngine, version: &str, out: &mut impl Write) -> Result<()> {
    engine
        .force(version)
        .await
        .with_context(|| format!("failed to force migration {version}"))?;
    writeln!(out, "Marked {version} as applied.")?;
    Ok(())
}

pub fn list(engine: &MigrationEngine, out: &mut impl Write) -> Result<()> {
    let registered = engine.registered();
    if registered.is_empty() {
        writeln!(out, "No migrations registered")?;
        return Ok(());
    }
    for m in registered {
        writeln!(out, "{}  {}", m.version, m.description)?;
    }
    Ok(())
}

pub fn create(dir: &Path, name: &str, out: &mut impl Write) -> Result<()> {
    let template = MigrationTemplate::new(name, name, Utc::now())?;
    let path = template
        .write_to(dir)
        .with_context(|| format!("failed to create migration in {}", dir.display()))?;

    writeln!(out, "Created {}", path.display())?;
    writeln!(out, "  version: {}", template.version)?;
    writeln!(
        out,
        "Implement up() and down(), then register {} with the engine.",
        template.struct_name
    )?;
    Ok(())
}

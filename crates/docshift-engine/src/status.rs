use chrono::{DateTime, Utc};
use docshift_common::Direction;
use serde::{Deserialize, Serialize};

/// Status of one version, joining the registry with the applied-log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub version: String,
    /// The registered migration's description, or the applied-log snapshot
    /// when the version is no longer registered.
    pub description: String,
    pub applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn is_pending(&self) -> bool {
        !self.applied
    }
}

/// Versions executed by one successful up or down batch, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub direction: Direction,
    pub executed: Vec<String>,
}

impl MigrationReport {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            executed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.executed.is_empty()
    }
}

/// Render statuses as a fixed-width table with VERSION, STATUS, APPLIED AT
/// and DESCRIPTION columns.
pub fn render_table(statuses: &[MigrationStatus]) -> String {
    if statuses.is_empty() {
        return "No migrations found\n".to_string();
    }

    let rows: Vec<[String; 4]> = statuses
        .iter()
        .map(|s| {
            [
                s.version.clone(),
                if s.applied { "APPLIED" } else { "PENDING" }.to_string(),
                s.applied_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
                s.description.clone(),
            ]
        })
        .collect();

    let header = ["VERSION", "STATUS", "APPLIED AT", "DESCRIPTION"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 4]| {
        format!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        )
        .trim_end()
        .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(header));
    out.push('\n');
    for row in &rows {
        out.push_str(&line([&row[0], &row[1], &row[2], &row[3]]));
        out.push('\n');
    }
    out
}

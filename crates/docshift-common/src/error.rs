use thiserror::Error;

use crate::direction::Direction;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The applied-log could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A migration's forward or backward logic returned an error.
    #[error("migration {version} {direction} failed: {source}")]
    StepExecution {
        version: String,
        direction: Direction,
        #[source]
        source: Box<Error>,
    },

    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Raised by migration code itself.
    #[error("{0}")]
    Migration(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn step(version: impl Into<String>, direction: Direction, source: Error) -> Self {
        Self::StepExecution {
            version: version.into(),
            direction,
            source: Box::new(source),
        }
    }

    /// Rewrap any failure as a persistence error, keeping persistence errors as they are.
    pub fn into_persistence(self, action: &str) -> Self {
        match self {
            Self::Persistence(_) => self,
            other => Self::Persistence(format!("failed to {action}: {other}")),
        }
    }

    /// The migration version a batch stopped at, if this error came from a step.
    pub fn failed_version(&self) -> Option<&str> {
        match self {
            Self::StepExecution { version, .. } => Some(version),
            _ => None,
        }
    }
}

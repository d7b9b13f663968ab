use std::io;
use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_RESOLVE: &str = "USAGE-ERR-RESOLVE";
pub const ERR_READ: &str = "USAGE-ERR-READ";
pub const ERR_TEMPLATE_PARSE: &str = "USAGE-ERR-TEMPLATE-PARSE";
pub const ERR_OPTIONS: &str = "USAGE-ERR-OPTIONS";
pub const ERR_PATTERN: &str = "USAGE-ERR-PATTERN";

/// Failures surfaced to the host pipeline. Anything recoverable (renderer
/// failures, unmatched names, malformed icon accessors) never becomes one.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Cannot resolve '{request}' from {}: {reason}", context.display())]
    Resolve {
        request: String,
        context: PathBuf,
        reason: String,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse template in {file}: {reason}")]
    TemplateParse { file: String, reason: String },

    #[error("Invalid loader options: {0}")]
    Options(#[from] serde_json::Error),

    #[error("Invalid matcher pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl LoaderError {
    /// Stable machine-readable code for the host's reporting layer.
    pub fn code(&self) -> &'static str {
        match self {
            LoaderError::Resolve { .. } => ERR_RESOLVE,
            LoaderError::Read { .. } => ERR_READ,
            LoaderError::TemplateParse { .. } => ERR_TEMPLATE_PARSE,
            LoaderError::Options(_) => ERR_OPTIONS,
            LoaderError::InvalidPattern { .. } => ERR_PATTERN,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;

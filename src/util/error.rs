// logsleuth-analyzer - util/error.rs
//
// Typed error hierarchy. Scoped narrower than a general-purpose application
// would need: per the engine's error policy, only repo construction and
// export I/O can fail with a propagated error. Everything else (bad command
// params, an unparsable search regex, an unknown command, an out-of-range
// index) is represented in-band as Option/bool/an "executed: false" envelope.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all engine operations that are allowed to fail.
#[derive(Debug)]
pub enum EngineError {
    /// Repo construction failed.
    Repo(RepoError),

    /// Export operation failed.
    Export(ExportError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repo(e) => write!(f, "Repo error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Repo(e) => Some(e),
            Self::Export(e) => Some(e),
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(e: RepoError) -> Self {
        Self::Repo(e)
    }
}

impl From<ExportError> for EngineError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Repo construction errors
// ---------------------------------------------------------------------------

/// Errors related to building a file set / line store.
#[derive(Debug)]
pub enum RepoError {
    /// The requested file does not exist or could not be opened.
    NoSuchFile { path: PathBuf, source: io::Error },

    /// The requested folder does not exist or is not a directory.
    NotADirectory { path: PathBuf },

    /// A user-supplied file-name filter regex was invalid.
    InvalidFilterRegex { pattern: String, source: regex::Error },

    /// Memory-mapping a file failed.
    Mmap { path: PathBuf, source: io::Error },

    /// A derived repo was asked to copy a line index that doesn't exist in
    /// its source.
    LineIndexOutOfRange { index: usize, num_lines: usize },
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchFile { path, source } => {
                write!(f, "cannot open '{}': {source}", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "'{}' is not a directory", path.display())
            }
            Self::InvalidFilterRegex { pattern, source } => {
                write!(f, "invalid file filter regex '{pattern}': {source}")
            }
            Self::Mmap { path, source } => {
                write!(f, "failed to memory-map '{}': {source}", path.display())
            }
            Self::LineIndexOutOfRange { index, num_lines } => write!(
                f,
                "line index {index} is out of range (repo has {num_lines} lines)"
            ),
        }
    }
}

impl std::error::Error for RepoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoSuchFile { source, .. } => Some(source),
            Self::Mmap { source, .. } => Some(source),
            Self::InvalidFilterRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The command envelope handed to an export function was malformed
    /// (missing `linesIndices`/`networkPackets`, wrong types, etc).
    MalformedEnvelope { reason: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "export I/O error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "export JSON error '{}': {source}", path.display())
            }
            Self::MalformedEnvelope { reason } => {
                write!(f, "malformed command envelope: {reason}")
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::MalformedEnvelope { .. } => None,
        }
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

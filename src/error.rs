//! Error types shared by the resolver, extractor, lock store and manager.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for dependency operations.
pub type DepsResult<T> = Result<T, DepsError>;

/// Errors that can occur while fetching and pinning dependencies.
#[derive(Debug, Error)]
pub enum DepsError {
    /// The dependency specification or key could not be parsed.
    #[error("invalid dependency spec '{spec}': {reason}")]
    SpecParse { spec: String, reason: String },

    /// Neither a branch nor a tag matched the requested ref.
    #[error("could not resolve ref '{reference}' as branch or tag in {repo}")]
    RefNotFound { repo: String, reference: String },

    /// A required remote call failed (transport error or unexpected status).
    #[error("remote request to {url} failed: {reason}")]
    RemoteUnavailable { url: String, reason: String },

    /// The archive stream was malformed, truncated or had no usable content.
    #[error("malformed archive: {0}")]
    ArchiveFormat(String),

    /// Writing extracted content or the lock file failed.
    #[error("failed to write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The lock file exists but could not be parsed. Never returned as `Err`
    /// from loading; carried alongside an empty ledger as a warning.
    #[error("could not parse existing {}: {reason}", path.display())]
    LedgerCorrupt { path: PathBuf, reason: String },

    /// `update <key>` named a dependency that is not in the lock file.
    #[error("dependency {0} not found in lock file")]
    UnknownDependency(String),
}

impl DepsError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn spec(spec: &str, reason: impl Into<String>) -> Self {
        Self::SpecParse {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn remote(url: &str, reason: impl ToString) -> Self {
        Self::RemoteUnavailable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

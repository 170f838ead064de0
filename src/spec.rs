//! Dependency keys and specification strings.
//!
//! A dependency is written as `<host>/<owner>/<repo>[@<ref>]`:
//!
//! ```text
//! github.com/fmtlib/fmt            # default branch
//! github.com/fmtlib/fmt@11.0.2     # tag
//! github.com/fmtlib/fmt@master     # branch
//! github.com/fmtlib/fmt@<40 hex>   # commit
//! ```
//!
//! The `<host>/<owner>/<repo>` part is the [`DependencyKey`]; it names the
//! lock file entry and the directory the content is materialized into.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{DepsError, DepsResult};

/// Host-qualified repository locator, e.g. `github.com/owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DependencyKey {
    host: String,
    owner: String,
    repo: String,
}

impl DependencyKey {
    pub fn parse(input: &str) -> DepsResult<Self> {
        let trimmed = input.trim();
        let locator = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let parts: Vec<&str> = locator.split('/').collect();
        if parts.len() != 3 {
            return Err(DepsError::spec(input, "expected <host>/<owner>/<repo>"));
        }
        for part in &parts {
            if part.is_empty() {
                return Err(DepsError::spec(input, "empty path segment"));
            }
            if *part == "." || *part == ".." {
                return Err(DepsError::spec(input, "relative path segment"));
            }
            if part.contains('@') || part.contains('\\') {
                return Err(DepsError::spec(input, format!("invalid segment '{part}'")));
            }
        }
        Ok(Self {
            host: parts[0].to_string(),
            owner: parts[1].to_string(),
            repo: parts[2].to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Path of the materialized tree relative to the dependency root.
    pub fn relative_path(&self) -> PathBuf {
        [&self.host, &self.owner, &self.repo].iter().collect()
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.repo)
    }
}

impl FromStr for DependencyKey {
    type Err = DepsError;

    fn from_str(s: &str) -> DepsResult<Self> {
        Self::parse(s)
    }
}

/// A parsed `get` argument: key plus the ref the user asked for.
///
/// An empty `requested_ref` (no `@`, or nothing after it) means "the
/// repository's default branch".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub key: DependencyKey,
    pub requested_ref: String,
}

impl DependencySpec {
    pub fn parse(input: &str) -> DepsResult<Self> {
        let mut parts = input.trim().split('@');
        let locator = parts.next().unwrap_or_default();
        let requested_ref = match (parts.next(), parts.next()) {
            (None, _) => String::new(),
            (Some(r), None) => r.to_string(),
            (Some(_), Some(_)) => return Err(DepsError::spec(input, "more than one '@'")),
        };

        let key = DependencyKey::parse(locator).map_err(|e| match e {
            DepsError::SpecParse { reason, .. } => DepsError::spec(input, reason),
            other => other,
        })?;

        Ok(Self { key, requested_ref })
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requested_ref.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}@{}", self.key, self.requested_ref)
        }
    }
}

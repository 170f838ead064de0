use crate::error::{DepsError, DepsResult};
use crate::spec::DependencyKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One pinned dependency: the ref the user asked for and the commit it last
/// resolved to.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Dependency {
    #[serde(rename = "ref")]
    pub requested_ref: String,
    #[serde(rename = "sha")]
    pub resolved_id: String,
}

/// In-memory form of the lock file.
///
/// Keys are kept exactly as written. They are parsed per entry when an
/// operation needs them, so one malformed key fails that entry alone and the
/// rest of the file survives the next save.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Ledger {
    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,
}

impl Ledger {
    pub fn get(&self, key: &DependencyKey) -> Option<&Dependency> {
        self.dependencies.get(&key.to_string())
    }

    pub fn insert(&mut self, key: &DependencyKey, requested_ref: String, resolved_id: String) {
        self.dependencies.insert(
            key.to_string(),
            Dependency {
                requested_ref,
                resolved_id,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Result of [`LockStore::load`]. A corrupt lock file yields an empty ledger
/// and a `LedgerCorrupt` warning instead of an error.
#[derive(Debug, Default)]
pub struct LoadedLedger {
    pub ledger: Ledger,
    pub warning: Option<DepsError>,
}

/// Reads and writes the lock file (`.deps.lock` by default).
#[derive(Debug, Clone)]
pub struct LockStore {
    path: PathBuf,
}

impl LockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> LoadedLedger {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadedLedger::default(),
            Err(e) => return self.degraded(e.to_string()),
        };

        match serde_json::from_str::<Ledger>(&content) {
            Ok(ledger) => LoadedLedger {
                ledger,
                warning: None,
            },
            Err(e) => self.degraded(e.to_string()),
        }
    }

    fn degraded(&self, reason: String) -> LoadedLedger {
        tracing::warn!(path = %self.path.display(), %reason, "ignoring unreadable lock file");
        LoadedLedger {
            ledger: Ledger::default(),
            warning: Some(DepsError::LedgerCorrupt {
                path: self.path.clone(),
                reason,
            }),
        }
    }

    /// Replace the lock file with `ledger` in one rename.
    pub fn save(&self, ledger: &Ledger) -> DepsResult<()> {
        let mut content = serde_json::to_string_pretty(ledger)
            .map_err(|e| DepsError::storage(&self.path, io::Error::other(e)))?;
        content.push('\n');

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| DepsError::storage(&dir, e))?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| DepsError::storage(&dir, e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| DepsError::storage(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| DepsError::storage(&self.path, e.error))?;

        tracing::debug!(path = %self.path.display(), entries = ledger.len(), "lock file saved");
        Ok(())
    }
}

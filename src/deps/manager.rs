use super::report::{
    CheckReport, CheckStatus, Entry, GetReport, InstallReport, InstallStatus, Report,
    UpdateReport, UpdateStatus,
};
use crate::archive;
use crate::error::{DepsError, DepsResult};
use crate::lock::{Dependency, LockStore};
use crate::remote::RemoteApi;
use crate::resolve::{RefResolver, Resolved};
use crate::spec::{DependencyKey, DependencySpec};
use std::fs;
use std::path::PathBuf;

/// Runs `get`, `check`, `install` and `update` against one lock file and
/// one dependency root.
///
/// Only `get` and `update` change the lock file, and only after content
/// for the new commit has been extracted.
pub struct DependencyManager<R: RemoteApi> {
    remote: R,
    store: LockStore,
    root: PathBuf,
}

impl<R: RemoteApi> DependencyManager<R> {
    pub fn new(remote: R, store: LockStore, root: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            store,
            root: root.into(),
        }
    }

    pub fn store(&self) -> &LockStore {
        &self.store
    }

    /// Directory `key` is materialized into.
    pub fn materialized_path(&self, key: &DependencyKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Resolve, download and pin one dependency. Any failure leaves the lock
    /// file untouched.
    pub fn get(&self, spec: &str) -> DepsResult<GetReport> {
        let spec = DependencySpec::parse(spec)?;
        self.ensure_host(&spec.key)?;

        let Resolved { sha, canonical_ref } =
            RefResolver::new(&self.remote).resolve(&spec.key, &spec.requested_ref)?;
        let path = self.fetch(&spec.key, &sha)?;

        let loaded = self.store.load();
        let mut ledger = loaded.ledger;
        let recorded_ref = if spec.requested_ref.is_empty() {
            canonical_ref.clone()
        } else {
            spec.requested_ref.clone()
        };
        ledger.insert(&spec.key, recorded_ref.clone(), sha.clone());
        self.store.save(&ledger)?;

        tracing::info!(key = %spec.key, %recorded_ref, %sha, "dependency added");
        Ok(GetReport {
            key: spec.key,
            recorded_ref,
            canonical_ref,
            sha,
            path,
            warning: loaded.warning,
        })
    }

    /// Report which lock file entries are present on disk. No network.
    ///
    /// An entry whose key does not parse has no directory and reads as missing.
    pub fn check(&self) -> CheckReport {
        let loaded = self.store.load();
        let entries = loaded
            .ledger
            .dependencies
            .into_iter()
            .map(|(key, dependency)| {
                let present = DependencyKey::parse(&key)
                    .is_ok_and(|parsed| self.materialized_path(&parsed).exists());
                let status = if present {
                    CheckStatus::Present
                } else {
                    CheckStatus::Missing
                };
                Entry {
                    key,
                    dependency,
                    status,
                }
            })
            .collect();

        Report {
            entries,
            warning: loaded.warning,
        }
    }

    /// Fetch every missing entry at its recorded commit. The lock file is
    /// never written.
    pub fn install(&self) -> InstallReport {
        let loaded = self.store.load();
        let mut report = Report {
            entries: Vec::with_capacity(loaded.ledger.len()),
            warning: loaded.warning,
        };

        for (key, dependency) in loaded.ledger.dependencies {
            let status = match self.install_one(&key, &dependency) {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "install failed");
                    InstallStatus::Failed(e)
                }
            };
            report.entries.push(Entry {
                key,
                dependency,
                status,
            });
        }
        report
    }

    /// Re-resolve the recorded ref of `target` (or of every entry) and fetch
    /// any entry whose commit moved. The lock file is written once at the end,
    /// and only if something changed.
    ///
    /// Errors only for an unknown `target` or a failed lock file write;
    /// per-entry failures are reported.
    pub fn update(&self, target: Option<&str>) -> DepsResult<UpdateReport> {
        let loaded = self.store.load();
        let mut ledger = loaded.ledger;

        let targets: Vec<(String, Dependency)> = match target {
            Some(raw) => {
                let raw = raw.trim();
                let key = match DependencyKey::parse(raw) {
                    Ok(k) if ledger.dependencies.contains_key(&k.to_string()) => k.to_string(),
                    _ => raw.to_string(),
                };
                let dependency = ledger
                    .dependencies
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| DepsError::UnknownDependency(key.clone()))?;
                vec![(key, dependency)]
            }
            None => ledger
                .dependencies
                .iter()
                .map(|(k, d)| (k.clone(), d.clone()))
                .collect(),
        };

        let mut report = UpdateReport {
            report: Report {
                entries: Vec::with_capacity(targets.len()),
                warning: loaded.warning,
            },
            saved: false,
        };

        for (key, dependency) in targets {
            let status = match self.update_one(&key, &dependency) {
                Ok(Some(resolved)) => {
                    let recorded_ref = if dependency.requested_ref.is_empty() {
                        resolved.canonical_ref.clone()
                    } else {
                        dependency.requested_ref.clone()
                    };
                    ledger.dependencies.insert(
                        key.clone(),
                        Dependency {
                            requested_ref: recorded_ref,
                            resolved_id: resolved.sha.clone(),
                        },
                    );
                    UpdateStatus::Updated {
                        from: dependency.resolved_id.clone(),
                        to: resolved.sha,
                        canonical_ref: resolved.canonical_ref,
                    }
                }
                Ok(None) => UpdateStatus::UpToDate,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "update failed");
                    UpdateStatus::Failed(e)
                }
            };
            report.report.entries.push(Entry {
                key,
                dependency,
                status,
            });
        }

        if report.updated() > 0 {
            self.store.save(&ledger)?;
            report.saved = true;
        }
        Ok(report)
    }

    fn install_one(&self, key: &str, dependency: &Dependency) -> DepsResult<InstallStatus> {
        let key = DependencyKey::parse(key)?;
        if self.materialized_path(&key).exists() {
            return Ok(InstallStatus::AlreadyInstalled);
        }
        self.ensure_host(&key)?;
        self.fetch(&key, &dependency.resolved_id)?;
        Ok(InstallStatus::Installed)
    }

    /// `Ok(None)` when the remote still points at the recorded commit.
    fn update_one(&self, key: &str, dependency: &Dependency) -> DepsResult<Option<Resolved>> {
        let key = DependencyKey::parse(key)?;
        self.ensure_host(&key)?;
        let resolved =
            RefResolver::new(&self.remote).resolve(&key, &dependency.requested_ref)?;
        if resolved.sha == dependency.resolved_id {
            return Ok(None);
        }
        self.fetch(&key, &resolved.sha)?;
        Ok(Some(resolved))
    }

    fn ensure_host(&self, key: &DependencyKey) -> DepsResult<()> {
        if key.host() == self.remote.host() {
            Ok(())
        } else {
            Err(DepsError::spec(
                &key.to_string(),
                format!("unsupported host '{}'", key.host()),
            ))
        }
    }

    /// Download `sha` and replace the materialized tree of `key` with it.
    fn fetch(&self, key: &DependencyKey, sha: &str) -> DepsResult<PathBuf> {
        let dest = self.materialized_path(key);
        let stream = self.remote.download_archive(key, sha)?;
        let stats = archive::extract_archive(stream, &dest)?;
        if stats.is_empty() {
            // An empty directory would read as installed on the next `check`.
            if let Err(e) = fs::remove_dir_all(&dest) {
                tracing::warn!(
                    dest = %dest.display(),
                    error = %e,
                    "could not remove empty dependency directory"
                );
            }
            return Err(DepsError::ArchiveFormat(format!(
                "no content under a wrapper directory for {key}@{sha}"
            )));
        }
        tracing::debug!(%key, %sha, dest = %dest.display(), "fetched");
        Ok(dest)
    }
}

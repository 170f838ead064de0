//! Ref resolution.
//!
//! Turns a human ref into an immutable commit identifier:
//!
//! 1. empty ref: default branch name, then that branch's tip (both required)
//! 2. a 40-character lowercase hex string: already a commit, no remote call
//! 3. anything else: each [`Strategy`] in [`NAMED_REF_STRATEGIES`] in order,
//!    branch before tag, first hit wins

use crate::error::{DepsError, DepsResult};
use crate::remote::RemoteApi;
use crate::spec::DependencyKey;
use regex::Regex;
use std::sync::LazyLock;

static COMMIT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-f0-9]{40}$").expect("commit id pattern is valid"));

pub fn is_commit_id(reference: &str) -> bool {
    COMMIT_ID.is_match(reference)
}

/// A resolved ref: the commit and the label it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub sha: String,
    pub canonical_ref: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Branch,
    Tag,
}

/// Lookup order for named refs. Branches shadow tags of the same name.
pub const NAMED_REF_STRATEGIES: [Strategy; 2] = [Strategy::Branch, Strategy::Tag];

enum Lookup {
    Found(String),
    NotFound,
}

pub struct RefResolver<'a, R: RemoteApi + ?Sized> {
    remote: &'a R,
}

impl<'a, R: RemoteApi + ?Sized> RefResolver<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    pub fn resolve(&self, key: &DependencyKey, reference: &str) -> DepsResult<Resolved> {
        if reference.is_empty() {
            return self.resolve_default_branch(key);
        }

        if is_commit_id(reference) {
            tracing::debug!(%key, reference, "ref is already a commit id");
            return Ok(Resolved {
                sha: reference.to_string(),
                canonical_ref: reference.to_string(),
            });
        }

        for strategy in NAMED_REF_STRATEGIES {
            if let Lookup::Found(sha) = self.lookup(strategy, key, reference) {
                tracing::debug!(%key, reference, ?strategy, %sha, "resolved");
                return Ok(Resolved {
                    sha,
                    canonical_ref: reference.to_string(),
                });
            }
        }

        Err(DepsError::RefNotFound {
            repo: key.to_string(),
            reference: reference.to_string(),
        })
    }

    fn resolve_default_branch(&self, key: &DependencyKey) -> DepsResult<Resolved> {
        let branch = self.remote.default_branch(key)?.ok_or_else(|| {
            DepsError::remote(&key.to_string(), "repository has no default branch")
        })?;
        let sha = self.remote.branch_tip(key, &branch)?.ok_or_else(|| {
            DepsError::remote(
                &key.to_string(),
                format!("default branch '{branch}' not found"),
            )
        })?;
        tracing::debug!(%key, %branch, %sha, "resolved default branch");
        Ok(Resolved {
            sha,
            canonical_ref: branch,
        })
    }

    /// Remote failures count as "not found" so the next strategy still runs.
    fn lookup(&self, strategy: Strategy, key: &DependencyKey, name: &str) -> Lookup {
        let result = match strategy {
            Strategy::Branch => self.remote.branch_tip(key, name),
            Strategy::Tag => self.remote.tag_target(key, name),
        };
        match result {
            Ok(Some(sha)) => Lookup::Found(sha),
            Ok(None) => Lookup::NotFound,
            Err(e) => {
                // TODO: surface transient failures instead of falling through to the next strategy.
                tracing::warn!(%key, name, ?strategy, error = %e, "lookup failed, treating as not found");
                Lookup::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::io::Read;

    #[derive(Default)]
    struct StubRemote {
        default_branch: Option<String>,
        branches: HashMap<String, String>,
        tags: HashMap<String, String>,
        failing_branches: bool,
        calls: Cell<usize>,
        log: RefCell<Vec<String>>,
    }

    impl StubRemote {
        fn record(&self, what: String) {
            self.calls.set(self.calls.get() + 1);
            self.log.borrow_mut().push(what);
        }
    }

    impl RemoteApi for StubRemote {
        fn host(&self) -> &str {
            "github.com"
        }

        fn default_branch(&self, _key: &DependencyKey) -> DepsResult<Option<String>> {
            self.record("repo".to_string());
            Ok(self.default_branch.clone())
        }

        fn branch_tip(&self, _key: &DependencyKey, name: &str) -> DepsResult<Option<String>> {
            self.record(format!("branch:{name}"));
            if self.failing_branches {
                return Err(DepsError::remote("stub", "status 502"));
            }
            Ok(self.branches.get(name).cloned())
        }

        fn tag_target(&self, _key: &DependencyKey, name: &str) -> DepsResult<Option<String>> {
            self.record(format!("tag:{name}"));
            Ok(self.tags.get(name).cloned())
        }

        fn download_archive(&self, _key: &DependencyKey, _sha: &str) -> DepsResult<Box<dyn Read>> {
            unreachable!("resolver never downloads")
        }
    }

    fn key() -> DependencyKey {
        DependencyKey::parse("github.com/o/r").unwrap()
    }

    #[test]
    fn test_commit_id_needs_no_remote_call() {
        let remote = StubRemote::default();
        let sha = "0123456789abcdef0123456789abcdef01234567";
        let resolved = RefResolver::new(&remote).resolve(&key(), sha).unwrap();
        assert_eq!(resolved.sha, sha);
        assert_eq!(resolved.canonical_ref, sha);
        assert_eq!(remote.calls.get(), 0);
    }

    #[test]
    fn test_commit_id_pattern() {
        assert!(is_commit_id(&"a".repeat(40)));
        assert!(!is_commit_id(&"A".repeat(40)));
        assert!(!is_commit_id(&"a".repeat(39)));
        assert!(!is_commit_id("main"));
    }

    #[test]
    fn test_default_branch() {
        let remote = StubRemote {
            default_branch: Some("main".to_string()),
            branches: HashMap::from([("main".to_string(), "a".repeat(40))]),
            ..Default::default()
        };
        let resolved = RefResolver::new(&remote).resolve(&key(), "").unwrap();
        assert_eq!(resolved.canonical_ref, "main");
        assert_eq!(resolved.sha, "a".repeat(40));
    }

    #[test]
    fn test_missing_default_branch_is_remote_failure() {
        let remote = StubRemote::default();
        let err = RefResolver::new(&remote).resolve(&key(), "").unwrap_err();
        assert!(matches!(err, DepsError::RemoteUnavailable { .. }));
    }

    #[test]
    fn test_tag_only_ref_resolves_via_tag() {
        let remote = StubRemote {
            tags: HashMap::from([("v1.0".to_string(), "b".repeat(40))]),
            ..Default::default()
        };
        let resolved = RefResolver::new(&remote).resolve(&key(), "v1.0").unwrap();
        assert_eq!(resolved.canonical_ref, "v1.0");
        assert_eq!(resolved.sha, "b".repeat(40));
        assert_eq!(*remote.log.borrow(), vec!["branch:v1.0", "tag:v1.0"]);
    }

    #[test]
    fn test_branch_wins_over_tag() {
        let remote = StubRemote {
            branches: HashMap::from([("release".to_string(), "c".repeat(40))]),
            tags: HashMap::from([("release".to_string(), "d".repeat(40))]),
            ..Default::default()
        };
        let resolved = RefResolver::new(&remote).resolve(&key(), "release").unwrap();
        assert_eq!(resolved.sha, "c".repeat(40));
        assert_eq!(remote.calls.get(), 1);
    }

    #[test]
    fn test_branch_failure_falls_back_to_tag() {
        let remote = StubRemote {
            tags: HashMap::from([("v2".to_string(), "e".repeat(40))]),
            failing_branches: true,
            ..Default::default()
        };
        let resolved = RefResolver::new(&remote).resolve(&key(), "v2").unwrap();
        assert_eq!(resolved.sha, "e".repeat(40));
    }

    #[test]
    fn test_unknown_ref() {
        let remote = StubRemote::default();
        let err = RefResolver::new(&remote).resolve(&key(), "nope").unwrap_err();
        match err {
            DepsError::RefNotFound { repo, reference } => {
                assert_eq!(repo, "github.com/o/r");
                assert_eq!(reference, "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

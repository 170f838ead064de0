//! Shared fixtures: an in-memory remote and tarball builder.

#![allow(dead_code)]

use deps::error::{DepsError, DepsResult};
use deps::remote::RemoteApi;
use deps::spec::DependencyKey;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Cursor, Read};

pub const SHA_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const SHA_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
pub const SHA_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

/// Build a GitHub-style tarball: every file under `<repo>-<sha>/`.
pub fn tarball(repo: &str, sha: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let wrapper = format!("{repo}-{}", &sha[..7]);
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);

    let mut dir = tar::Header::new_gnu();
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_mode(0o755);
    dir.set_size(0);
    builder
        .append_data(&mut dir, format!("{wrapper}/"), io::empty())
        .unwrap();

    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(content.len() as u64);
        builder
            .append_data(
                &mut header,
                format!("{wrapper}/{path}"),
                content.as_bytes(),
            )
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Remote whose branches, tags and archives are set by the test.
#[derive(Default)]
pub struct FakeRemote {
    pub default_branch: RefCell<Option<String>>,
    pub branches: RefCell<HashMap<String, String>>,
    pub tags: RefCell<HashMap<String, String>>,
    pub archives: RefCell<HashMap<String, Vec<u8>>>,
    pub offline: Cell<bool>,
    pub calls: Cell<usize>,
    pub downloads: Cell<usize>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(self, name: &str, sha: &str) -> Self {
        self.set_branch(name, sha);
        self
    }

    pub fn with_default_branch(self, name: &str, sha: &str) -> Self {
        *self.default_branch.borrow_mut() = Some(name.to_string());
        self.with_branch(name, sha)
    }

    pub fn with_tag(self, name: &str, sha: &str) -> Self {
        self.tags
            .borrow_mut()
            .insert(name.to_string(), sha.to_string());
        self
    }

    pub fn with_archive(self, repo: &str, sha: &str, files: &[(&str, &str)]) -> Self {
        self.archives
            .borrow_mut()
            .insert(sha.to_string(), tarball(repo, sha, files));
        self
    }

    pub fn set_branch(&self, name: &str, sha: &str) {
        self.branches
            .borrow_mut()
            .insert(name.to_string(), sha.to_string());
    }

    fn enter(&self, what: &str) -> DepsResult<()> {
        self.calls.set(self.calls.get() + 1);
        if self.offline.get() {
            return Err(DepsError::RemoteUnavailable {
                url: what.to_string(),
                reason: "offline".to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteApi for FakeRemote {
    fn host(&self) -> &str {
        "github.com"
    }

    fn default_branch(&self, _key: &DependencyKey) -> DepsResult<Option<String>> {
        self.enter("repo")?;
        Ok(self.default_branch.borrow().clone())
    }

    fn branch_tip(&self, _key: &DependencyKey, name: &str) -> DepsResult<Option<String>> {
        self.enter("branch")?;
        Ok(self.branches.borrow().get(name).cloned())
    }

    fn tag_target(&self, _key: &DependencyKey, name: &str) -> DepsResult<Option<String>> {
        self.enter("tag")?;
        Ok(self.tags.borrow().get(name).cloned())
    }

    fn download_archive(&self, _key: &DependencyKey, sha: &str) -> DepsResult<Box<dyn Read>> {
        self.enter("tarball")?;
        self.downloads.set(self.downloads.get() + 1);
        match self.archives.borrow().get(sha) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(DepsError::RemoteUnavailable {
                url: format!("tarball/{sha}"),
                reason: "API returned status 404".to_string(),
            }),
        }
    }
}

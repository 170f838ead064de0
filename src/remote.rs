//! Remote repository API.
//!
//! [`RemoteApi`] is the seam between the resolver/manager and the network.
//! [`GitHubClient`] implements it against the GitHub REST API with `ureq`.
//!
//! Lookups distinguish "not found" (`Ok(None)`: HTTP 404 or an empty
//! name/identifier in the response) from transport failures and unexpected
//! statuses (`Err(RemoteUnavailable)`).

use crate::config::Config;
use crate::error::{DepsError, DepsResult};
use crate::spec::DependencyKey;
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::{IsTerminal, Read};
use std::time::Duration;

const USER_AGENT: &str = concat!("deps/", env!("CARGO_PKG_VERSION"));

pub trait RemoteApi {
    /// Host segment this remote serves (e.g. `github.com`).
    fn host(&self) -> &str;

    /// Name of the repository's default branch.
    fn default_branch(&self, key: &DependencyKey) -> DepsResult<Option<String>>;

    /// Tip commit of the branch named exactly `name`.
    fn branch_tip(&self, key: &DependencyKey, name: &str) -> DepsResult<Option<String>>;

    /// Commit the tag named exactly `name` points at.
    fn tag_target(&self, key: &DependencyKey, name: &str) -> DepsResult<Option<String>>;

    /// Gzip-compressed tar stream of the repository at `sha`.
    fn download_archive(&self, key: &DependencyKey, sha: &str) -> DepsResult<Box<dyn Read>>;
}

impl<T: RemoteApi + ?Sized> RemoteApi for &T {
    fn host(&self) -> &str {
        (**self).host()
    }

    fn default_branch(&self, key: &DependencyKey) -> DepsResult<Option<String>> {
        (**self).default_branch(key)
    }

    fn branch_tip(&self, key: &DependencyKey, name: &str) -> DepsResult<Option<String>> {
        (**self).branch_tip(key, name)
    }

    fn tag_target(&self, key: &DependencyKey, name: &str) -> DepsResult<Option<String>> {
        (**self).tag_target(key, name)
    }

    fn download_archive(&self, key: &DependencyKey, sha: &str) -> DepsResult<Box<dyn Read>> {
        (**self).download_archive(key, sha)
    }
}

#[derive(Deserialize, Debug)]
struct RepoInfo {
    #[serde(default)]
    default_branch: String,
}

#[derive(Deserialize, Debug)]
struct BranchInfo {
    commit: CommitInfo,
}

#[derive(Deserialize, Debug)]
struct CommitInfo {
    #[serde(default)]
    sha: String,
}

#[derive(Deserialize, Debug)]
struct GitRef {
    #[serde(rename = "ref")]
    name: String,
    object: GitObject,
}

#[derive(Deserialize, Debug)]
struct GitObject {
    #[serde(default)]
    sha: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Deserialize, Debug)]
struct AnnotatedTag {
    object: GitObject,
}

/// `git/refs/tags/{name}` answers with a list when `name` only prefixes
/// other tags.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RefLookup {
    One(GitRef),
    Many(Vec<GitRef>),
}

impl RefLookup {
    fn exact(self, full_name: &str) -> Option<GitRef> {
        match self {
            Self::One(r) => (r.name == full_name).then_some(r),
            Self::Many(refs) => refs.into_iter().find(|r| r.name == full_name),
        }
    }
}

/// A failed request as "not found" (HTTP 404) or [`DepsError::RemoteUnavailable`].
fn not_found_or_unavailable<T>(url: &str, error: ureq::Error) -> DepsResult<Option<T>> {
    match error {
        ureq::Error::StatusCode(404) => Ok(None),
        other => Err(unavailable(url, other)),
    }
}

fn unavailable(url: &str, error: ureq::Error) -> DepsError {
    match error {
        ureq::Error::StatusCode(code) => {
            DepsError::remote(url, format!("API returned status {code}"))
        }
        other => DepsError::remote(url, other),
    }
}

pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    host: String,
    token: Option<String>,
    progress: bool,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(config.timeout_secs.map(Duration::from_secs))
            .build()
            .into();

        Self {
            agent,
            api_url: config.api_url.clone(),
            host: config.host.clone(),
            token: config.token.clone(),
            progress: std::io::stderr().is_terminal(),
        }
    }

    fn repo_url(&self, key: &DependencyKey) -> String {
        format!("{}/repos/{}/{}", self.api_url, key.owner(), key.repo())
    }

    fn call(&self, url: &str) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        tracing::debug!(%url, "GET");
        let mut request = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request.call()
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> DepsResult<Option<T>> {
        match self.call(url) {
            Ok(mut response) => response
                .body_mut()
                .read_json::<T>()
                .map(Some)
                .map_err(|e| DepsError::remote(url, e)),
            Err(e) => not_found_or_unavailable(url, e),
        }
    }

    fn peel_tag(&self, key: &DependencyKey, tag_sha: &str) -> DepsResult<Option<String>> {
        let url = format!("{}/git/tags/{}", self.repo_url(key), tag_sha);
        Ok(self
            .get_json::<AnnotatedTag>(&url)?
            .map(|t| t.object.sha)
            .filter(|sha| !sha.is_empty()))
    }
}

impl RemoteApi for GitHubClient {
    fn host(&self) -> &str {
        &self.host
    }

    fn default_branch(&self, key: &DependencyKey) -> DepsResult<Option<String>> {
        let url = self.repo_url(key);
        Ok(self
            .get_json::<RepoInfo>(&url)?
            .map(|r| r.default_branch)
            .filter(|b| !b.is_empty()))
    }

    fn branch_tip(&self, key: &DependencyKey, name: &str) -> DepsResult<Option<String>> {
        let url = format!("{}/branches/{}", self.repo_url(key), name);
        Ok(self
            .get_json::<BranchInfo>(&url)?
            .map(|b| b.commit.sha)
            .filter(|sha| !sha.is_empty()))
    }

    fn tag_target(&self, key: &DependencyKey, name: &str) -> DepsResult<Option<String>> {
        let url = format!("{}/git/refs/tags/{}", self.repo_url(key), name);
        let full_name = format!("refs/tags/{name}");
        let Some(found) = self
            .get_json::<RefLookup>(&url)?
            .and_then(|lookup| lookup.exact(&full_name))
        else {
            return Ok(None);
        };

        if found.object.sha.is_empty() {
            return Ok(None);
        }
        if found.object.kind == "tag" {
            return self.peel_tag(key, &found.object.sha);
        }
        Ok(Some(found.object.sha))
    }

    fn download_archive(&self, key: &DependencyKey, sha: &str) -> DepsResult<Box<dyn Read>> {
        let url = format!("{}/tarball/{}", self.repo_url(key), sha);
        let response = self.call(&url).map_err(|e| unavailable(&url, e))?;
        let reader = response.into_body().into_reader();

        if !self.progress {
            return Ok(Box::new(reader));
        }

        let pb = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg} {bytes}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Downloading {}", key));
        pb.enable_steady_tick(Duration::from_millis(100));
        Ok(Box::new(pb.wrap_read(reader)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_lookup_exact_single() {
        let json = r#"{"ref":"refs/tags/v1.0","object":{"sha":"abc","type":"commit"}}"#;
        let lookup: RefLookup = serde_json::from_str(json).unwrap();
        let found = lookup.exact("refs/tags/v1.0").unwrap();
        assert_eq!(found.object.sha, "abc");
        assert_eq!(found.object.kind, "commit");
    }

    #[test]
    fn test_ref_lookup_prefix_list_requires_exact_name() {
        let json = r#"[
            {"ref":"refs/tags/v1.0.1","object":{"sha":"111","type":"commit"}},
            {"ref":"refs/tags/v1.0.2","object":{"sha":"222","type":"commit"}}
        ]"#;
        let lookup: RefLookup = serde_json::from_str(json).unwrap();
        assert!(lookup.exact("refs/tags/v1.0").is_none());

        let lookup: RefLookup = serde_json::from_str(json).unwrap();
        assert_eq!(lookup.exact("refs/tags/v1.0.2").unwrap().object.sha, "222");
    }

    #[test]
    fn test_status_404_is_not_found() {
        let result = not_found_or_unavailable::<String>("u", ureq::Error::StatusCode(404));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_other_status_is_unavailable() {
        for code in [401, 403, 500, 502] {
            let err = not_found_or_unavailable::<String>("u", ureq::Error::StatusCode(code))
                .unwrap_err();
            match err {
                DepsError::RemoteUnavailable { url, reason } => {
                    assert_eq!(url, "u");
                    assert_eq!(reason, format!("API returned status {code}"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_transport_error_is_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let result = not_found_or_unavailable::<String>("u", ureq::Error::Io(io));
        assert!(matches!(
            result,
            Err(DepsError::RemoteUnavailable { .. })
        ));
    }

    #[test]
    fn test_download_404_is_unavailable_not_missing() {
        let err = unavailable("u", ureq::Error::StatusCode(404));
        assert!(matches!(err, DepsError::RemoteUnavailable { .. }));
    }

    #[test]
    fn test_branch_info_parse() {
        let json = r#"{"name":"main","commit":{"sha":"deadbeef","url":"x"},"protected":false}"#;
        let info: BranchInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.commit.sha, "deadbeef");
    }

    #[test]
    fn test_repo_url_uses_owner_and_repo() {
        let client = GitHubClient::new(&Config::default());
        let key = DependencyKey::parse("github.com/fmtlib/fmt").unwrap();
        assert_eq!(
            client.repo_url(&key),
            "https://api.github.com/repos/fmtlib/fmt"
        );
        assert_eq!(client.host(), "github.com");
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "deps.toml";

/// Settings for one invocation. Every field has a default, so `deps.toml`
/// is optional; environment variables win over the file.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory dependencies are materialized under.
    pub root: PathBuf,
    /// Path of the lock file.
    pub lockfile: PathBuf,
    /// Host segment accepted in dependency keys.
    pub host: String,
    /// Base URL of the remote API.
    pub api_url: String,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".deps"),
            lockfile: PathBuf::from(".deps.lock"),
            host: default_host(),
            api_url: default_api_url(),
            token: None,
            timeout_secs: None,
        }
    }
}

fn default_host() -> String {
    "github.com".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

impl Config {
    /// Load `deps.toml` from `dir` (if present), apply environment overrides
    /// and anchor relative paths at `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with_env(dir, |name| std::env::var(name).ok())
    }

    pub fn load_with_env(dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        if let Some(root) = env("DEPS_ROOT") {
            config.root = PathBuf::from(root);
        }
        if let Some(lockfile) = env("DEPS_LOCKFILE") {
            config.lockfile = PathBuf::from(lockfile);
        }
        if let Some(host) = env("DEPS_HOST") {
            config.host = host;
        }
        if let Some(api_url) = env("DEPS_API_URL") {
            config.api_url = api_url;
        }
        if let Some(token) = env("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
            config.token = Some(token);
        }
        if let Some(secs) = env("DEPS_TIMEOUT_SECS") {
            let secs = secs
                .parse()
                .with_context(|| format!("DEPS_TIMEOUT_SECS is not a number: {secs}"))?;
            config.timeout_secs = Some(secs);
        }

        config.api_url = config.api_url.trim_end_matches('/').to_string();
        if config.root.is_relative() {
            config.root = dir.join(&config.root);
        }
        if config.lockfile.is_relative() {
            config.lockfile = dir.join(&config.lockfile);
        }
        Ok(config)
    }
}

//! Credential resolution
//!
//! The API location and token come from three sources, highest precedence
//! first:
//! 1. `OSH_URL` / `OSH_TOKEN` environment variables
//! 2. A YAML credentials file with the same keys
//! 3. Explicit parameters (falling back to the public instance and no token)
//!
//! The credentials file is the explicit path if one is given, else the
//! explicit URL (fetched over HTTP), else `./.env.yml` when it exists. An
//! explicit path that cannot be read or parsed is a configuration error; a
//! remote or default file that fails is logged and skipped.

use std::path::{Path, PathBuf};

use oshub_domain::constants::{
    DEFAULT_BASE_URL, DEFAULT_CREDENTIALS_FILE, ENV_TOKEN_KEY, ENV_URL_KEY,
};
use oshub_domain::{Credentials, OshError, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::InfraError;
use crate::http::HttpClient;

/// Inputs to [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct CredentialOptions {
    pub url: Option<String>,
    pub token: Option<String>,
    pub path_to_env_yml: Option<PathBuf>,
    pub url_to_env_yml: Option<String>,
}

impl CredentialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn path_to_env_yml(mut self, path: impl Into<PathBuf>) -> Self {
        self.path_to_env_yml = Some(path.into());
        self
    }

    pub fn url_to_env_yml(mut self, url: impl Into<String>) -> Self {
        self.url_to_env_yml = Some(url.into());
        self
    }

    /// Treat a `credentials_source` config value as a path or, when it looks
    /// like an http(s) URL, as a remote file.
    pub fn source(self, source: &str) -> Self {
        if is_remote(source) {
            self.url_to_env_yml(source)
        } else {
            self.path_to_env_yml(source)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CredentialFile {
    #[serde(rename = "OSH_URL")]
    url: Option<String>,
    #[serde(rename = "OSH_TOKEN")]
    token: Option<String>,
}

/// Resolve credentials from the environment, a credentials file and the
/// given options.
///
/// # Errors
/// Returns `OshError::Config` when `path_to_env_yml` is set but the file
/// cannot be read or is not valid YAML.
pub async fn resolve(options: &CredentialOptions) -> Result<Credentials> {
    let file = load_credential_file(options).await?.unwrap_or_default();

    let url = std::env::var(ENV_URL_KEY)
        .ok()
        .or(file.url)
        .or_else(|| options.url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let token = std::env::var(ENV_TOKEN_KEY)
        .ok()
        .or(file.token)
        .or_else(|| options.token.clone())
        .unwrap_or_default();

    let credentials = Credentials::new(url, token);
    info!(base_url = %credentials.base_url, has_token = credentials.has_token(), "credentials resolved");
    Ok(credentials)
}

async fn load_credential_file(options: &CredentialOptions) -> Result<Option<CredentialFile>> {
    if let Some(path) = non_empty_path(options.path_to_env_yml.as_deref()) {
        return read_file(path).map(Some).map_err(|err| {
            OshError::Config(format!(
                "Cannot use credentials file {}: {}",
                path.display(),
                err.detail()
            ))
        });
    }

    let loaded = if let Some(url) = options.url_to_env_yml.as_deref().filter(|u| !u.trim().is_empty()) {
        fetch_file(url).await
    } else {
        let default = Path::new(DEFAULT_CREDENTIALS_FILE);
        if !default.exists() {
            debug!("no credentials file found");
            return Ok(None);
        }
        read_file(default)
    };

    match loaded {
        Ok(file) => Ok(Some(file)),
        Err(err) => {
            warn!(error = %err, "ignoring unreadable credentials file");
            Ok(None)
        }
    }
}

fn non_empty_path(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn read_file(path: &Path) -> Result<CredentialFile> {
    debug!(path = %path.display(), "reading credentials file");
    let contents = std::fs::read_to_string(path).map_err(|e| OshError::from(InfraError::from(e)))?;
    parse_credential_file(&contents)
}

async fn fetch_file(url: &str) -> Result<CredentialFile> {
    debug!(%url, "downloading credentials file");
    let http = HttpClient::new()?;
    let response = http.send(http.request(reqwest::Method::GET, url)).await?;
    let contents = response.text().await.map_err(|e| OshError::from(InfraError::from(e)))?;
    parse_credential_file(&contents)
}

fn parse_credential_file(contents: &str) -> Result<CredentialFile> {
    serde_yaml::from_str(contents).map_err(|e| InfraError::from(e).into())
}

fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credential_file() {
        let file = parse_credential_file("OSH_URL: https://example.org/\nOSH_TOKEN: abc123\n").unwrap();
        assert_eq!(file.url.as_deref(), Some("https://example.org/"));
        assert_eq!(file.token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_partial_credential_file() {
        let file = parse_credential_file("OSH_TOKEN: only-token\n").unwrap();
        assert!(file.url.is_none());
        assert_eq!(file.token.as_deref(), Some("only-token"));
    }

    #[test]
    fn test_parse_invalid_yaml_is_config_error() {
        let err = parse_credential_file("OSH_URL: [unclosed").unwrap_err();
        assert!(matches!(err, OshError::Config(_)));
    }

    #[test]
    fn test_source_detects_remote_files() {
        let remote = CredentialOptions::new().source("https://example.org/env.yml");
        assert_eq!(remote.url_to_env_yml.as_deref(), Some("https://example.org/env.yml"));
        assert!(remote.path_to_env_yml.is_none());

        let local = CredentialOptions::new().source("/etc/oshub/env.yml");
        assert_eq!(local.path_to_env_yml, Some(PathBuf::from("/etc/oshub/env.yml")));
    }
}

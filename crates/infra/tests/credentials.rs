//! Credential precedence: environment > credentials file > explicit options.

mod support;

use std::io::Write;
use std::sync::Mutex;

use oshub_domain::constants::{DEFAULT_BASE_URL, ENV_TOKEN_KEY, ENV_URL_KEY};
use oshub_domain::{ClientConfig, OshError};
use oshub_infra::config::{resolve, CredentialOptions};
use oshub_infra::OshClient;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    std::env::remove_var(ENV_URL_KEY);
    std::env::remove_var(ENV_TOKEN_KEY);
}

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write credentials");
    file
}

#[tokio::test]
async fn explicit_options_when_nothing_else_is_set() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let options = CredentialOptions::new()
        .url("https://staging.example.org/")
        .token("param-token");
    let credentials = resolve(&options).await.unwrap();

    assert_eq!(credentials.base_url, "https://staging.example.org");
    assert_eq!(credentials.token, "param-token");
}

#[tokio::test]
async fn defaults_without_any_source() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let credentials = resolve(&CredentialOptions::new()).await.unwrap();

    assert_eq!(credentials.base_url, DEFAULT_BASE_URL);
    assert!(!credentials.has_token());
}

#[tokio::test]
async fn file_overrides_options() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let file = yaml_file("OSH_URL: https://file.example.org/\nOSH_TOKEN: file-token\n");
    let options = CredentialOptions::new()
        .url("https://param.example.org")
        .token("param-token")
        .path_to_env_yml(file.path());
    let credentials = resolve(&options).await.unwrap();

    assert_eq!(credentials.base_url, "https://file.example.org");
    assert_eq!(credentials.token, "file-token");
}

#[tokio::test]
async fn environment_overrides_file() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    std::env::set_var(ENV_TOKEN_KEY, "env-token");

    let file = yaml_file("OSH_URL: https://file.example.org\nOSH_TOKEN: file-token\n");
    let options = CredentialOptions::new().path_to_env_yml(file.path());
    let credentials = resolve(&options).await;
    clear_env();

    let credentials = credentials.unwrap();
    assert_eq!(credentials.base_url, "https://file.example.org");
    assert_eq!(credentials.token, "env-token");
}

#[tokio::test]
async fn unreadable_explicit_file_is_config_error() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let file = yaml_file("OSH_URL: [not yaml");
    let options = CredentialOptions::new().url("https://param.example.org").path_to_env_yml(file.path());
    let err = resolve(&options).await.unwrap_err();
    assert!(matches!(err, OshError::Config(_)));

    let options = CredentialOptions::new().path_to_env_yml("/nonexistent/.env.yml");
    let err = resolve(&options).await.unwrap_err();
    assert!(err.to_string().contains("/nonexistent/.env.yml"));
}

#[tokio::test]
async fn unreadable_remote_file_falls_through() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/env.yml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OSH_URL: [not yaml"))
        .mount(&server)
        .await;

    let options = CredentialOptions::new()
        .url("https://param.example.org")
        .url_to_env_yml(format!("{}/env.yml", server.uri()));
    let credentials = resolve(&options).await.unwrap();

    assert_eq!(credentials.base_url, "https://param.example.org");
}

#[tokio::test]
async fn remote_credentials_file_is_downloaded() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/env.yml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("OSH_URL: https://remote.example.org\nOSH_TOKEN: remote\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let options = CredentialOptions::new().url_to_env_yml(format!("{}/env.yml", server.uri()));
    let credentials = resolve(&options).await.unwrap();

    assert_eq!(credentials.base_url, "https://remote.example.org");
    assert_eq!(credentials.token, "remote");
}

#[tokio::test]
async fn connect_uses_credentials_source() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let file = yaml_file("OSH_URL: http://localhost:8081/\nOSH_TOKEN: from-file\n");
    let config = ClientConfig {
        credentials_source: Some(file.path().display().to_string()),
        ..ClientConfig::default()
    };
    let client = OshClient::connect(config).await.unwrap();

    assert_eq!(client.config().credentials.base_url, "http://localhost:8081");
    assert_eq!(client.config().credentials.token, "from-file");
}

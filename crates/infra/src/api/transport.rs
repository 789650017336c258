//! reqwest-backed [`Transport`]

use async_trait::async_trait;
use oshub_core::{ApiRequest, ApiResponse, HttpMethod, Transport};
use oshub_domain::{ClientConfig, Credentials, OshError, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

/// Sends [`ApiRequest`]s to the configured Open Supply Hub instance.
///
/// Relative paths are appended to the base URL; absolute `http(s)` URLs (the
/// `next` links of paginated responses) are used unchanged.
#[derive(Clone)]
pub struct HttpTransport {
    http: HttpClient,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(http: HttpClient, credentials: Credentials) -> Self {
        Self { http, credentials }
    }

    /// Build a transport with an HTTP client using the configured timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("oshub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(http, config.credentials.clone()))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let raw = if is_absolute(&request.path) {
            request.path.clone()
        } else {
            format!("{}/{}", self.credentials.base_url, request.path.trim_start_matches('/'))
        };

        let mut url = Url::parse(&raw)
            .map_err(|e| OshError::Config(format!("Invalid request URL {raw}: {e}")))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = request.method.as_str(), path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(request)?;
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.http.request(method, url).header(ACCEPT, "application/json");
        if self.credentials.has_token() {
            builder = builder.header(AUTHORIZATION, format!("Token {}", self.credentials.token));
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self.http.send(builder).await?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| OshError::from(InfraError::from(e)))?;

        debug!(status, bytes = text.len(), "response received");
        Ok(ApiResponse::new(status, decode_body(&text)))
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Empty bodies decode to `null`; bodies that are not JSON become a string.
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport(base_url: &str, token: &str) -> HttpTransport {
        HttpTransport::new(HttpClient::new().unwrap(), Credentials::new(base_url, token))
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(
            decode_body("Request was throttled. Expected available in 3 seconds."),
            json!("Request was throttled. Expected available in 3 seconds.")
        );
    }

    #[test]
    fn test_url_for_joins_and_keeps_absolute() {
        let t = transport("https://example.org/", "");
        let url = t.url_for(&ApiRequest::get("/api/sectors/").with_query("q", "a b")).unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/sectors/?q=a+b");

        let next = "https://example.org/api/facilities/?page=2&pageSize=10";
        assert_eq!(t.url_for(&ApiRequest::get(next)).unwrap().as_str(), next);
    }

    #[tokio::test]
    async fn sends_token_header_and_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/facilities/"))
            .and(query_param("create", "false"))
            .and(header("authorization", "Token secret"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({"name": "Acme"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"os_id": "US1"})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::post("/api/facilities/", Some(json!({"name": "Acme"})))
            .with_flag("create", false)
            .with_timeout(Duration::from_secs(5));
        let response = transport(&server.uri(), "secret").send(&request).await.unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body["os_id"], "US1");
    }

    #[tokio::test]
    async fn omits_authorization_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health-check/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let response = transport(&server.uri(), "").send(&ApiRequest::get("/health-check/")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Value::Null);

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn non_success_statuses_are_responses_not_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Expected available in 2 seconds."))
            .mount(&server)
            .await;

        let response = transport(&server.uri(), "t").send(&ApiRequest::get("/api/countries/")).await.unwrap();
        assert_eq!(response.status, 429);
        assert_eq!(response.body, json!("Expected available in 2 seconds."));
    }
}

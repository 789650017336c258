//! Conversions from external infrastructure errors into domain errors.

use oshub_domain::OshError;
use reqwest::Error as HttpError;
use serde_yaml::Error as YamlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct InfraError(pub OshError);

impl From<InfraError> for OshError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<OshError> for InfraError {
    fn from(value: OshError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoOshError {
    fn into_osh(self) -> OshError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → OshError */
/* -------------------------------------------------------------------------- */

impl IntoOshError for HttpError {
    fn into_osh(self) -> OshError {
        if self.is_timeout() {
            return OshError::Transport(format!("HTTP request timed out: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return OshError::Transport(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return OshError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            return OshError::Remote {
                status: status.as_u16(),
                detail: status.canonical_reason().unwrap_or("unknown status").to_string(),
            };
        }

        OshError::Transport(format!("HTTP request failed: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_osh())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_yaml::Error / std::io::Error → OshError */
/* -------------------------------------------------------------------------- */

impl From<YamlError> for InfraError {
    fn from(value: YamlError) -> Self {
        InfraError(OshError::Config(format!("Invalid YAML credentials: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(OshError::Config(format!("Failed to read file: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_error_maps_to_remote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: OshError = InfraError::from(error).into();
        match mapped {
            OshError::Remote { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Unauthorized");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: OshError = InfraError::from(error).into();
        match mapped {
            OshError::Transport(msg) => assert!(msg.to_lowercase().contains("http")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn yaml_error_maps_to_config() {
        let error = serde_yaml::from_str::<std::collections::HashMap<String, String>>("[1, 2")
            .unwrap_err();
        let mapped: OshError = InfraError::from(error).into();
        assert!(matches!(mapped, OshError::Config(msg) if msg.contains("YAML")));
    }
}

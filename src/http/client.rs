//! Authenticated HTTP client for the factory control plane.
//!
//! One call per `request`, no retries: a lifecycle-mutating call that
//! fails surfaces immediately and is never silently repeated.

use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::debug;

use super::ResponseBody;
use crate::config::FactoryConfig;
use crate::error::{FactoryError, FactoryResult};

/// Raw HTTP client for the control-plane REST API.
#[derive(Debug, Clone)]
pub struct FactoryClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl FactoryClient {
    /// Build a client from configuration.
    pub fn new(config: &FactoryConfig) -> FactoryResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FactoryError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request and decode the JSON response.
    ///
    /// An empty success body decodes to `{}`. A non-JSON success body is a
    /// `Decode` error carrying the raw text; a non-success status is an
    /// `Http` error carrying whatever body came back.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> FactoryResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "control-plane request");

        let mut builder = self.http.request(method.clone(), &url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%method, %url, status = status.as_u16(), "control-plane response");

        let body = ResponseBody::from_text(&text);
        if !status.is_success() {
            return Err(FactoryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        match body {
            ResponseBody::Empty => Ok(json!({})),
            ResponseBody::Json(value) => Ok(value),
            ResponseBody::Text(raw) => Err(FactoryError::decode(
                format!("response from {path}"),
                "body is not JSON",
                &raw,
            )),
        }
    }

    pub async fn get(&self, path: &str) -> FactoryResult<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<&Value>) -> FactoryResult<Value> {
        self.request(Method::POST, path, body).await
    }

    pub async fn delete(&self, path: &str) -> FactoryResult<Value> {
        self.request(Method::DELETE, path, None).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;

    use super::*;
    use crate::error::ErrorKind;

    fn client_for(server: &MockServer, token: Option<&str>) -> FactoryClient {
        FactoryClient::new(&FactoryConfig {
            base_url: server.base_url(),
            token: token.map(str::to_string),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn client_trims_base_url() {
        let client = FactoryClient::new(&FactoryConfig {
            base_url: "http://localhost:3000/".into(),
            token: None,
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn sends_bearer_token_and_json_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/factory/cells")
                .header("authorization", "Bearer secret")
                .json_body(json!({"id": "demo"}));
            then.status(201).json_body(json!({"id": "demo", "state": "pending"}));
        });

        let client = client_for(&server, Some("secret"));
        let resp = client
            .post("/factory/cells", Some(&json!({"id": "demo"})))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(resp["state"], "pending");
    }

    #[tokio::test]
    async fn empty_success_body_is_empty_object() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/factory/cells/x/approve");
            then.status(204);
        });

        let resp = client_for(&server, None)
            .post("/factory/cells/x/approve", None)
            .await
            .unwrap();
        assert_eq!(resp, json!({}));
    }

    #[tokio::test]
    async fn error_status_keeps_json_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/organs/x/status");
            then.status(404).json_body(json!({"error": "organ not found"}));
        });

        let err = client_for(&server, None)
            .get("/organs/x/status")
            .await
            .unwrap_err();
        match err {
            FactoryError::Http { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, ResponseBody::Json(json!({"error": "organ not found"})));
            }
            other => panic!("expected Http, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_keeps_text_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/organs/x/status");
            then.status(502).body("upstream down");
        });

        let err = client_for(&server, None)
            .get("/organs/x/status")
            .await
            .unwrap_err();
        match err {
            FactoryError::Http { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, ResponseBody::Text("upstream down".into()));
            }
            other => panic!("expected Http, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_is_decode_with_raw_text() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/organs/x/status");
            then.status(200).body("building...");
        });

        let err = client_for(&server, None)
            .get("/organs/x/status")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        match err {
            FactoryError::Decode { raw, .. } => assert_eq!(raw, "building..."),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let client = FactoryClient::new(&FactoryConfig {
            base_url: "http://127.0.0.1:1".into(),
            token: None,
            timeout_secs: 2,
        })
        .unwrap();
        let err = client.get("/organs/x/status").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}

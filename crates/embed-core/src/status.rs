//! Status Endpoint Client
//!
//! `GET {api_base_url}/ref/{reference}` authenticated with the `embedtoken`
//! header. Any success body is handed back as raw JSON; interpreting the
//! terminal field is the poller's job.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EmbedError, Result};
use crate::reference::TransactionReference;

/// Header carrying `{token}` or `{token}:{username}`
pub const EMBED_TOKEN_HEADER: &str = "embedtoken";

/// Status client trait (Strategy pattern)
#[async_trait(?Send)]
pub trait StatusClient {
    /// Fetch the status body for a reference
    async fn fetch_status(&self, reference: &TransactionReference, auth: &str) -> Result<Value>;
}

/// HTTP status client backed by `reqwest` (fetch API on wasm)
#[derive(Clone, Debug)]
pub struct HttpStatusClient {
    client: reqwest::Client,
    api_base_url: String,
}

impl HttpStatusClient {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Status URL for a reference
    pub fn status_url(&self, reference: &TransactionReference) -> String {
        format!("{}/ref/{}", self.api_base_url, reference)
    }
}

#[async_trait(?Send)]
impl StatusClient for HttpStatusClient {
    async fn fetch_status(&self, reference: &TransactionReference, auth: &str) -> Result<Value> {
        let response = self
            .client
            .get(self.status_url(reference))
            .header(EMBED_TOKEN_HEADER, auth)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_status_url() {
        let client = HttpStatusClient::new("https://api.example.com/");
        let reference = TransactionReference::from_string("1234a678");
        assert_eq!(client.status_url(&reference), "https://api.example.com/ref/1234a678");
    }

    #[tokio::test]
    async fn test_fetch_sends_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ref/1234a678"))
            .and(header(EMBED_TOKEN_HEADER, "tok1:alice"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"isPaid":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpStatusClient::new(server.uri());
        let body = client
            .fetch_status(&TransactionReference::from_string("1234a678"), "tok1:alice")
            .await
            .unwrap();
        assert_eq!(body["isPaid"], true);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpStatusClient::new(server.uri());
        let err = client
            .fetch_status(&TransactionReference::from_string("1234a678"), "tok1")
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = HttpStatusClient::new(server.uri());
        let err = client
            .fetch_status(&TransactionReference::from_string("1234a678"), "tok1")
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Json(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable() {
        let client = HttpStatusClient::new("http://127.0.0.1:9");
        let err = client
            .fetch_status(&TransactionReference::from_string("1234a678"), "tok1")
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}

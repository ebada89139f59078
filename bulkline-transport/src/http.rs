use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::trace;

use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `reqwest`-backed transport. Relative request URLs (the common case
/// for the `/_bulk` endpoint) are joined onto the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(HttpTransport {
            base_url: base_url.into(),
            client,
        })
    }

    fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let url = self.absolute_url(&request.url);
        trace!(%method, %url, "executing http request");

        let mut builder = self.client.request(method, url);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

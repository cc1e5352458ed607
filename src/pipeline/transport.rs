//! Transport: POST a multipart form and hand back the raw response.
//!
//! The transport does not judge the response. A 500 is a perfectly good
//! [`RawResponse`]; only failing to get *any* response (connection refused,
//! reset, timeout) is an error here. That keeps the HTTP-level/transport-level
//! distinction the interpreter relies on.
//!
//! No retries happen at this layer.

use crate::config::ClientConfig;
use crate::error::StegError;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use std::time::Duration;
use tracing::{debug, info};

/// Status, content type and fully materialised body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport bound to one configured `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    timeout_secs: Option<u64>,
}

impl Transport {
    /// Build the underlying HTTP client from the config.
    pub fn new(config: &ClientConfig) -> Result<Self, StegError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| StegError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// POST `form` to `endpoint` and drain the response body.
    pub async fn submit(&self, form: Form, endpoint: &str) -> Result<RawResponse, StegError> {
        info!("POST {}", endpoint);

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_err(endpoint, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_err(endpoint, e))?;
            body.extend_from_slice(&chunk);
        }

        debug!(
            "{} → HTTP {} ({}, {} bytes)",
            endpoint,
            status,
            content_type.as_deref().unwrap_or("no content type"),
            body.len()
        );

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }

    fn map_err(&self, endpoint: &str, e: reqwest::Error) -> StegError {
        match (e.is_timeout(), self.timeout_secs) {
            (true, Some(secs)) => StegError::Timeout {
                endpoint: endpoint.to_string(),
                secs,
            },
            _ => StegError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            },
        }
    }
}

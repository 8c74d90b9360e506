use std::time::Duration;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use thiserror::Error;
use crate::document::Document;
use crate::service::ServiceId;

/// What an IM answered.
#[derive(Debug, Clone)]
pub struct PeerResponse {
    pub status: u16,
    pub cache_control: Option<String>,
    /// None when the body was not a JSON object
    pub body: Option<Document>,
}

impl PeerResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer could not be reached at all (refused, timed out, reset).
    #[error("IM at {address} not reachable: {reason}")]
    Unreachable { address: String, reason: String },
}

/// Outbound call to an IM.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, id: &ServiceId, payload: &Document) -> Result<PeerResponse, TransportError>;
}

/// Calls IMs over HTTP: a GET to the IM's address with the payload as JSON body.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

/// IMs register as `host:port`; those are reached over plain HTTP.
pub fn endpoint_url(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, id: &ServiceId, payload: &Document) -> Result<PeerResponse, TransportError> {
        let unreachable = |e: reqwest::Error| TransportError::Unreachable {
            address: id.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(endpoint_url(id.as_str()))
            .json(payload)
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status().as_u16();
        let cache_control = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(unreachable)?;

        let body = match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        };

        Ok(PeerResponse { status, cache_control, body })
    }
}

// src/utils/http.rs
use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::engine::HeaderSet;
use crate::error::{DorkHuntResult, DorkHuntError};

/// Status and body of a completed GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    /// Empty unless the status is 2xx
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Reasons a GET produced no response at all
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Outbound GET capability used by the dispatcher
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &Url, headers: &HeaderSet, timeout: Duration) -> Result<FetchResponse, FetchError>;
}

/// HTTP client for making requests
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client. `timeout` is the default for requests
    /// that do not set their own.
    pub fn new(timeout: Duration) -> DorkHuntResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| DorkHuntError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Make a POST request with JSON body
    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, data: &T) -> DorkHuntResult<Response> {
        debug!("POST {}", url);

        self.client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(data)
            .send()
            .await
            .map_err(|e| DorkHuntError::NetworkError(format!("Failed to POST to {}: {}", url, e)))
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(error.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn get(&self, url: &Url, headers: &HeaderSet, timeout: Duration) -> Result<FetchResponse, FetchError> {
        debug!("GET {}", url);

        let mut request = self.client.get(url.clone()).timeout(timeout);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status().as_u16();

        let body = if response.status().is_success() {
            response.text().await.map_err(classify)?
        } else {
            String::new()
        };

        Ok(FetchResponse { status, body })
    }
}

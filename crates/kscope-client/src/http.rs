// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! reqwest-backed [`TraceBackend`].

use std::time::Duration;

use kscope_trace::BlockCoord;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, error};

use crate::backend::{TraceBackend, CATALOG_PATH, SOURCE_PATH, TRACE_PATH};
use crate::error::TransportError;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to a trace server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: String,
    client: Client,
}

impl HttpBackend {
    /// Backend for the server at `base_url` (trailing slashes ignored).
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| TransportError::Http {
                endpoint: "client",
                source,
            })?;
        Ok(Self::with_client(base_url, client))
    }

    /// Backend reusing an existing client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base = base_url.into().trim_end_matches('/').to_owned();
        Self { base, client }
    }

    /// Server base URL.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

fn check(endpoint: &'static str, res: Result<Response, reqwest::Error>) -> Result<Response, TransportError> {
    let res = res.map_err(|source| {
        error!(endpoint, error = %source, "request failed");
        TransportError::Http { endpoint, source }
    })?;
    let status = res.status();
    if !status.is_success() {
        error!(endpoint, status = status.as_u16(), "server returned error status");
        return Err(TransportError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }
    debug!(endpoint, status = status.as_u16(), "response received");
    Ok(res)
}

async fn json_body(endpoint: &'static str, res: Response) -> Result<Value, TransportError> {
    res.json::<Value>()
        .await
        .map_err(|source| TransportError::Http { endpoint, source })
}

impl TraceBackend for HttpBackend {
    async fn fetch_source(&self) -> Result<String, TransportError> {
        let res = check(SOURCE_PATH, self.client.get(self.url(SOURCE_PATH)).send().await)?;
        res.text().await.map_err(|source| TransportError::Http {
            endpoint: SOURCE_PATH,
            source,
        })
    }

    async fn fetch_trace(&self, block: BlockCoord) -> Result<Value, TransportError> {
        let res = check(
            TRACE_PATH,
            self.client
                .post(self.url(TRACE_PATH))
                .json(&block)
                .send()
                .await,
        )?;
        json_body(TRACE_PATH, res).await
    }

    async fn fetch_catalog(&self) -> Result<Value, TransportError> {
        let res = check(CATALOG_PATH, self.client.get(self.url(CATALOG_PATH)).send().await)?;
        json_body(CATALOG_PATH, res).await
    }
}

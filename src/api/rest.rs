//! Hosted REST data store client.
//!
//! Talks to a PostgREST-style endpoint (`{api_url}/rest/v1/{table}`) with
//! the project key sent as both `apikey` and bearer token. It provides the
//! health probe and the generic row update used by timer operations.
//!
//! ```rust,no_run
//! use taskpulse::api::rest::RestStore;
//! use taskpulse::db::store::Probe;
//! use taskpulse::libs::config::ServerConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = RestStore::new(&ServerConfig {
//!     api_url: "https://project.example.co".to_string(),
//!     api_key: "public-anon-key".to_string(),
//! })?;
//! store.probe().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::store::{validate_identifier, Persist, Probe, Record, StoreError};
use crate::libs::config::ServerConfig;
use crate::libs::task::TASKS_TABLE;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

const REST_PATH: &str = "rest/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    pub fn new(config: &ServerConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key).map_err(|e| StoreError::Unreachable(format!("invalid API key header: {e}")))?;
        let bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(|e| StoreError::Unreachable(format!("invalid API key header: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder().default_headers(headers).timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn table_url(&self, table: &str) -> Result<String, StoreError> {
        Ok(format!("{}/{REST_PATH}/{}", self.base_url, validate_identifier(table)?))
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    if e.is_connect() || e.is_timeout() {
        StoreError::Unreachable(e.to_string())
    } else {
        StoreError::Http(e)
    }
}

#[async_trait]
impl Probe for RestStore {
    async fn probe(&self) -> Result<(), StoreError> {
        let url = self.table_url(TASKS_TABLE)?;
        let response = self
            .client
            .get(url)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Persist for RestStore {
    async fn persist(&self, table: &str, id: i64, patch: &Record) -> Result<Record, StoreError> {
        let url = self.table_url(table)?;
        let response = self
            .client
            .patch(url)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(transport)?;

        let rows: Vec<Value> = Self::check(response).await?.json().await?;
        match rows.into_iter().next() {
            Some(Value::Object(row)) => Ok(row),
            _ => Err(StoreError::NotFound {
                table: table.to_string(),
                id,
            }),
        }
    }
}

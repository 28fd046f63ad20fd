//! HTTP client for the managed backend.
//!
//! Records live under `/rest/v1/{table}` with PostgREST-style filters in the
//! query string; identity endpoints live under `/auth/v1/`. Every request
//! carries the project's publishable API key, plus a bearer token that is the
//! signed-in user's access token once one is known.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio::sync::RwLock;
use url::Url;

use crate::backend::records::RecordStore;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::{ConfigError, StoreError};

/// Shared connection to the managed backend: one HTTP client, the project
/// base URL, and the current credentials. Built once and shared by the
/// record store and the auth gateway.
pub struct BackendClient {
    http: reqwest::Client,
    base: String,
    api_key: HeaderValue,
    bearer: RwLock<HeaderValue>,
}

impl BackendClient {
    /// Validates the project URL and key. Until an access token is supplied,
    /// requests authenticate with the API key alone.
    pub fn new(
        base_url: &str,
        api_key: &str,
        access_token: Option<&str>,
    ) -> Result<Self, ConfigError> {
        Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let key_header = HeaderValue::from_str(api_key)
            .map_err(|_| ConfigError::InvalidKey("key is not a valid header value".to_string()))?;
        let bearer = Self::bearer_value(access_token.unwrap_or(api_key))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base: base_url.trim_end_matches('/').to_string(),
            api_key: key_header,
            bearer: RwLock::new(bearer),
        })
    }

    fn bearer_value(token: &str) -> Result<HeaderValue, ConfigError> {
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ConfigError::InvalidKey("token is not a valid header value".to_string()))
    }

    /// Swaps in a fresh access token, e.g. after sign-in or a refresh.
    pub async fn set_access_token(&self, token: &str) -> Result<(), ConfigError> {
        let bearer = Self::bearer_value(token)?;
        *self.bearer.write().await = bearer;
        Ok(())
    }

    pub(crate) async fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", self.api_key.clone());
        headers.insert(AUTHORIZATION, self.bearer.read().await.clone());
        headers
    }

    pub(crate) fn api_key(&self) -> HeaderValue {
        self.api_key.clone()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    pub(crate) fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base, endpoint)
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }
}

/// Record store speaking to the backend's REST interface.
pub struct HttpRecordStore {
    client: Arc<BackendClient>,
    table: String,
}

impl HttpRecordStore {
    pub fn new(client: Arc<BackendClient>, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
        }
    }

    fn table_url(&self) -> Result<Url, StoreError> {
        Url::parse(&self.client.rest_url(&self.table))
            .map_err(|e| StoreError::Backend(format!("invalid request URL: {}", e)))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{}", owner_id))
            .append_pair("order", "created_at.desc");

        let response = self
            .client
            .http()
            .get(url)
            .headers(self.client.auth_headers().await)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "list failed: HTTP {}",
                response.status()
            )));
        }
        response
            .json::<Vec<Bookmark>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, StoreError> {
        let response = self
            .client
            .http()
            .post(self.client.rest_url(&self.table))
            .headers(self.client.auth_headers().await)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "insert failed: HTTP {}",
                response.status()
            )));
        }
        let rows: Vec<Bookmark> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        rows.into_iter().next().ok_or(StoreError::EmptyInsert)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id));

        let response = self
            .client
            .http()
            .delete(url)
            .headers(self.client.auth_headers().await)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "delete failed: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

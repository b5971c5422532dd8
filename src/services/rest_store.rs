//! HTTP record store for a hosted PostgREST-style backend.
//!
//! Rows live at `{base}/rest/v1/{table}`; filters and ordering are query
//! parameters (`id=eq.<id>`, `order=created_at.desc`). Every request carries the
//! public API key plus a bearer token (a user access token when one is set).

use std::sync::RwLock;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, Url};

use crate::managers::bookmark_manager::BookmarkStore;
use crate::types::bookmark::{Bookmark, BookmarkChanges, ListOrder, NewBookmark};
use crate::types::errors::RemoteError;

pub struct RestBookmarkStore {
    client: Client,
    endpoint: Url,
    api_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestBookmarkStore {
    pub fn new(
        base_url: &str,
        table: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let raw = format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table);
        let endpoint =
            Url::parse(&raw).map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", raw, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            access_token: RwLock::new(None),
        })
    }

    /// Token sent as `Authorization: Bearer`: the user's access token while one is
    /// set, the public API key otherwise.
    pub fn bearer(&self) -> String {
        self.access_token
            .read()
            .ok()
            .and_then(|token| token.clone())
            .unwrap_or_else(|| self.api_key.clone())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `GET` URL for a full snapshot in the given order.
    pub fn list_url(&self, order: ListOrder) -> Url {
        let direction = if order.ascending { "asc" } else { "desc" };
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", &format!("{}.{}", order.column.as_str(), direction));
        url
    }

    /// URL addressing a single row by id.
    pub fn record_url(&self, id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
            .header("Accept", "application/json")
    }

    async fn send(builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Http {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    async fn rows(response: Response) -> Result<Vec<Bookmark>, RemoteError> {
        response
            .json::<Vec<Bookmark>>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Pulls `message` out of a JSON error body, falling back to the raw body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

impl BookmarkStore for RestBookmarkStore {
    async fn list(&self, order: ListOrder) -> Result<Vec<Bookmark>, RemoteError> {
        let response = Self::send(self.request(Method::GET, self.list_url(order))).await?;
        Self::rows(response).await
    }

    async fn insert(&self, record: NewBookmark) -> Result<Bookmark, RemoteError> {
        let builder = self
            .request(Method::POST, self.endpoint.clone())
            .header("Prefer", "return=representation")
            .json(&record);
        let response = Self::send(builder).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode("insert returned no row".to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        Self::send(self.request(Method::DELETE, self.record_url(id))).await?;
        Ok(())
    }

    async fn update(&self, id: &str, changes: BookmarkChanges) -> Result<Bookmark, RemoteError> {
        let builder = if changes.is_empty() {
            self.request(Method::GET, self.record_url(id))
        } else {
            self.request(Method::PATCH, self.record_url(id))
                .header("Prefer", "return=representation")
                .json(&changes)
        };
        let response = Self::send(builder).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }

    fn set_access_token(&self, token: Option<&str>) {
        match self.access_token.write() {
            Ok(mut slot) => *slot = token.map(str::to_string),
            Err(e) => tracing::error!(error = %e, "access token lock poisoned"),
        }
    }
}

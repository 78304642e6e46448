//! Remote table store backend.
//!
//! [`PostgrestBackend`] speaks the PostgREST dialect exposed by Supabase:
//! `/rest/v1/{table}` with `eq.` filters and `order=field.desc`.

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Url};
use secrecy::ExposeSecret;
use serde_json::Value as JsonValue;

use crate::config::RemoteSettings;
use crate::error::{AppError, AppResult};

use super::Filter;

/// A generic table store addressed by collection name.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Rows matching an optional equality filter, newest first by `order_by`.
    async fn select(
        &self,
        table: &str,
        filter: Option<&Filter>,
        order_by: &str,
    ) -> AppResult<Vec<JsonValue>>;

    async fn select_by_id(&self, table: &str, id: &str) -> AppResult<Option<JsonValue>>;

    /// Insert one row; returns the stored row with generated fields.
    async fn insert(&self, table: &str, row: JsonValue) -> AppResult<JsonValue>;

    /// Merge fields into a row; `None` when the id is unknown.
    async fn update(&self, table: &str, id: &str, patch: JsonValue)
    -> AppResult<Option<JsonValue>>;

    async fn delete(&self, table: &str, id: &str) -> AppResult<()>;
}

/// PostgREST client over reqwest.
#[derive(Clone)]
pub struct PostgrestBackend {
    client: Client,
    base: Url,
}

impl PostgrestBackend {
    pub fn new(settings: &RemoteSettings) -> AppResult<Self> {
        let base = Url::parse(settings.url.trim_end_matches('/')).map_err(|e| {
            AppError::InvalidInput(format!("DECK_REMOTE_URL is not a valid URL: {}", e))
        })?;

        let key = settings.key.expose_secret();
        let mut apikey = header::HeaderValue::from_str(key)
            .map_err(|e| AppError::InvalidInput(format!("DECK_REMOTE_KEY is invalid: {}", e)))?;
        apikey.set_sensitive(true);
        let mut bearer = header::HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|e| AppError::InvalidInput(format!("DECK_REMOTE_KEY is invalid: {}", e)))?;
        bearer.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", apikey);
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Remote(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> AppResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Remote(format!("Base URL {} cannot hold a path", self.base)))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);

        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Remote(format!("Response read failed: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::Remote(format!(
                "Request failed with status {}: {}",
                status, body
            )));
        }

        Ok(body)
    }

    async fn send_rows(&self, request: RequestBuilder) -> AppResult<Vec<JsonValue>> {
        let body = self.send(request).await?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::Remote(format!("Response was malformed JSON: {}", e)))
    }
}

fn id_param(id: &str) -> (&'static str, String) {
    ("id", format!("eq.{}", id))
}

const RETURN_REPRESENTATION: &str = "return=representation";

#[async_trait]
impl RemoteBackend for PostgrestBackend {
    async fn select(
        &self,
        table: &str,
        filter: Option<&Filter>,
        order_by: &str,
    ) -> AppResult<Vec<JsonValue>> {
        let mut params = vec![("select", "*".to_string())];
        if let Some(filter) = filter {
            params.push((filter.field, format!("eq.{}", filter.value)));
        }
        params.push(("order", format!("{}.desc", order_by)));

        let url = self.table_url(table, &params)?;
        self.send_rows(self.request(Method::GET, url)).await
    }

    async fn select_by_id(&self, table: &str, id: &str) -> AppResult<Option<JsonValue>> {
        let url = self.table_url(table, &[("select", "*".to_string()), id_param(id)])?;
        let rows = self.send_rows(self.request(Method::GET, url)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, table: &str, row: JsonValue) -> AppResult<JsonValue> {
        let url = self.table_url(table, &[])?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row]);

        self.send_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Remote(format!("Insert into {} returned no row", table)))
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        patch: JsonValue,
    ) -> AppResult<Option<JsonValue>> {
        let url = self.table_url(table, &[id_param(id)])?;
        let request = self
            .request(Method::PATCH, url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch);

        Ok(self.send_rows(request).await?.into_iter().next())
    }

    async fn delete(&self, table: &str, id: &str) -> AppResult<()> {
        let url = self.table_url(table, &[id_param(id)])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

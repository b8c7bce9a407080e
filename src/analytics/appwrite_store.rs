//! Appwrite document store
//!
//! Talks to the Appwrite Databases REST API. Every call is scoped to the one
//! database/collection pair from the configuration.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::models::{NewSearchCount, SearchCountRecord, SearchCountUpdate};
use super::store::{SearchCountStore, StoreError};

/// Appwrite list response
#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<SearchCountRecord>,
}

/// Appwrite error body
#[derive(Debug, Deserialize)]
struct AppwriteErrorBody {
    message: String,
}

/// Appwrite store configuration
#[derive(Debug, Clone)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    /// Server API key; without it requests run with guest permissions
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AppwriteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            project_id: String::new(),
            database_id: String::new(),
            collection_id: String::new(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Query builders for the `queries[]` parameter
pub(crate) mod query {
    use super::json;

    pub fn equal(attribute: &str, value: &str) -> String {
        json!({ "method": "equal", "attribute": attribute, "values": [value] }).to_string()
    }

    pub fn order_desc(attribute: &str) -> String {
        json!({ "method": "orderDesc", "attribute": attribute }).to_string()
    }

    pub fn limit(n: usize) -> String {
        json!({ "method": "limit", "values": [n] }).to_string()
    }
}

/// Map a failed response to a store error
pub(crate) fn error_from_status(status: u16, body: &str) -> StoreError {
    let message = serde_json::from_str::<AppwriteErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    if status == StatusCode::CONFLICT.as_u16() {
        StoreError::Conflict(message)
    } else {
        StoreError::Status { status, message }
    }
}

/// Search counter store backed by an Appwrite collection
pub struct AppwriteStore {
    config: AppwriteConfig,
    client: Client,
}

impl AppwriteStore {
    pub fn new(config: AppwriteConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Collection documents endpoint
    pub fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint.trim_end_matches('/'),
            self.config.database_id,
            self.config.collection_id
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("X-Appwrite-Project", &self.config.project_id);
        match &self.config.api_key {
            Some(key) => builder.header("X-Appwrite-Key", key),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_status(status.as_u16(), &body))
    }

    async fn list_documents(&self, queries: &[String]) -> Result<Vec<SearchCountRecord>, StoreError> {
        let params: Vec<(&str, &str)> = queries.iter().map(|q| ("queries[]", q.as_str())).collect();

        let response = self
            .authorize(self.client.get(self.documents_url()))
            .query(&params)
            .send()
            .await?;

        let list: DocumentList = Self::check(response).await?.json().await?;
        Ok(list.documents)
    }
}

#[async_trait]
impl SearchCountStore for AppwriteStore {
    fn store_name(&self) -> &'static str {
        "appwrite"
    }

    async fn find_by_term(&self, term: &str) -> Result<Option<SearchCountRecord>, StoreError> {
        let documents = self
            .list_documents(&[query::equal("searchTerm", term)])
            .await?;
        Ok(documents.into_iter().next())
    }

    async fn create(
        &self,
        document_id: &str,
        data: &NewSearchCount,
    ) -> Result<SearchCountRecord, StoreError> {
        let body = json!({ "documentId": document_id, "data": data });

        let response = self
            .authorize(self.client.post(self.documents_url()))
            .json(&body)
            .send()
            .await?;

        let record = Self::check(response).await?.json().await?;
        log::info!("Created search counter for {:?}", data.search_term);
        Ok(record)
    }

    async fn update_count(
        &self,
        document_id: &str,
        count: u64,
    ) -> Result<SearchCountRecord, StoreError> {
        let url = format!("{}/{}", self.documents_url(), document_id);
        let update = SearchCountUpdate { count };
        let body = json!({ "data": update });

        let response = self
            .authorize(self.client.patch(url))
            .json(&body)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn top_by_count(&self, limit: usize) -> Result<Vec<SearchCountRecord>, StoreError> {
        self.list_documents(&[query::order_desc("count"), query::limit(limit)])
            .await
    }
}

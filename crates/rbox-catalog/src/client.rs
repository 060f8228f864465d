//! Catalog REST API client.

use std::time::Duration;

use metrics::counter;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use rbox_models::{RingId, RingRecord};

use crate::error::{CatalogError, CatalogResult};

/// Catalog client configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// REST base URL (the datastore's REST surface, e.g. `https://db.example/rest/v1`)
    pub base_url: String,
    /// API key sent with every request
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl CatalogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> CatalogResult<Self> {
        let base_url = std::env::var("CATALOG_BASE_URL")
            .map_err(|_| CatalogError::config_error("CATALOG_BASE_URL not set"))?;
        let api_key = std::env::var("CATALOG_API_KEY")
            .map_err(|_| CatalogError::config_error("CATALOG_API_KEY not set"))?;

        if base_url.is_empty() {
            return Err(CatalogError::config_error("CATALOG_BASE_URL cannot be empty"));
        }

        let timeout_secs: u64 = std::env::var("CATALOG_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);

        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(5),
        })
    }
}

/// Row shape returned by the insert call.
#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: String,
}

/// Row shape returned by the existence query.
#[derive(Debug, Deserialize)]
struct SlugRow {
    #[allow(dead_code)]
    slug: String,
}

/// Catalog REST client.
#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CatalogClient {
    /// Create a new catalog client.
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("rbox-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CatalogError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> CatalogResult<Self> {
        Self::new(CatalogConfig::from_env()?)
    }

    /// Check whether a slug is already present in the catalog.
    ///
    /// An empty result set (or a 404) is the normal negative, not an error.
    pub async fn ring_exists(&self, slug: &str) -> CatalogResult<bool> {
        counter!("rbox_catalog_requests_total", "op" => "exists").increment(1);

        let url = format!("{}/rings", self.base_url);
        let slug_filter = format!("eq.{}", slug);
        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .query(&[
                ("select", "slug"),
                ("slug", slug_filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(CatalogError::unauthorized(response.text().await.unwrap_or_default()))
            }
            status if status.is_success() => {
                let rows: Vec<SlugRow> = response.json().await?;
                let exists = !rows.is_empty();
                debug!(slug = %slug, exists = exists, "Slug existence checked");
                Ok(exists)
            }
            status => Err(CatalogError::request_failed(
                status.as_u16(),
                response.text().await.unwrap_or_default(),
            )),
        }
    }

    /// Insert a ring row and return the created id.
    pub async fn insert_ring(&self, record: &RingRecord) -> CatalogResult<RingId> {
        counter!("rbox_catalog_requests_total", "op" => "insert").increment(1);

        let url = format!("{}/rings", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CatalogError::unauthorized(
                response.text().await.unwrap_or_default(),
            ));
        }
        if !status.is_success() {
            return Err(CatalogError::request_failed(
                status.as_u16(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let rows: Vec<InsertedRow> = response.json().await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::invalid_response("insert returned no rows"))?;

        debug!(slug = %record.slug, id = %row.id, "Ring row inserted");
        Ok(RingId::from_string(row.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rbox_models::{RingMetadata, RingStatus};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CatalogClient {
        CatalogClient::new(CatalogConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    fn record() -> RingRecord {
        RingRecord {
            id: RingId::from_string("pending"),
            slug: "vaaranam-aayiram-ninaikatha-bgm".to_string(),
            metadata: RingMetadata {
                media_title: "Vaaranam Aayiram".to_string(),
                ring_title: "Ninaikatha".to_string(),
                variant_label: Some("BGM".to_string()),
                contributors: vec![],
                moods: vec![],
            },
            universal_url: "https://cdn.example/rings/x.mp3".to_string(),
            device_url: None,
            duration_secs: 30.0,
            universal_size_bytes: 720_000,
            device_size_bytes: None,
            status: RingStatus::PendingReview,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ring_exists_positive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rings"))
            .and(query_param("slug", "eq.taken-slug"))
            .and(header("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"slug": "taken-slug"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.ring_exists("taken-slug").await.unwrap());
    }

    #[tokio::test]
    async fn test_ring_exists_empty_result_is_negative() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(!client.ring_exists("free-slug").await.unwrap());
    }

    #[tokio::test]
    async fn test_ring_exists_not_found_is_negative() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rings"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(!client.ring_exists("free-slug").await.unwrap());
    }

    #[tokio::test]
    async fn test_ring_exists_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.ring_exists("any").await {
            Err(CatalogError::RequestFailed { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insert_ring_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rings"))
            .and(header("Prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
                {"id": "ring-123", "slug": "vaaranam-aayiram-ninaikatha-bgm"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let id = client.insert_ring(&record()).await.unwrap();
        assert_eq!(id.as_str(), "ring-123");
    }

    #[tokio::test]
    async fn test_insert_ring_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.insert_ring(&record()).await,
            Err(CatalogError::Unauthorized(_))
        ));
    }
}

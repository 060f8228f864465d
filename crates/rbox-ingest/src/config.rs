//! Ingestion pipeline configuration.

use std::time::Duration;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Webhook endpoint notified after a successful submission
    pub webhook_url: Option<String>,
    /// Cache revalidation endpoint for listing pages
    pub revalidate_url: Option<String>,
    /// Quiet period before the duplicate-slug check fires
    pub slug_debounce: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            revalidate_url: None,
            slug_debounce: Duration::from_millis(crate::slug_check::DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl IngestConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            webhook_url: std::env::var("RBOX_WEBHOOK_URL").ok(),
            revalidate_url: std::env::var("RBOX_REVALIDATE_URL").ok(),
            slug_debounce: Duration::from_millis(
                std::env::var("RBOX_SLUG_DEBOUNCE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(crate::slug_check::DEFAULT_DEBOUNCE_MS),
            ),
        }
    }
}

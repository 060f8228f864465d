//! Best-effort post-commit side effects.
//!
//! Everything here runs after the catalog row is persisted, so failures
//! are logged and swallowed: the submission is already successful from the
//! user's point of view.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use rbox_models::{RingId, RingRecord};

/// Summary sent to the notification webhook.
#[derive(Debug, Clone, Serialize)]
pub struct RingSummary {
    pub ring_id: RingId,
    pub slug: String,
    pub media_title: String,
    pub ring_title: String,
    pub duration_secs: f64,
}

impl RingSummary {
    pub fn from_record(ring_id: RingId, record: &RingRecord) -> Self {
        Self {
            ring_id,
            slug: record.slug.clone(),
            media_title: record.metadata.media_title.clone(),
            ring_title: record.metadata.ring_title.clone(),
            duration_secs: record.duration_secs,
        }
    }
}

/// Named cache invalidation triggers for the listing pages a new ring
/// appears on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationTrigger {
    /// The "recent rings" front-page listing
    RecentRings,
    /// A per-contributor listing
    ContributorListing(String),
    /// A per-mood listing
    MoodListing(String),
}

impl InvalidationTrigger {
    /// Tag string sent to the revalidation endpoint.
    pub fn tag(&self) -> String {
        match self {
            InvalidationTrigger::RecentRings => "recent-rings".to_string(),
            InvalidationTrigger::ContributorListing(name) => format!("contributor:{}", name),
            InvalidationTrigger::MoodListing(mood) => format!("mood:{}", mood),
        }
    }

    /// All triggers touched by a newly inserted record.
    pub fn for_record(record: &RingRecord) -> Vec<Self> {
        let mut triggers = vec![InvalidationTrigger::RecentRings];
        for contributor in &record.metadata.contributors {
            triggers.push(InvalidationTrigger::ContributorListing(contributor.clone()));
        }
        for mood in &record.metadata.moods {
            triggers.push(InvalidationTrigger::MoodListing(mood.clone()));
        }
        triggers
    }
}

/// Fire-and-forget submission notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &RingSummary) -> anyhow::Result<()>;
}

/// Cache invalidation for a single named trigger.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, trigger: &InvalidationTrigger) -> anyhow::Result<()>;
}

/// Webhook-backed notifier. A missing URL turns it into a no-op.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, url: Option<String>) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, summary: &RingSummary) -> anyhow::Result<()> {
        let Some(url) = &self.url else {
            debug!("No webhook configured; skipping notification");
            return Ok(());
        };
        self.http
            .post(url)
            .json(summary)
            .send()
            .await?
            .error_for_status()?;
        debug!(slug = %summary.slug, "Submission notification sent");
        Ok(())
    }
}

/// HTTP revalidation-endpoint invalidator. A missing URL turns it into a
/// no-op.
pub struct HttpCacheInvalidator {
    http: reqwest::Client,
    url: Option<String>,
}

impl HttpCacheInvalidator {
    pub fn new(http: reqwest::Client, url: Option<String>) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl CacheInvalidator for HttpCacheInvalidator {
    async fn invalidate(&self, trigger: &InvalidationTrigger) -> anyhow::Result<()> {
        let Some(url) = &self.url else {
            debug!("No revalidation endpoint configured; skipping invalidation");
            return Ok(());
        };
        self.http
            .post(url)
            .json(&serde_json::json!({ "tag": trigger.tag() }))
            .send()
            .await?
            .error_for_status()?;
        debug!(tag = %trigger.tag(), "Cache invalidation sent");
        Ok(())
    }
}

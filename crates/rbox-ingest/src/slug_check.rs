//! Debounced duplicate-slug checking.
//!
//! Every metadata edit resets a debounce timer; only the cycle that still
//! holds the latest request token when the timer elapses derives the slug
//! and issues one existence query. A response is applied only if its token
//! is still the latest issued. Requests win by issue order, not completion
//! order, so a slow stale "available" can never overwrite a fresh
//! "duplicate".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use rbox_catalog::{CatalogClient, CatalogResult};
use rbox_models::derive_slug;

/// Default quiet period before a check fires.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// UI-facing status of the duplicate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugStatus {
    /// No slug to check yet (empty fields)
    Idle,
    /// A query is in flight
    Checking,
    /// The slug is free
    Available { slug: String },
    /// The slug is taken; the user must edit the metadata
    Duplicate { slug: String },
    /// The existence query failed; submission stays blocked
    CheckFailed { slug: String },
}

impl SlugStatus {
    /// Submission is allowed only on a confirmed `Available`.
    pub fn blocks_submission(&self) -> bool {
        !matches!(self, SlugStatus::Available { .. })
    }
}

/// Existence lookup against the catalog collaborator.
#[async_trait]
pub trait CatalogLookup: Send + Sync + 'static {
    async fn ring_exists(&self, slug: &str) -> CatalogResult<bool>;
}

#[async_trait]
impl CatalogLookup for CatalogClient {
    async fn ring_exists(&self, slug: &str) -> CatalogResult<bool> {
        CatalogClient::ring_exists(self, slug).await
    }
}

/// Debounced, race-safe duplicate checker.
pub struct SlugChecker<L: CatalogLookup> {
    lookup: Arc<L>,
    status: Arc<watch::Sender<SlugStatus>>,
    latest_token: Arc<AtomicU64>,
    debounce: Duration,
}

impl<L: CatalogLookup> SlugChecker<L> {
    pub fn new(lookup: Arc<L>, debounce: Duration) -> Self {
        let (tx, _) = watch::channel(SlugStatus::Idle);
        Self {
            lookup,
            status: Arc::new(tx),
            latest_token: Arc::new(AtomicU64::new(0)),
            debounce,
        }
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<SlugStatus> {
        self.status.subscribe()
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> SlugStatus {
        self.status.borrow().clone()
    }

    /// Report an edit to any of the three slug input fields.
    ///
    /// Returns the spawned debounce task; callers may ignore it (the UI
    /// does) or await it in tests.
    pub fn on_metadata_changed(
        &self,
        media_title: &str,
        ring_title: &str,
        variant_label: &str,
    ) -> JoinHandle<()> {
        let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
        let media = media_title.to_string();
        let ring = ring_title.to_string();
        let variant = variant_label.to_string();
        let lookup = Arc::clone(&self.lookup);
        let status = Arc::clone(&self.status);
        let latest = Arc::clone(&self.latest_token);
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // A newer edit restarted the cycle while we waited.
            if latest.load(Ordering::SeqCst) != token {
                return;
            }

            let slug = derive_slug(&media, &ring, &variant);
            if slug.is_empty() {
                status.send_replace(SlugStatus::Idle);
                return;
            }

            debug!(slug = %slug, token = token, "Checking slug availability");
            status.send_replace(SlugStatus::Checking);

            let result = lookup.ring_exists(&slug).await;

            // Apply only if we are still the latest issued request; a newer
            // cycle owns the status now regardless of who resolved first.
            if latest.load(Ordering::SeqCst) != token {
                debug!(slug = %slug, token = token, "Discarding stale slug check result");
                return;
            }

            let next = match result {
                Ok(true) => SlugStatus::Duplicate { slug },
                Ok(false) => SlugStatus::Available { slug },
                Err(e) => {
                    warn!(slug = %slug, error = %e, "Slug existence check failed");
                    SlugStatus::CheckFailed { slug }
                }
            };
            status.send_replace(next);
        })
    }
}

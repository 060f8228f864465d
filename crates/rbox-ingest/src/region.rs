//! Reactive region model.
//!
//! Wraps the pure [`Region`] in a watch channel so the waveform UI can
//! subscribe to edits without the model knowing anything about rendering.
//! Every mutation clamps into a valid state; none can fail mid-drag.

use tokio::sync::watch;

use rbox_models::Region;

/// The single source of truth for the current trim window.
#[derive(Debug)]
pub struct RegionModel {
    duration: f64,
    tx: watch::Sender<Region>,
}

impl RegionModel {
    /// Initialize for a newly loaded source: a default-length window
    /// auto-centered in the track. Called once per source.
    pub fn new(duration: f64) -> Self {
        let (tx, _) = watch::channel(Region::centered(duration));
        Self { duration, tx }
    }

    /// Subscribe to region changes. The receiver sees every committed edit.
    pub fn subscribe(&self) -> watch::Receiver<Region> {
        self.tx.subscribe()
    }

    /// Snapshot of the current region.
    pub fn current(&self) -> Region {
        *self.tx.borrow()
    }

    /// Source duration this model was initialized with.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_start(&self, t: f64) {
        let duration = self.duration;
        self.tx.send_modify(|r| r.set_start(t, duration));
    }

    pub fn set_end(&self, t: f64) {
        let duration = self.duration;
        self.tx.send_modify(|r| r.set_end(t, duration));
    }

    /// Atomic two-edge update for numeric entry; subscribers observe a
    /// single change, never a transient half-applied window.
    pub fn set_both(&self, start: f64, end: f64) {
        let duration = self.duration;
        self.tx.send_modify(|r| r.set_both(start, end, duration));
    }

    pub fn toggle_fade_in(&self) {
        self.tx.send_modify(|r| r.toggle_fade_in());
    }

    pub fn toggle_fade_out(&self) {
        self.tx.send_modify(|r| r.toggle_fade_out());
    }
}

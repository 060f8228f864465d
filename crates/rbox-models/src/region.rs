//! Trim region value type.
//!
//! A region is the user-selected `[start, end]` sub-range of the source
//! audio plus the fade flags. Every mutation clamps into a valid state and
//! none can fail: the invariant `0 <= start < end <= duration` and the
//! minimum window length hold after any edit, with the most recent gesture
//! winning (the *unmoved* edge is pushed rather than the edit rejected).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum window length in seconds, shared by every region editor.
pub const MIN_DURATION_SECS: f64 = 10.0;

/// Default window length used when a new source is loaded.
pub const DEFAULT_DURATION_SECS: f64 = 30.0;

/// Linear fade length in seconds, before clamping to half the window.
pub const FADE_SECS: f64 = 2.0;

/// The current trim window and fade flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    /// Window start, seconds from the beginning of the source
    pub start: f64,
    /// Window end, seconds from the beginning of the source
    pub end: f64,
    /// Apply a linear fade-in at the window start
    pub fade_in: bool,
    /// Apply a linear fade-out ending at the window end
    pub fade_out: bool,
}

impl Region {
    /// Default-length window centered in the track.
    ///
    /// Tracks shorter than the default get the full track; tracks shorter
    /// than the minimum still get `[0, duration]` rather than an error.
    pub fn centered(duration: f64) -> Self {
        let duration = duration.max(0.0);
        let window = DEFAULT_DURATION_SECS.min(duration);
        let start = (duration - window) / 2.0;
        Self {
            start,
            end: start + window,
            fade_in: false,
            fade_out: false,
        }
    }

    /// Window length in seconds.
    pub fn window_secs(&self) -> f64 {
        self.end - self.start
    }

    /// Fade length, clamped to never exceed half the window.
    pub fn fade_secs(&self) -> f64 {
        FADE_SECS.min(self.window_secs() / 2.0)
    }

    /// Move the start edge. The end edge is pushed when the window would
    /// drop below the minimum.
    pub fn set_start(&mut self, t: f64, duration: f64) {
        if duration <= MIN_DURATION_SECS {
            self.clamp_to_full(duration);
            return;
        }

        self.start = t.clamp(0.0, duration);
        if self.end - self.start < MIN_DURATION_SECS {
            self.end = (self.start + MIN_DURATION_SECS).min(duration);
            // Start hit the right edge of the track; give back the minimum.
            if self.end - self.start < MIN_DURATION_SECS {
                self.start = self.end - MIN_DURATION_SECS;
            }
        }
        self.end = self.end.min(duration);
    }

    /// Move the end edge. The start edge is pushed when the window would
    /// drop below the minimum.
    pub fn set_end(&mut self, t: f64, duration: f64) {
        if duration <= MIN_DURATION_SECS {
            self.clamp_to_full(duration);
            return;
        }

        self.end = t.clamp(0.0, duration);
        if self.end - self.start < MIN_DURATION_SECS {
            self.start = (self.end - MIN_DURATION_SECS).max(0.0);
            if self.end - self.start < MIN_DURATION_SECS {
                self.end = self.start + MIN_DURATION_SECS;
            }
        }
        self.start = self.start.max(0.0);
    }

    /// Atomic two-edge update for numeric entry. Applies the same clamping
    /// as the single-edge setters without an observable intermediate state;
    /// the start edge is the anchor when the pair is too short.
    pub fn set_both(&mut self, start: f64, end: f64, duration: f64) {
        if duration <= MIN_DURATION_SECS {
            self.clamp_to_full(duration);
            return;
        }

        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        self.start = lo.clamp(0.0, duration);
        self.end = hi.clamp(0.0, duration);
        if self.end - self.start < MIN_DURATION_SECS {
            self.end = (self.start + MIN_DURATION_SECS).min(duration);
            if self.end - self.start < MIN_DURATION_SECS {
                self.start = self.end - MIN_DURATION_SECS;
            }
        }
    }

    pub fn toggle_fade_in(&mut self) {
        self.fade_in = !self.fade_in;
    }

    pub fn toggle_fade_out(&mut self) {
        self.fade_out = !self.fade_out;
    }

    fn clamp_to_full(&mut self, duration: f64) {
        self.start = 0.0;
        self.end = duration.max(0.0);
    }
}

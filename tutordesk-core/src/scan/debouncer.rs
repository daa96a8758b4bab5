//! Scan debouncing
//!
//! A decoder running against a live camera feed reports the same badge
//! several times per second while it stays in frame. The debouncer gates
//! the stream so each raw text is processed at most once per window.

use chrono::{DateTime, Duration, Utc};

/// Repeat-suppression gate for raw scan text
///
/// A cool-down window starts when a text is accepted. While the window is
/// open an identical text is rejected; a differing text is always
/// accepted and replaces the stored text (a new student's badge may
/// interrupt the previous one's feedback). When the window expires the
/// stored text is cleared so the same code can be re-accepted, e.g. when
/// re-scanning after correcting a prior error.
#[derive(Debug)]
pub struct ScanDebouncer {
    last_text: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    window: Duration,
}

impl ScanDebouncer {
    /// Create a debouncer with the given cool-down window
    pub fn new(window: Duration) -> Self {
        Self {
            last_text: None,
            expires_at: None,
            window,
        }
    }

    /// Decide whether `raw_text` should be processed at `now`
    ///
    /// Returns `false` only for a repeat of the most-recently-accepted
    /// text inside the open window.
    pub fn accept(&mut self, raw_text: &str, now: DateTime<Utc>) -> bool {
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                self.last_text = None;
                self.expires_at = None;
            }
        }

        if self.last_text.as_deref() == Some(raw_text) {
            return false;
        }

        self.last_text = Some(raw_text.to_string());
        self.expires_at = Some(now + self.window);
        true
    }

    /// Most-recently-accepted raw text, if the window is still tracked
    pub fn last_text(&self) -> Option<&str> {
        self.last_text.as_deref()
    }
}

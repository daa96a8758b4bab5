//! # Tutordesk Engagement Core
//!
//! The engagement-processing core of the Tutordesk dashboard:
//!
//! - `scan` — live badge-scan pipeline: raw decoded text is debounced,
//!   matched against the roster, and resolved into at-most-once
//!   attendance events with timed audio/visual feedback.
//! - `report` — sequential report composition and delivery: a resumable
//!   recipient queue drives per-recipient content generation, operator
//!   review, fire-and-forget delivery, and per-recipient delivery state.
//! - `services` — seams to the external collaborators (roster, activity
//!   log, text generation, delivery gateway, audio feedback).
//! - `db` — SQLite implementations of the collaborator stores for the
//!   dashboard to embed.
//!
//! The core is an in-process module: it exposes events and state
//! snapshots on the shared [`EventBus`](tutordesk_common::events::EventBus)
//! rather than a transport format.

pub mod db;
pub mod error;
pub mod report;
pub mod scan;
pub mod services;

pub use error::{Error, Result};

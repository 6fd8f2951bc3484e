//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use cleevio_tempo_cli::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, TempoError};

// Tracking
pub use crate::tracking::reconcile::{Phase, PullOutcome, ReconcileState};
pub use crate::tracking::session::{Interval, SessionId, SessionList, TrackingSession};
pub use crate::tracking::timecode::{
    compute_elapsed, decode_offset, encode_offset, format_duration, parse_manual_duration,
};

// Collaborators
pub use crate::api::{IssueRef, IssueSummary, IssueTracker, SessionPatch, TimeTracker};

// Logging
pub use crate::logger::jsonl::{ActivityLog, EventType, LogEntry};

// Interactive list
pub use crate::tui::keys::{KeyEvent, decode};
pub use crate::tui::model::{AppModel, Cmd, Msg};

//! Tracker domain: entities, time arithmetic and server reconciliation.

pub mod reconcile;
pub mod session;
pub mod timecode;

pub use reconcile::{Phase, PullOutcome, PullRequest, ReconcileState};
pub use session::{Interval, SessionId, SessionList, TrackingSession};

//! Merge of polled server state into the locally displayed tracker list.
//!
//! The runtime pulls the full tracker list on a timer while the user keeps
//! editing. Each pull is stamped with a generation when it is issued; a
//! response is applied only if it is newer than the last applied one.
//!
//! Local mutations made while a pull is in flight are remembered with the
//! generation that was outstanding at the time. A pull issued before the
//! mutation cannot have seen it, so for those ids the local copy (or local
//! deletion) wins. Once a newer pull lands, the marker is discarded and the
//! server is authoritative again.

use std::collections::HashMap;

use super::session::{SessionId, SessionList, TrackingSession};
use crate::core::errors::Result;

/// Whether the list has been populated by a successful pull yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No pull has succeeded yet.
    #[default]
    Loading,
    /// At least one pull has been applied.
    Synced,
}

/// A pull the runtime must perform, stamped with its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequest {
    /// Monotonically increasing stamp returned with the response.
    pub generation: u64,
}

/// What happened to a pull response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The list was replaced; carries the new tracker count.
    Applied(usize),
    /// The pull failed; the previous list is retained.
    Failed,
    /// A newer response was already applied.
    Stale,
}

/// Tracker list plus selection, reconciled against periodic pulls.
#[derive(Debug, Clone, Default)]
pub struct ReconcileState {
    phase: Phase,
    error: bool,
    sessions: SessionList,
    selected: usize,
    issued_generation: u64,
    applied_generation: u64,
    touched: HashMap<SessionId, u64>,
    tombstones: HashMap<SessionId, u64>,
}

impl ReconcileState {
    /// Fresh state in the loading phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the loading phase and request the first pull immediately.
    pub fn start(&mut self) -> PullRequest {
        self.phase = Phase::Loading;
        self.error = false;
        PullRequest {
            generation: self.begin_pull(),
        }
    }

    /// Stamp a new pull. Generations start at 1 and never repeat.
    pub fn begin_pull(&mut self) -> u64 {
        self.issued_generation += 1;
        self.issued_generation
    }

    /// Apply the response to the pull stamped `generation`.
    ///
    /// The selection follows the selected tracker by id, falls back to the
    /// same index clamped to the new-timer row, and stays on the new-timer
    /// row once the list has loaded.
    pub fn apply_pull(
        &mut self,
        generation: u64,
        result: Result<Vec<TrackingSession>>,
    ) -> PullOutcome {
        if generation <= self.applied_generation {
            return PullOutcome::Stale;
        }

        let remote = match result {
            Ok(remote) => remote,
            Err(_) => {
                self.error = true;
                return PullOutcome::Failed;
            }
        };
        self.applied_generation = generation;

        // Markers from before this pull was issued are settled by it.
        self.touched.retain(|_, stamp| *stamp >= generation);
        self.tombstones.retain(|_, stamp| *stamp >= generation);

        let selected_id = self.selected_id();
        let stay_on_new_row = self.phase == Phase::Synced && self.is_new_row_selected();
        let mut merged: Vec<TrackingSession> = remote
            .into_iter()
            .filter(|session| !self.tombstones.contains_key(&session.id))
            .map(|session| {
                if self.touched.contains_key(&session.id) {
                    self.sessions.find(&session.id).cloned().unwrap_or(session)
                } else {
                    session
                }
            })
            .collect();

        // Locally created trackers the pull could not have seen yet, in list
        // order so ties on `created_date` keep their current rows.
        for local in self.sessions.iter() {
            if self.touched.contains_key(&local.id)
                && !merged.iter().any(|session| session.id == local.id)
            {
                merged.push(local.clone());
            }
        }

        self.sessions = SessionList::from_unsorted(merged);
        self.phase = Phase::Synced;
        self.error = false;
        if stay_on_new_row {
            self.selected = self.sessions.len();
        } else {
            self.reselect(selected_id.as_ref());
        }
        PullOutcome::Applied(self.sessions.len())
    }

    /// Replace a tracker with the server's reply to a toggle or update.
    ///
    /// Returns `false` without touching anything when the tracker is no longer
    /// listed, which covers replies arriving after a local delete.
    pub fn upsert(&mut self, session: TrackingSession) -> bool {
        if !self.sessions.contains(&session.id) {
            return false;
        }
        let selected_id = self.selected_id();
        self.touched.insert(session.id.clone(), self.issued_generation);
        self.sessions.replace(session);
        self.reselect(selected_id.as_ref());
        true
    }

    /// Add a freshly created tracker.
    ///
    /// Created from the new-timer row, the new tracker becomes selected;
    /// otherwise the selection stays on the same tracker.
    pub fn insert(&mut self, session: TrackingSession) {
        let id = session.id.clone();
        let selected_id = if self.is_new_row_selected() {
            Some(id.clone())
        } else {
            self.selected_id()
        };
        self.tombstones.remove(&id);
        self.touched.insert(id, self.issued_generation);
        self.sessions.push(session);
        self.reselect(selected_id.as_ref());
    }

    /// Drop a tracker after a successful delete.
    ///
    /// The selection moves up by one, stopping at the first row.
    pub fn remove(&mut self, id: &SessionId) -> Option<TrackingSession> {
        self.tombstones.insert(id.clone(), self.issued_generation);
        self.touched.remove(id);
        let removed = self.sessions.remove(id)?;
        self.selected = self.selected.saturating_sub(1).min(self.sessions.len());
        Some(removed)
    }

    /// Move the selection by `delta` rows within `0..=len`.
    pub fn move_selection(&mut self, delta: isize) {
        self.selected = self
            .selected
            .saturating_add_signed(delta)
            .min(self.sessions.len());
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.sessions.len());
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the most recent pull failed.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error
    }

    #[must_use]
    pub const fn sessions(&self) -> &SessionList {
        &self.sessions
    }

    /// Selected row; `sessions().len()` is the new-timer row.
    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn is_new_row_selected(&self) -> bool {
        self.selected == self.sessions.len()
    }

    #[must_use]
    pub fn selected_session(&self) -> Option<&TrackingSession> {
        self.sessions.get(self.selected)
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<SessionId> {
        self.selected_session().map(|session| session.id.clone())
    }

    #[must_use]
    pub const fn last_pull_generation(&self) -> u64 {
        self.applied_generation
    }

    fn reselect(&mut self, previous: Option<&SessionId>) {
        self.selected = previous
            .and_then(|id| self.sessions.position(id))
            .unwrap_or_else(|| self.selected.min(self.sessions.len()));
    }
}

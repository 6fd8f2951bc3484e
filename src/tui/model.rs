//! Elm-style state model for the interactive tracker list.
//!
//! All display state lives in [`AppModel`]. Key presses, clock ticks and
//! collaborator replies arrive as [`Msg`] values; network work is described by
//! [`Cmd`] values returned from [`super::update::update`]. Nothing in this
//! module or in `update` performs I/O.

#![allow(missing_docs)]

use std::collections::HashMap;

use super::focus::{FocusContext, FocusLock, FocusTarget, Row, lock_for_focus};
use super::keys::KeyEvent;
use super::picker::{IssuePicker, SearchRequest};
use super::widgets::TextField;
use crate::api::{IssueRef, IssueSummary, SessionPatch, WorklogReceipt};
use crate::core::config::{APP_ID, Config};
use crate::core::errors::Result;
use crate::tracking::reconcile::ReconcileState;
use crate::tracking::session::{SessionId, SessionList, TrackingSession};

// ──────────────────── settings ────────────────────

/// The parts of [`Config`] the model needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub jira_base_url: String,
    pub search_limit: usize,
    pub set_title: bool,
}

impl ModelSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            jira_base_url: config.jira.base_url.clone(),
            search_limit: config.ui.search_limit,
            set_title: config.ui.set_title,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ──────────────────── busy markers ────────────────────

/// An operation in flight for one tracker. The column shows `label` and
/// activation is ignored until the reply arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy {
    pub row: Row,
    pub label: &'static str,
}

impl Busy {
    #[must_use]
    pub const fn new(row: Row, label: &'static str) -> Self {
        Self { row, label }
    }
}

/// Focus identity that survives re-sorting: tracker id plus column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusKey {
    Session(SessionId, Row),
    NewTimer,
}

// ──────────────────── model ────────────────────

#[derive(Debug, Clone)]
pub struct AppModel {
    pub tracking: ReconcileState,
    /// Focused column, shared by every tracker row.
    pub row: Row,
    pub lock: FocusLock,
    pub time_field: TextField,
    pub issue_field: TextField,
    pub new_field: TextField,
    /// Suggestions for the focused issue column or the new-timer row.
    pub picker: Option<IssuePicker>,
    /// The new-timer suggestion list has focus.
    pub new_list_focused: bool,
    /// A tracker is being created from the new-timer row.
    pub creating: bool,
    pub busy: HashMap<SessionId, Busy>,
    /// Wall clock used for running intervals, Unix milliseconds.
    pub now_ms: i64,
    /// Last failure shown under the list; cleared by the next key press.
    pub notice: Option<String>,
    pub quit: bool,
    pub settings: ModelSettings,
    pub(crate) focus_key: Option<FocusKey>,
    pub(crate) title: Option<String>,
}

impl AppModel {
    #[must_use]
    pub fn new(settings: ModelSettings, now_ms: i64) -> Self {
        Self {
            tracking: ReconcileState::new(),
            row: Row::default(),
            lock: FocusLock::default(),
            time_field: TextField::new(),
            issue_field: TextField::new(),
            new_field: TextField::new(),
            picker: None,
            new_list_focused: false,
            creating: false,
            busy: HashMap::new(),
            now_ms,
            notice: None,
            quit: false,
            settings,
            focus_key: None,
            title: None,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionList {
        self.tracking.sessions()
    }

    #[must_use]
    pub fn selected_session(&self) -> Option<&TrackingSession> {
        self.tracking.selected_session()
    }

    #[must_use]
    pub fn busy_for(&self, id: &SessionId) -> Option<Busy> {
        self.busy.get(id).copied()
    }

    #[must_use]
    pub fn focus_target(&self) -> FocusTarget {
        if self.tracking.is_new_row_selected() {
            FocusTarget::NewTimer {
                list: self.new_list_focused,
            }
        } else {
            FocusTarget::Session {
                index: self.tracking.selected(),
                row: self.row,
            }
        }
    }

    #[must_use]
    pub fn focus_key(&self) -> FocusKey {
        match self.selected_session() {
            Some(session) => FocusKey::Session(session.id.clone(), self.row),
            None => FocusKey::NewTimer,
        }
    }

    /// The text field owning keyboard input, if any.
    #[must_use]
    pub fn focused_field(&self) -> Option<&TextField> {
        match self.focus_target() {
            FocusTarget::NewTimer { .. } => Some(&self.new_field),
            FocusTarget::Session {
                row: Row::SelectTime,
                ..
            } => Some(&self.time_field),
            FocusTarget::Session {
                row: Row::ChangeIssue,
                ..
            } => Some(&self.issue_field),
            FocusTarget::Session { .. } => None,
        }
    }

    pub fn focused_field_mut(&mut self) -> Option<&mut TextField> {
        match self.focus_target() {
            FocusTarget::NewTimer { .. } => Some(&mut self.new_field),
            FocusTarget::Session {
                row: Row::SelectTime,
                ..
            } => Some(&mut self.time_field),
            FocusTarget::Session {
                row: Row::ChangeIssue,
                ..
            } => Some(&mut self.issue_field),
            FocusTarget::Session { .. } => None,
        }
    }

    /// Whether suggestions are shown for the focused issue column.
    #[must_use]
    pub fn issue_suggestions_open(&self) -> bool {
        self.row == Row::ChangeIssue
            && self.selected_session().is_some_and(|session| {
                self.issue_field.has_text() || !session.has_issue()
            })
    }

    /// Recompute the lock from the current focus.
    pub fn refresh_lock(&mut self) {
        let context = FocusContext {
            target: self.focus_target(),
            has_issue: self
                .selected_session()
                .is_some_and(TrackingSession::has_issue),
            has_text: self.focused_field().is_some_and(TextField::has_text),
        };
        self.lock.set_lock(lock_for_focus(context));
    }
}

/// Terminal title summarizing running trackers.
///
/// Up to three issue keys when every running tracker has one, otherwise a
/// count; the bare app name when nothing runs.
#[must_use]
pub fn title_for(sessions: &SessionList) -> String {
    let running: Vec<&TrackingSession> = sessions.playing().collect();
    if running.is_empty() {
        return APP_ID.to_string();
    }
    let keys: Option<Vec<&str>> = running
        .iter()
        .map(|session| session.issue_key.as_deref().filter(|key| !key.is_empty()))
        .collect();
    match keys {
        Some(keys) if keys.len() <= 3 => format!("{} | {APP_ID}", keys.join(", ")),
        _ => format!("{} running | {APP_ID}", running.len()),
    }
}

// ──────────────────── messages ────────────────────

/// Why a toggle was requested; logging chains into a worklog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TogglePurpose {
    Play,
    Log,
}

/// Everything that can change the model.
#[derive(Debug)]
pub enum Msg {
    /// One decoded key press.
    Key(KeyEvent),
    /// Clock refresh for running timers.
    Clock { now_ms: i64 },
    /// The periodic pull timer fired.
    PullDue,
    Pulled {
        generation: u64,
        result: Result<Vec<TrackingSession>>,
    },
    Toggled {
        id: SessionId,
        purpose: TogglePurpose,
        result: Result<TrackingSession>,
    },
    Updated {
        id: SessionId,
        row: Row,
        result: Result<TrackingSession>,
    },
    Created {
        result: Result<TrackingSession>,
    },
    Logged {
        id: SessionId,
        result: Result<WorklogReceipt>,
    },
    Deleted {
        id: SessionId,
        result: Result<()>,
    },
    SearchResults {
        request: SearchRequest,
        result: Result<Vec<IssueSummary>>,
    },
    /// A termination signal arrived.
    Shutdown,
}

// ──────────────────── commands ────────────────────

/// Side effects for the runtime. Network commands run on worker threads and
/// answer with the matching [`Msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    None,
    Batch(Vec<Self>),
    Pull { generation: u64 },
    Toggle { id: SessionId, purpose: TogglePurpose },
    Update {
        id: SessionId,
        row: Row,
        patch: SessionPatch,
    },
    Create { issue: Option<IssueRef> },
    Delete { id: SessionId },
    LogTime {
        id: SessionId,
        issue_key: String,
        seconds: u64,
    },
    Search(SearchRequest),
    OpenBrowser { url: String },
    SetTitle(String),
    Quit,
}

impl Cmd {
    /// Combine commands, dropping `None` and unwrapping single entries.
    #[must_use]
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut flat: Vec<Self> = Vec::with_capacity(cmds.len());
        for cmd in cmds {
            match cmd {
                Self::None => {}
                Self::Batch(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::None,
            1 => flat.pop().unwrap_or(Self::None),
            _ => Self::Batch(flat),
        }
    }

    /// Flatten into a list of leaf commands.
    #[must_use]
    pub fn into_vec(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::into_vec).collect(),
            other => vec![other],
        }
    }
}

//! Tracker entities as returned by Tempo, and the ordered list shown on screen.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::timecode::{compute_elapsed, parse_timestamp};

// ──────────────────── identifiers ────────────────────

/// Server-assigned tracker id. Tempo has sent both strings and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Number(number) => Self(number.to_string()),
        })
    }
}

// ──────────────────── entities ────────────────────

/// One contiguous start/end span. A missing end means the span is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// One Tempo tracker: a work period spanning one or more intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    pub id: SessionId,
    #[serde(default)]
    pub issue_key: Option<String>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub created_date: String,
    #[serde(default, rename = "time", with = "tracker_time")]
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TrackingSession {
    /// Tracked milliseconds at `now_ms`, including the description offset.
    #[must_use]
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        compute_elapsed(&self.intervals, self.description.as_deref(), now_ms)
    }

    /// Creation time used for ordering; unparseable dates sort first.
    #[must_use]
    pub fn created_at_ms(&self) -> i64 {
        parse_timestamp(&self.created_date).unwrap_or(0)
    }

    #[must_use]
    pub fn has_issue(&self) -> bool {
        self.issue_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

/// Tempo nests intervals as `"time": { "trackerDuration": [...] }`.
mod tracker_time {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Interval;

    #[derive(Serialize, Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    struct TrackerTime {
        #[serde(default)]
        tracker_duration: Vec<Interval>,
    }

    pub fn serialize<S: Serializer>(intervals: &[Interval], serializer: S) -> Result<S::Ok, S::Error> {
        TrackerTime {
            tracker_duration: intervals.to_vec(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Interval>, D::Error> {
        let time = Option::<TrackerTime>::deserialize(deserializer)?;
        Ok(time.unwrap_or_default().tracker_duration)
    }
}

// ──────────────────── ordered list ────────────────────

/// Trackers ordered by creation time, ties kept in prior relative order.
///
/// Every mutation re-sorts, so the ordering holds after any update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionList {
    sessions: Vec<TrackingSession>,
}

impl SessionList {
    /// Build a list from arbitrary input, dropping later duplicate ids.
    #[must_use]
    pub fn from_unsorted(sessions: Vec<TrackingSession>) -> Self {
        let mut seen = HashSet::new();
        let mut list = Self {
            sessions: sessions
                .into_iter()
                .filter(|session| seen.insert(session.id.clone()))
                .collect(),
        };
        list.resort();
        list
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TrackingSession> {
        self.sessions.get(index)
    }

    #[must_use]
    pub fn find(&self, id: &SessionId) -> Option<&TrackingSession> {
        self.sessions.iter().find(|session| &session.id == id)
    }

    #[must_use]
    pub fn position(&self, id: &SessionId) -> Option<usize> {
        self.sessions.iter().position(|session| &session.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.position(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackingSession> {
        self.sessions.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[TrackingSession] {
        &self.sessions
    }

    /// Replace the tracker with the same id. Returns `false` when it is gone.
    pub fn replace(&mut self, session: TrackingSession) -> bool {
        let Some(index) = self.position(&session.id) else {
            return false;
        };
        self.sessions[index] = session;
        self.resort();
        true
    }

    /// Append a tracker (or replace an existing one with the same id).
    pub fn push(&mut self, session: TrackingSession) {
        if let Some(index) = self.position(&session.id) {
            self.sessions[index] = session;
        } else {
            self.sessions.push(session);
        }
        self.resort();
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<TrackingSession> {
        let index = self.position(id)?;
        let removed = self.sessions.remove(index);
        self.resort();
        Some(removed)
    }

    /// Trackers whose timer is currently running.
    pub fn playing(&self) -> impl Iterator<Item = &TrackingSession> {
        self.sessions.iter().filter(|session| session.is_playing)
    }

    fn resort(&mut self) {
        // `sort_by_key` is stable, which keeps ties in prior relative order.
        self.sessions.sort_by_key(TrackingSession::created_at_ms);
    }
}

impl IntoIterator for SessionList {
    type Item = TrackingSession;
    type IntoIter = std::vec::IntoIter<TrackingSession>;

    fn into_iter(self) -> Self::IntoIter {
        self.sessions.into_iter()
    }
}

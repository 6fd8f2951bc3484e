//! Scenario tests: key presses through `update`, commands through the
//! collaborator layer, replies back into the model.
//!
//! Commands run synchronously against [`FakeServices`] so each scenario is
//! deterministic. `hold_pulls` parks pulls to model a slow list request.

use super::focus::Row;
use super::keys::{KeyEvent, decode};
use super::model::{AppModel, Cmd, ModelSettings, Msg};
use super::runtime::perform;
use super::update::{init, update};
use crate::api::IssueSummary;
use crate::api::fake::FakeServices;
use crate::logger::jsonl::ActivityLog;
use crate::tracking::session::SessionId;
use crate::tracking::session::fixtures::{running, session};
use crate::tracking::timecode::parse_timestamp;

const UP: &[u8] = b"\x1b[A";
const DOWN: &[u8] = b"\x1b[B";
const RIGHT: &[u8] = b"\x1b[C";
const LEFT: &[u8] = b"\x1b[D";
const ENTER: &[u8] = b"\r";

struct Harness {
    model: AppModel,
    services: FakeServices,
    log: ActivityLog,
    held: Vec<Cmd>,
    hold_pulls: bool,
    local: Vec<Cmd>,
}

impl Harness {
    fn new(services: FakeServices) -> Self {
        let now = parse_timestamp("2024-03-01T12:00:00.000").unwrap();
        let mut harness = Self {
            model: AppModel::new(ModelSettings::default(), now),
            services,
            log: ActivityLog::discard(),
            held: Vec::new(),
            hold_pulls: false,
            local: Vec::new(),
        };
        let cmd = init(&mut harness.model);
        harness.run(cmd);
        harness
    }

    fn run(&mut self, cmd: Cmd) {
        let mut queue = cmd.into_vec();
        while !queue.is_empty() {
            let cmd = queue.remove(0);
            if self.hold_pulls && matches!(cmd, Cmd::Pull { .. }) {
                self.held.push(cmd);
                continue;
            }
            match perform(cmd.clone(), &self.services, &self.services, &self.log) {
                Some(msg) => queue.extend(update(&mut self.model, msg).into_vec()),
                None => self.local.push(cmd),
            }
        }
    }

    fn send(&mut self, msg: Msg) {
        let cmd = update(&mut self.model, msg);
        self.run(cmd);
    }

    fn key(&mut self, bytes: &[u8]) {
        self.send(Msg::Key(decode(bytes)));
    }

    fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.send(Msg::Key(KeyEvent::text(&ch.to_string())));
        }
    }

    fn pull(&mut self) {
        self.send(Msg::PullDue);
    }

    fn release_held(&mut self) {
        self.hold_pulls = false;
        let held = std::mem::take(&mut self.held);
        self.run(Cmd::batch(held));
    }

    fn ids(&self) -> Vec<String> {
        self.model
            .sessions()
            .iter()
            .map(|session| session.id.as_str().to_string())
            .collect()
    }
}

fn issue(id: &str, key: &str, title: &str) -> IssueSummary {
    IssueSummary {
        id: id.into(),
        key: key.into(),
        title: title.into(),
    }
}

fn two_trackers() -> FakeServices {
    FakeServices::with_sessions(vec![
        running("a", "2024-03-01T08:00:00.000", Some("ABC-1")),
        session("b", "2024-03-01T09:00:00.000"),
    ])
}

#[test]
fn startup_pulls_and_selects_first_tracker() {
    let harness = Harness::new(two_trackers());
    assert_eq!(harness.ids(), ["a", "b"]);
    assert_eq!(harness.model.tracking.selected(), 0);
    assert_eq!(harness.services.calls("list"), 1);
    assert!(
        harness
            .local
            .contains(&Cmd::SetTitle("ABC-1 | cleevio-tempo-cli".into()))
    );
}

#[test]
fn toggle_round_trip_updates_row_and_title() {
    let mut harness = Harness::new(two_trackers());
    harness.key(ENTER);
    let a = harness.model.sessions().find(&SessionId::new("a")).unwrap();
    assert!(!a.is_playing);
    assert!(harness.model.busy.is_empty());
    assert_eq!(
        harness.local.last(),
        Some(&Cmd::SetTitle("cleevio-tempo-cli".into()))
    );
}

#[test]
fn log_flow_stops_logs_and_deletes() {
    let mut harness = Harness::new(two_trackers());
    harness.key(RIGHT);
    assert_eq!(harness.model.row, Row::Log);
    harness.key(ENTER);

    assert_eq!(harness.services.calls("toggle"), 1);
    assert_eq!(harness.services.calls("log"), 1);
    assert_eq!(harness.services.calls("delete"), 1);
    // 08:00 to the fake's stop time of 12:30.
    assert_eq!(
        harness.services.worklogs.lock().as_slice(),
        [("ABC-1".to_string(), 4 * 3600 + 1800)]
    );
    assert_eq!(harness.ids(), ["b"]);
    assert_eq!(harness.model.tracking.selected(), 0);
}

#[test]
fn manual_time_adjustment_persists_in_description() {
    let mut harness = Harness::new(two_trackers());
    harness.key(LEFT);
    harness.type_text("1h 30m");
    harness.key(ENTER);

    let stored = harness.services.sessions.lock()[0].description.clone();
    assert_eq!(
        stored.as_deref(),
        Some("\ncleevio-tempo-cli:<01:30:00><5400000>\n")
    );
    assert_eq!(harness.model.time_field.value(), "");

    harness.type_text("-30m");
    harness.key(ENTER);
    let stored = harness.services.sessions.lock()[0].description.clone();
    assert_eq!(
        stored.as_deref(),
        Some("\ncleevio-tempo-cli:<01:00:00><3600000>\n")
    );
}

#[test]
fn change_issue_through_suggestions() {
    let mut services = two_trackers();
    services.issues = vec![
        issue("10", "ABC-1", "Login page"),
        issue("11", "ABC-2", "Signup flow"),
    ];
    let mut harness = Harness::new(services);
    let searches = harness.services.calls("search");
    harness.key(DOWN);
    for _ in 0..3 {
        harness.key(RIGHT);
    }
    assert_eq!(harness.model.row, Row::ChangeIssue);
    // No issue yet: the list preloads and claims up/down.
    assert_eq!(harness.services.calls("search"), searches + 1);

    harness.type_text("sign");
    let picker = harness.model.picker.as_ref().unwrap();
    assert_eq!(picker.items().len(), 1);
    harness.key(ENTER);

    let b = harness.model.sessions().find(&SessionId::new("b")).unwrap();
    assert_eq!(b.issue_key.as_deref(), Some("ABC-2"));
    assert_eq!(harness.model.issue_field.value(), "");
    assert_eq!(harness.model.tracking.selected(), 1);
}

#[test]
fn open_issue_in_browser() {
    let mut harness = Harness::new(two_trackers());
    for _ in 0..4 {
        harness.key(RIGHT);
    }
    harness.key(ENTER);
    assert_eq!(
        harness.local.last(),
        Some(&Cmd::OpenBrowser {
            url: "https://cleevio.atlassian.net/browse/ABC-1".into()
        })
    );
}

#[test]
fn create_blank_timer_from_new_row() {
    let mut harness = Harness::new(two_trackers());
    harness.key(DOWN);
    harness.key(DOWN);
    assert!(harness.model.tracking.is_new_row_selected());
    harness.key(ENTER);

    assert_eq!(harness.ids(), ["a", "b", "new-1"]);
    assert_eq!(
        harness.model.tracking.selected_id(),
        Some(SessionId::new("new-1"))
    );
    assert!(!harness.model.creating);
}

#[test]
fn create_timer_for_suggested_issue() {
    let mut services = FakeServices::default();
    services.issues = vec![issue("7", "XYZ-7", "Billing")];
    let mut harness = Harness::new(services);
    assert!(harness.model.tracking.is_new_row_selected());

    harness.key(DOWN);
    assert!(harness.model.new_list_focused);
    harness.key(ENTER);

    assert_eq!(harness.ids(), ["new-1"]);
    let created = &harness.model.sessions().as_slice()[0];
    assert_eq!(created.issue_key.as_deref(), Some("XYZ-7"));
}

#[test]
fn delete_during_slow_pull_is_not_resurrected() {
    let mut harness = Harness::new(two_trackers());
    harness.hold_pulls = true;
    harness.pull();
    assert_eq!(harness.held.len(), 1);

    harness.key(DOWN);
    harness.key(RIGHT);
    harness.key(RIGHT);
    harness.key(ENTER);
    assert_eq!(harness.ids(), ["a"]);

    // The fake already deleted "b", so re-add it to mimic a snapshot taken
    // before the delete landed.
    harness
        .services
        .sessions
        .lock()
        .push(session("b", "2024-03-01T09:00:00.000"));
    harness.release_held();
    assert_eq!(harness.ids(), ["a"]);

    harness.services.sessions.lock().retain(|s| s.id.as_str() != "b");
    harness.pull();
    assert_eq!(harness.ids(), ["a"]);
}

#[test]
fn failed_pull_keeps_list_until_recovery() {
    let mut harness = Harness::new(two_trackers());
    *harness.services.fail_list.lock() = true;
    harness.pull();
    assert!(harness.model.tracking.has_error());
    assert_eq!(harness.ids(), ["a", "b"]);

    *harness.services.fail_list.lock() = false;
    harness.services.sessions.lock().pop();
    harness.pull();
    assert!(!harness.model.tracking.has_error());
    assert_eq!(harness.ids(), ["a"]);
}

#[test]
fn selection_follows_tracker_across_reorder() {
    let mut harness = Harness::new(two_trackers());
    harness.key(DOWN);
    assert_eq!(harness.model.tracking.selected_id(), Some(SessionId::new("b")));

    harness
        .services
        .sessions
        .lock()
        .insert(0, session("early", "2024-03-01T07:00:00.000"));
    harness.pull();
    assert_eq!(harness.ids(), ["early", "a", "b"]);
    assert_eq!(harness.model.tracking.selected_id(), Some(SessionId::new("b")));
}

#[test]
fn typing_locks_navigation_until_cleared() {
    let mut harness = Harness::new(two_trackers());
    harness.key(LEFT);
    harness.type_text("5");
    harness.key(DOWN);
    harness.key(UP);
    assert_eq!(harness.model.tracking.selected(), 0);
    assert_eq!(harness.model.row, Row::SelectTime);

    harness.key(b"\x1b");
    harness.key(DOWN);
    assert_eq!(harness.model.tracking.selected(), 1);
}

#[test]
fn failed_delete_surfaces_notice_and_clears_busy() {
    let mut harness = Harness::new(two_trackers());
    harness.services.sessions.lock().clear();
    harness.key(RIGHT);
    harness.key(RIGHT);
    harness.key(ENTER);
    assert!(harness.model.busy.is_empty());
    assert!(
        harness
            .model
            .notice
            .as_deref()
            .is_some_and(|notice| notice.contains("404"))
    );
    assert_eq!(harness.ids(), ["a", "b"]);
}

//! Pure update function for the tracker list.
//!
//! `update()` takes the model and a message, mutates the model, and returns
//! the commands the runtime should execute. It never performs I/O.

#![allow(clippy::too_many_lines)]

use super::focus::Row;
use super::input::{InputAction, InputContext, resolve_key_event};
use super::keys::KeyEvent;
use super::model::{AppModel, Busy, Cmd, FocusKey, Msg, TogglePurpose, title_for};
use super::picker::{IssuePicker, PickerEvent, SearchTarget};
use super::widgets::FieldEvent;
use crate::api::{SessionPatch, browse_url};
use crate::core::errors::TempoError;
use crate::tracking::session::{SessionId, TrackingSession};
use crate::tracking::timecode::{decode_offset, encode_offset, logged_seconds, parse_manual_duration};

const STARTING: &str = "Starting";
const STOPPING: &str = "Stopping";
const SAVING: &str = "Saving";
const LOGGING: &str = "Logging";
const DELETING: &str = "Deleting";

/// Commands for a freshly constructed model: the first pull plus whatever
/// the initial focus needs.
pub fn init(model: &mut AppModel) -> Cmd {
    let generation = model.tracking.start().generation;
    let follow = settle(model);
    Cmd::batch(vec![Cmd::Pull { generation }, follow])
}

/// Apply a message to the model and return the commands it produces.
pub fn update(model: &mut AppModel, msg: Msg) -> Cmd {
    let cmd = match msg {
        Msg::Key(key) => handle_key(model, &key),

        Msg::Clock { now_ms } => {
            model.now_ms = now_ms;
            Cmd::None
        }

        Msg::PullDue => Cmd::Pull {
            generation: model.tracking.begin_pull(),
        },

        Msg::Pulled { generation, result } => {
            model.tracking.apply_pull(generation, result);
            Cmd::None
        }

        Msg::Toggled {
            id,
            purpose,
            result,
        } => match result {
            Ok(session) => on_toggled(model, &id, purpose, session),
            Err(error) => fail(model, &id, &error),
        },

        Msg::Updated { id, row, result } => match result {
            Ok(session) => {
                model.busy.remove(&id);
                let focused = model.focus_key() == FocusKey::Session(id, row);
                if model.tracking.upsert(session) && focused && row == Row::SelectTime {
                    model.time_field.clear();
                }
                Cmd::None
            }
            Err(error) => fail(model, &id, &error),
        },

        Msg::Created { result } => {
            model.creating = false;
            match result {
                Ok(session) => model.tracking.insert(session),
                Err(error) => model.notice = Some(error.to_string()),
            }
            Cmd::None
        }

        Msg::Logged { id, result } => match result {
            Ok(receipt) if receipt.confirmed && model.sessions().contains(&id) => {
                model.busy.insert(id.clone(), Busy::new(Row::Log, DELETING));
                Cmd::Delete { id }
            }
            Ok(_) => {
                model.busy.remove(&id);
                Cmd::None
            }
            Err(error) => fail(model, &id, &error),
        },

        Msg::Deleted { id, result } => match result {
            Ok(()) => {
                model.busy.remove(&id);
                model.tracking.remove(&id);
                Cmd::None
            }
            Err(error) => fail(model, &id, &error),
        },

        Msg::SearchResults { request, result } => {
            if let Some(picker) = model.picker.as_mut() {
                match result {
                    Ok(items) => {
                        picker.apply_results(&request, items);
                    }
                    Err(_) => {
                        picker.search_failed(&request);
                    }
                }
            }
            Cmd::None
        }

        Msg::Shutdown => {
            model.quit = true;
            Cmd::Quit
        }
    };

    let follow = settle(model);
    Cmd::batch(vec![cmd, follow])
}

/// Clear the busy marker for `id` and surface `error`.
fn fail(model: &mut AppModel, id: &SessionId, error: &TempoError) -> Cmd {
    model.busy.remove(id);
    model.notice = Some(error.to_string());
    Cmd::None
}

fn on_toggled(
    model: &mut AppModel,
    id: &SessionId,
    purpose: TogglePurpose,
    session: TrackingSession,
) -> Cmd {
    let seconds = logged_seconds(session.elapsed_ms(model.now_ms));
    let issue_key = session.issue_key.clone().filter(|key| !key.trim().is_empty());
    let present = model.tracking.upsert(session);

    match (purpose, issue_key) {
        (TogglePurpose::Log, Some(issue_key)) if present => {
            model.busy.insert(id.clone(), Busy::new(Row::Log, LOGGING));
            Cmd::LogTime {
                id: id.clone(),
                issue_key,
                seconds,
            }
        }
        _ => {
            model.busy.remove(id);
            Cmd::None
        }
    }
}

/// Post-message housekeeping: focus changes, lock, busy markers and title.
fn settle(model: &mut AppModel) -> Cmd {
    let mut cmds = Vec::new();

    let key = model.focus_key();
    if model.focus_key.as_ref() != Some(&key) {
        cmds.push(on_focus_change(model, &key));
        model.focus_key = Some(key);
    }

    let sessions = model.tracking.sessions();
    model.busy.retain(|id, _| sessions.contains(id));
    model.refresh_lock();

    if model.settings.set_title {
        let title = title_for(model.sessions());
        if model.title.as_ref() != Some(&title) {
            model.title = Some(title.clone());
            cmds.push(Cmd::SetTitle(title));
        }
    }
    Cmd::batch(cmds)
}

/// Reset per-focus widgets and preload suggestions where they show up empty.
fn on_focus_change(model: &mut AppModel, key: &FocusKey) -> Cmd {
    model.time_field.clear();
    model.issue_field.clear();
    model.new_field.clear();
    model.new_list_focused = false;

    let limit = model.settings.search_limit;
    match key {
        FocusKey::Session(id, Row::ChangeIssue) => {
            let mut picker = IssuePicker::new(SearchTarget::Session(id.clone()), limit);
            let preload = model
                .selected_session()
                .is_some_and(|session| !session.has_issue());
            let cmd = if preload {
                Cmd::Search(picker.request())
            } else {
                Cmd::None
            };
            model.picker = Some(picker);
            cmd
        }
        FocusKey::NewTimer => {
            let mut picker = IssuePicker::new(SearchTarget::NewTimer, limit);
            let cmd = Cmd::Search(picker.request());
            model.picker = Some(picker);
            cmd
        }
        FocusKey::Session(..) => {
            model.picker = None;
            Cmd::None
        }
    }
}

// ──────────────────── keys ────────────────────

fn handle_key(model: &mut AppModel, key: &KeyEvent) -> Cmd {
    model.notice = None;

    let context = InputContext {
        lock: model.lock,
        on_new_row: model.tracking.is_new_row_selected(),
    };
    let resolution = resolve_key_event(key, context);
    if let Some(action) = resolution.action {
        let before = model.focus_key();
        let cmd = apply_input_action(model, action);
        if resolution.consumed || model.focus_key() != before {
            return cmd;
        }
    }

    if model.tracking.is_new_row_selected() {
        handle_new_timer_key(model, key)
    } else {
        handle_session_key(model, key)
    }
}

fn apply_input_action(model: &mut AppModel, action: InputAction) -> Cmd {
    match action {
        InputAction::Quit => {
            model.quit = true;
            Cmd::Quit
        }
        InputAction::ClearField => {
            model.new_list_focused = false;
            if let Some(field) = model.focused_field_mut() {
                field.clear();
            }
            sync_picker_query(model)
        }
        InputAction::MoveSelection(delta) => {
            model.tracking.move_selection(delta);
            Cmd::None
        }
        InputAction::MoveColumn(delta) => {
            model.row = if delta < 0 {
                model.row.prev()
            } else {
                model.row.next()
            };
            Cmd::None
        }
    }
}

/// Push the focused field's text into the picker, searching when it changed.
fn sync_picker_query(model: &mut AppModel) -> Cmd {
    let text = model
        .focused_field()
        .map(|field| field.value().to_string())
        .unwrap_or_default();
    let hidden = model.row == Row::ChangeIssue
        && !model.tracking.is_new_row_selected()
        && !model.issue_suggestions_open();
    let Some(picker) = model.picker.as_mut() else {
        return Cmd::None;
    };
    match picker.set_query(&text) {
        Some(request) if !hidden => Cmd::Search(request),
        _ => Cmd::None,
    }
}

fn handle_session_key(model: &mut AppModel, key: &KeyEvent) -> Cmd {
    let Some(session) = model.selected_session().cloned() else {
        return Cmd::None;
    };
    if model.busy.contains_key(&session.id) {
        return Cmd::None;
    }

    match model.row {
        Row::SelectRow if key.is_activate() => {
            let label = if session.is_playing { STOPPING } else { STARTING };
            model
                .busy
                .insert(session.id.clone(), Busy::new(Row::SelectRow, label));
            Cmd::Toggle {
                id: session.id,
                purpose: TogglePurpose::Play,
            }
        }
        Row::SelectTime => match model.time_field.handle(key) {
            FieldEvent::Submit => submit_time(model, &session),
            FieldEvent::Changed | FieldEvent::Moved | FieldEvent::Ignored => Cmd::None,
        },
        Row::Log if key.is_activate() => start_log(model, &session),
        Row::Delete if key.is_activate() => {
            model
                .busy
                .insert(session.id.clone(), Busy::new(Row::Delete, DELETING));
            Cmd::Delete { id: session.id }
        }
        Row::ChangeIssue => handle_issue_key(model, &session, key),
        Row::SelectRow | Row::Log | Row::Delete => Cmd::None,
    }
}

fn submit_time(model: &mut AppModel, session: &TrackingSession) -> Cmd {
    if !model.time_field.has_text() {
        return Cmd::None;
    }
    let input = model.time_field.value().trim().to_string();
    let Some(adjustment) = parse_manual_duration(&input) else {
        model.notice = Some(format!("Cannot read \"{input}\" as a duration"));
        return Cmd::None;
    };

    let current = session.description.as_deref();
    let offset = decode_offset(current).saturating_add(adjustment);
    let description = encode_offset(current, offset);
    if description == session.description {
        model.time_field.clear();
        return Cmd::None;
    }

    model
        .busy
        .insert(session.id.clone(), Busy::new(Row::SelectTime, SAVING));
    Cmd::Update {
        id: session.id.clone(),
        row: Row::SelectTime,
        patch: SessionPatch::description(description),
    }
}

/// Stop the tracker if it runs, log its time, then delete it.
fn start_log(model: &mut AppModel, session: &TrackingSession) -> Cmd {
    let Some(issue_key) = session.issue_key.clone().filter(|key| !key.trim().is_empty()) else {
        return Cmd::None;
    };
    let id = session.id.clone();
    if session.is_playing {
        model.busy.insert(id.clone(), Busy::new(Row::Log, STOPPING));
        return Cmd::Toggle {
            id,
            purpose: TogglePurpose::Log,
        };
    }
    model.busy.insert(id.clone(), Busy::new(Row::Log, LOGGING));
    Cmd::LogTime {
        id,
        issue_key,
        seconds: logged_seconds(session.elapsed_ms(model.now_ms)),
    }
}

fn handle_issue_key(model: &mut AppModel, session: &TrackingSession, key: &KeyEvent) -> Cmd {
    if key.enter
        && !model.issue_field.has_text()
        && let Some(issue_key) = session.issue_key.as_deref().filter(|k| !k.trim().is_empty())
    {
        return Cmd::OpenBrowser {
            url: browse_url(&model.settings.jira_base_url, issue_key),
        };
    }

    let list_key = key.up_arrow || key.down_arrow || key.enter;
    if list_key && model.issue_suggestions_open() {
        let event = model
            .picker
            .as_mut()
            .map_or(PickerEvent::Ignored, |picker| picker.handle(key));
        return match event {
            PickerEvent::Chosen(Some(issue)) => {
                model.issue_field.clear();
                model
                    .busy
                    .insert(session.id.clone(), Busy::new(Row::ChangeIssue, SAVING));
                let update = Cmd::Update {
                    id: session.id.clone(),
                    row: Row::ChangeIssue,
                    patch: SessionPatch::issue(issue.issue_ref()),
                };
                Cmd::batch(vec![update, sync_picker_query(model)])
            }
            PickerEvent::Chosen(None) => {
                model.issue_field.clear();
                sync_picker_query(model)
            }
            PickerEvent::Highlighted(_) | PickerEvent::Ignored => Cmd::None,
        };
    }

    match model.issue_field.handle(key) {
        FieldEvent::Changed => sync_picker_query(model),
        FieldEvent::Moved | FieldEvent::Submit | FieldEvent::Ignored => Cmd::None,
    }
}

fn handle_new_timer_key(model: &mut AppModel, key: &KeyEvent) -> Cmd {
    if model.creating {
        return Cmd::None;
    }

    if !model.new_field.has_text() {
        if key.enter && !model.new_list_focused {
            model.creating = true;
            return Cmd::Create { issue: None };
        }
        if key.down_arrow && !model.new_list_focused {
            model.new_list_focused = true;
            return Cmd::None;
        }
        let at_top = model.picker.as_ref().is_none_or(|p| p.highlight() == 0);
        if key.up_arrow && model.new_list_focused && at_top {
            model.new_list_focused = false;
            return Cmd::None;
        }
    }

    let list_key = key.up_arrow || key.down_arrow || key.enter;
    if list_key && (model.new_list_focused || model.new_field.has_text()) {
        let event = model
            .picker
            .as_mut()
            .map_or(PickerEvent::Ignored, |picker| picker.handle(key));
        return match event {
            PickerEvent::Chosen(Some(issue)) => {
                model.creating = true;
                model.new_list_focused = false;
                model.new_field.clear();
                let create = Cmd::Create {
                    issue: Some(issue.issue_ref()),
                };
                Cmd::batch(vec![create, sync_picker_query(model)])
            }
            PickerEvent::Chosen(None) => {
                model.new_field.clear();
                sync_picker_query(model)
            }
            PickerEvent::Highlighted(_) | PickerEvent::Ignored => Cmd::None,
        };
    }

    match model.new_field.handle(key) {
        FieldEvent::Changed => sync_picker_query(model),
        FieldEvent::Moved | FieldEvent::Submit | FieldEvent::Ignored => Cmd::None,
    }
}

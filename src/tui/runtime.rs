//! Event loop for the interactive tracker list.
//!
//! The runtime thread owns the [`AppModel`]. It multiplexes four sources
//! with `crossbeam_channel::select!`: raw stdin chunks from a reader thread,
//! the pull timer, the clock timer, and replies from worker threads. Every
//! network [`Cmd`] runs on its own short-lived thread so a slow call never
//! delays the next tick.

#![allow(missing_docs)]

use std::io::{self, Read};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select, tick, unbounded};

use super::keys::{decode, split_chunk};
use super::model::{AppModel, Cmd, ModelSettings, Msg};
use super::render;
use super::signals::SignalHandler;
use super::terminal_guard::TerminalGuard;
use super::update::{init, update};
use crate::api::{IssueTracker, TimeTracker};
use crate::core::config::Config;
use crate::core::errors::{Result, TempoError};
use crate::logger::jsonl::{ActivityLog, EventType, LogEntry};

const READ_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub pull_interval: Duration,
    pub clock_interval: Duration,
    pub settings: ModelSettings,
}

impl RuntimeConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            pull_interval: config.ui.pull_interval(),
            clock_interval: config.ui.clock_interval(),
            settings: ModelSettings::from_config(config),
        }
    }
}

/// Collaborators the runtime calls on behalf of the model.
#[derive(Clone)]
pub struct Services {
    pub tracker: Arc<dyn TimeTracker>,
    pub issues: Arc<dyn IssueTracker>,
    pub log: ActivityLog,
}

/// Run the tracker list until the user quits or a signal arrives.
///
/// # Errors
/// Returns terminal setup and drawing failures. Collaborator failures never
/// end the session; they surface in the model.
pub fn run(config: &RuntimeConfig, services: &Services) -> Result<()> {
    let guard = TerminalGuard::new().map_err(|source| TempoError::Terminal { source })?;
    services.log.record(&LogEntry::info(EventType::AppStart));

    let result = event_loop(config, services);

    drop(guard);
    match &result {
        Ok(()) => services.log.record(&LogEntry::info(EventType::AppStop)),
        Err(err) => services.log.record(&LogEntry::failure(EventType::AppStop, err)),
    }
    services.log.flush();
    result
}

fn event_loop(config: &RuntimeConfig, services: &Services) -> Result<()> {
    let signals = SignalHandler::new();
    let keys = spawn_stdin_reader();
    let (reply_tx, reply_rx) = unbounded::<Msg>();
    let pull_tick = tick(config.pull_interval);
    let clock_tick = tick(config.clock_interval);

    let mut model = AppModel::new(config.settings.clone(), now_ms());
    let cmd = init(&mut model);
    execute(cmd, services, &reply_tx, &mut model);

    while !model.quit {
        redraw(&model)?;

        let msgs = select! {
            recv(keys) -> chunk => match chunk {
                Ok(bytes) => split_chunk(&bytes)
                    .into_iter()
                    .map(|part| Msg::Key(decode(part)))
                    .collect(),
                Err(_) => vec![Msg::Shutdown],
            },
            recv(reply_rx) -> reply => reply.map_or_else(|_| Vec::new(), |msg| vec![msg]),
            recv(pull_tick) -> _ => vec![Msg::PullDue],
            recv(clock_tick) -> _ => {
                let mut msgs = vec![Msg::Clock { now_ms: now_ms() }];
                if signals.should_pull() {
                    msgs.push(Msg::PullDue);
                }
                if signals.should_shutdown() {
                    msgs.push(Msg::Shutdown);
                }
                msgs
            },
        };

        for msg in msgs {
            log_reply(&services.log, &msg);
            let cmd = update(&mut model, msg);
            execute(cmd, services, &reply_tx, &mut model);
            if model.quit {
                break;
            }
        }
    }
    Ok(())
}

fn redraw(model: &AppModel) -> Result<()> {
    let (cols, rows) = TerminalGuard::terminal_size();
    let lines = render::frame(model);
    let mut stdout = io::stdout().lock();
    render::draw(&mut stdout, &lines, cols, rows).map_err(|source| TempoError::Terminal { source })
}

/// Forward raw stdin reads. The channel closes when stdin does.
fn spawn_stdin_reader() -> Receiver<Vec<u8>> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut buf = [0_u8; READ_BUFFER];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Run the side effects of `cmd`: terminal effects inline, network work on
/// worker threads that answer through `replies`.
fn execute(cmd: Cmd, services: &Services, replies: &Sender<Msg>, model: &mut AppModel) {
    for cmd in cmd.into_vec() {
        match cmd {
            Cmd::SetTitle(title) => {
                let _ = TerminalGuard::set_title(&title);
            }
            Cmd::OpenBrowser { url } => open_browser(&url),
            Cmd::Quit => model.quit = true,
            network => {
                let services = services.clone();
                let replies = replies.clone();
                thread::spawn(move || {
                    if let Some(msg) = perform(
                        network,
                        services.tracker.as_ref(),
                        services.issues.as_ref(),
                        &services.log,
                    ) {
                        let _ = replies.send(msg);
                    }
                });
            }
        }
    }
}

/// Run one network command to completion and build its reply.
///
/// Returns `None` for commands that do not touch a collaborator.
pub fn perform(
    cmd: Cmd,
    tracker: &dyn TimeTracker,
    issues: &dyn IssueTracker,
    log: &ActivityLog,
) -> Option<Msg> {
    let msg = match cmd {
        Cmd::Pull { generation } => Msg::Pulled {
            generation,
            result: tracker.list_sessions(),
        },
        Cmd::Toggle { id, purpose } => {
            let result = tracker.toggle_session(&id);
            if let Ok(session) = &result {
                log.record(
                    &LogEntry::info(EventType::SessionToggled)
                        .session(id.as_str())
                        .issue(session.issue_key.clone())
                        .details(if session.is_playing { "started" } else { "stopped" }),
                );
            }
            Msg::Toggled { id, purpose, result }
        }
        Cmd::Update { id, row, patch } => {
            let result = tracker.update_session(&id, &patch);
            if let Ok(session) = &result {
                log.record(
                    &LogEntry::info(EventType::SessionUpdated)
                        .session(id.as_str())
                        .issue(session.issue_key.clone()),
                );
            }
            Msg::Updated { id, row, result }
        }
        Cmd::Create { issue } => {
            let result = tracker.create_session(issue.as_ref());
            if let Ok(session) = &result {
                log.record(
                    &LogEntry::info(EventType::SessionCreated)
                        .session(session.id.as_str())
                        .issue(session.issue_key.clone()),
                );
            }
            Msg::Created { result }
        }
        Cmd::Delete { id } => {
            let result = tracker.delete_session(&id);
            if result.is_ok() {
                log.record(&LogEntry::info(EventType::SessionDeleted).session(id.as_str()));
            }
            Msg::Deleted { id, result }
        }
        Cmd::LogTime {
            id,
            issue_key,
            seconds,
        } => {
            let result = tracker.log_time(&issue_key, seconds);
            if let Ok(receipt) = &result {
                log.record(
                    &LogEntry::info(EventType::WorklogCreated)
                        .session(id.as_str())
                        .issue(Some(issue_key))
                        .seconds(seconds)
                        .details(if receipt.confirmed { "confirmed" } else { "unconfirmed" }),
                );
            }
            Msg::Logged { id, result }
        }
        Cmd::Search(request) => Msg::SearchResults {
            result: issues.search_issues(&request.query),
            request,
        },
        Cmd::None | Cmd::Batch(_) | Cmd::SetTitle(_) | Cmd::OpenBrowser { .. } | Cmd::Quit => {
            return None;
        }
    };
    Some(msg)
}

/// Record pull outcomes and collaborator failures.
fn log_reply(log: &ActivityLog, msg: &Msg) {
    let failure = match msg {
        Msg::Pulled { result: Ok(sessions), .. } => {
            log.record(&LogEntry::info(EventType::PullOk).count(sessions.len()));
            None
        }
        Msg::Pulled { result: Err(err), .. } => {
            log.record(&LogEntry::failure(EventType::PullFailed, err));
            None
        }
        Msg::Toggled { id, result: Err(err), .. }
        | Msg::Updated { id, result: Err(err), .. }
        | Msg::Logged { id, result: Err(err) }
        | Msg::Deleted { id, result: Err(err) } => Some((Some(id), err)),
        Msg::Created { result: Err(err) } | Msg::SearchResults { result: Err(err), .. } => {
            Some((None, err))
        }
        _ => None,
    };
    if let Some((id, err)) = failure {
        let entry = LogEntry::failure(EventType::Error, err);
        log.record(&match id {
            Some(id) => entry.session(id.as_str()),
            None => entry,
        });
    }
}

fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = std::process::Command::new("xdg-open");

    let _ = command
        .arg(url)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn();
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

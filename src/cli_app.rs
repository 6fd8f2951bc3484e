//! Top-level CLI definition and dispatch.

use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use cleevio_tempo_cli::api::jira::JiraClient;
use cleevio_tempo_cli::api::tempo::TempoClient;
use cleevio_tempo_cli::api::{Credentials, Endpoints, IssueTracker, TimeTracker};
use cleevio_tempo_cli::core::config::Config;
use cleevio_tempo_cli::core::errors::TempoError;
use cleevio_tempo_cli::logger::jsonl::{ActivityLog, EventType, LogEntry};
use cleevio_tempo_cli::tracking::session::{SessionId, SessionList, TrackingSession};
use cleevio_tempo_cli::tracking::timecode::{format_duration, visible_description};
use cleevio_tempo_cli::tui::terminal_guard::EchoGuard;
use cleevio_tempo_cli::tui::{self, RuntimeConfig, Services};

/// Toggle, annotate and log Tempo trackers against Jira issues.
#[derive(Debug, Parser)]
#[command(
    name = "cleevio-tempo-cli",
    author,
    version,
    about = "Interactive Tempo tracker list with Jira issue lookup",
    long_about = None
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Clear stored credentials and exit.
    #[arg(long)]
    logout: bool,
    /// Subcommand to execute; the tracker list runs when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Store and verify Tempo and Jira credentials.
    Login,
    /// Clear stored credentials.
    Logout,
    /// Print trackers without starting the interactive list.
    List(ListArgs),
    /// Start or stop one tracker.
    Toggle(ToggleArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct ListArgs {
    /// Emit one JSON document instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Args)]
struct ToggleArgs {
    /// Tracker id as shown by `list`.
    id: String,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

/// CLI failure surfaced by `main`.
#[derive(Debug, Error)]
pub enum CliError {
    /// Collaborator, config or terminal failure.
    #[error(transparent)]
    Tempo(#[from] TempoError),
    /// Invalid user input at a prompt.
    #[error("{0}")]
    User(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Prompt or output I/O failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Dispatch the parsed command line.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }
    if cli.logout {
        return run_logout(cli);
    }

    match &cli.command {
        None => run_tui(cli),
        Some(Command::Login) => run_login(cli),
        Some(Command::Logout) => run_logout(cli),
        Some(Command::List(args)) => run_list(cli, args),
        Some(Command::Toggle(args)) => run_toggle(cli, args),
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Load the config. With `allow_missing`, an explicit path that does not
/// exist yet yields defaults pointing at it, so `login` can create it.
fn load_config(cli: &Cli, allow_missing: bool) -> Result<Config, CliError> {
    match Config::load(cli.config.as_deref()) {
        Err(TempoError::MissingConfig { path }) if allow_missing => {
            let mut config = Config::default();
            config.paths.config_file = path;
            Ok(config)
        }
        other => Ok(other?),
    }
}

fn connect(config: &Config) -> Result<Services, CliError> {
    let credentials = Credentials::from_config(config)?;
    let endpoints = Endpoints::from_config(config);
    let issues: Arc<dyn IssueTracker> = Arc::new(JiraClient::new(&credentials, &endpoints)?);
    let tracker: Arc<dyn TimeTracker> = Arc::new(TempoClient::new(
        &credentials,
        &endpoints,
        Arc::clone(&issues),
    )?);
    Ok(Services {
        tracker,
        issues,
        log: ActivityLog::open(&config.paths.activity_log),
    })
}

fn run_tui(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli, false)?;
    config.require_credentials()?;
    let services = connect(&config)?;
    tui::run(&RuntimeConfig::from_config(&config), &services)?;
    Ok(())
}

// ──────────────────── credentials ────────────────────

fn run_login(cli: &Cli) -> Result<(), CliError> {
    let mut config = load_config(cli, true)?;
    let endpoints = Endpoints::from_config(&config);
    let stdin = io::stdin();
    let hide_secrets = stdin.is_terminal();
    let mut input = stdin.lock();

    let tempo_token = prompt(&mut input, "Tempo API token: ", hide_secrets)?;
    let mut credentials = Credentials {
        tempo_token,
        jira_username: String::new(),
        jira_api_token: String::new(),
    };
    let accounts: Arc<dyn IssueTracker> =
        Arc::new(JiraClient::new(&credentials, &endpoints)?);
    let trackers = TempoClient::new(&credentials, &endpoints, accounts)?.list_sessions()?;
    println!(
        "{} Tempo token accepted ({} trackers)",
        "ok".green(),
        trackers.len()
    );

    credentials.jira_username = prompt(&mut input, "Jira username (e-mail): ", false)?;
    credentials.jira_api_token = prompt(&mut input, "Jira API token: ", hide_secrets)?;
    let account = JiraClient::new(&credentials, &endpoints)?.myself()?;
    println!("{} Jira credentials accepted (account {account})", "ok".green());

    config.tempo.token = credentials.tempo_token;
    config.jira.username = credentials.jira_username;
    config.jira.api_token = credentials.jira_api_token;
    config.save()?;

    ActivityLog::open(&config.paths.activity_log).record(&LogEntry::info(EventType::Login));
    println!("Saved credentials to {}", config.paths.config_file.display());
    Ok(())
}

fn run_logout(cli: &Cli) -> Result<(), CliError> {
    let mut config = load_config(cli, true)?;
    if !config.paths.config_file.exists() {
        println!("No stored credentials");
        return Ok(());
    }
    config.clear_credentials();
    config.save()?;
    ActivityLog::open(&config.paths.activity_log).record(&LogEntry::info(EventType::Logout));
    println!("Removed credentials from {}", config.paths.config_file.display());
    Ok(())
}

/// Print `label` and read one trimmed, non-empty line.
///
/// With `hidden`, the terminal stops echoing while the line is typed.
fn prompt(input: &mut impl BufRead, label: &str, hidden: bool) -> Result<String, CliError> {
    print!("{label}");
    io::stdout().flush()?;
    let line = if hidden {
        let secret = {
            let _echo_off = EchoGuard::new()?;
            read_secret(input)
        };
        println!();
        secret?
    } else {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(closed_input());
        }
        line
    };
    let value = line.trim().to_string();
    if value.is_empty() {
        return Err(CliError::User(format!(
            "{} cannot be empty",
            label.trim_end_matches([':', ' '])
        )));
    }
    Ok(value)
}

/// Read raw-mode bytes up to Enter. Backspace erases one character and
/// Ctrl+C cancels, since raw mode delivers both as plain bytes.
fn read_secret(input: &mut impl Read) -> Result<String, CliError> {
    let mut bytes = Vec::new();
    let mut byte = [0_u8; 1];
    loop {
        if input.read(&mut byte)? == 0 {
            return Err(closed_input());
        }
        match byte[0] {
            b'\r' | b'\n' => break,
            0x03 => return Err(CliError::User("login cancelled".to_string())),
            0x08 | 0x7f => {
                while bytes.pop().is_some_and(|last| last & 0xC0 == 0x80) {}
            }
            other if other < 0x20 => {}
            other => bytes.push(other),
        }
    }
    String::from_utf8(bytes).map_err(|_| CliError::User("input is not valid UTF-8".to_string()))
}

fn closed_input() -> CliError {
    CliError::User("input closed before login finished".to_string())
}

// ──────────────────── one-shot commands ────────────────────

fn run_list(cli: &Cli, args: &ListArgs) -> Result<(), CliError> {
    let config = load_config(cli, false)?;
    config.require_credentials()?;
    let services = connect(&config)?;
    let sessions = SessionList::from_unsorted(services.tracker.list_sessions()?);
    services
        .log
        .record(&LogEntry::info(EventType::PullOk).count(sessions.len()));

    let now_ms = chrono::Utc::now().timestamp_millis();
    if args.json {
        let rows: Vec<Value> = sessions
            .iter()
            .map(|session| session_json(session, now_ms))
            .collect();
        write_json_line(&json!({ "trackers": rows }))?;
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No trackers");
        return Ok(());
    }
    for session in sessions.iter() {
        println!("{}", session_line(session, now_ms));
    }
    Ok(())
}

fn run_toggle(cli: &Cli, args: &ToggleArgs) -> Result<(), CliError> {
    let config = load_config(cli, false)?;
    config.require_credentials()?;
    let services = connect(&config)?;
    let id = SessionId::new(args.id.trim());
    let session = services.tracker.toggle_session(&id)?;
    let state = if session.is_playing { "started" } else { "stopped" };
    services.log.record(
        &LogEntry::info(EventType::SessionToggled)
            .session(id.as_str())
            .issue(session.issue_key.clone())
            .details(state),
    );
    println!(
        "{} {state}",
        session.issue_key.as_deref().unwrap_or(id.as_str()).bold()
    );
    Ok(())
}

fn session_json(session: &TrackingSession, now_ms: i64) -> Value {
    let elapsed = session.elapsed_ms(now_ms);
    json!({
        "id": session.id.as_str(),
        "issue_key": session.issue_key,
        "is_playing": session.is_playing,
        "created_date": session.created_date,
        "elapsed_ms": elapsed,
        "elapsed": format_duration(elapsed),
        "description": visible_description(session.description.as_deref()),
    })
}

fn session_line(session: &TrackingSession, now_ms: i64) -> String {
    let state = if session.is_playing {
        "running".green()
    } else {
        "paused ".yellow()
    };
    let issue = session
        .issue_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .unwrap_or("-");
    let description = visible_description(session.description.as_deref());
    format!(
        "{state}  {}  {:<12} {}  {}",
        format_duration(session.elapsed_ms(now_ms)),
        issue.bold(),
        session.id.as_str().dimmed(),
        description
    )
    .trim_end()
    .to_string()
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

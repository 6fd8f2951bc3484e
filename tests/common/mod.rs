use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

/// Environment overrides that would leak the developer's setup into a case.
const SCRUBBED_ENV: [&str; 11] = [
    "CTC_TEMPO_BASE_URL",
    "CTC_TEMPO_TOKEN",
    "CTC_JIRA_BASE_URL",
    "CTC_JIRA_USERNAME",
    "CTC_JIRA_API_TOKEN",
    "CTC_UI_PULL_INTERVAL_SECS",
    "CTC_UI_CLOCK_INTERVAL_MS",
    "CTC_UI_SEARCH_LIMIT",
    "CTC_UI_SET_TITLE",
    "CTC_NETWORK_REQUEST_TIMEOUT_SECS",
    "CTC_ACTIVITY_LOG",
];

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_cleevio-tempo-cli") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "cleevio-tempo-cli.exe"
    } else {
        "cleevio-tempo-cli"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve cleevio-tempo-cli binary path for integration test"),
    }
}

/// Run the binary with `home` as `$HOME`, extra `env` pairs, and stdin closed.
pub fn run_cli_case(case_name: &str, home: &Path, env: &[(&str, &str)], args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("cleevio-tempo-cli-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("HOME", home)
        .env("RUST_BACKTRACE", "1")
        .stdin(Stdio::null());
    for name in SCRUBBED_ENV {
        command.env_remove(name);
    }
    for (name, value) in env {
        command.env(name, value);
    }
    let output = command.output().expect("execute cleevio-tempo-cli command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("home={}\n", home.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

//! RAII terminal lifecycle guard backed by crossterm.
//!
//! [`TerminalGuard`] enters raw mode and the alternate screen on construction
//! and restores the terminal on [`Drop`], including early error returns. A
//! panic hook restores the terminal *before* the default panic message is
//! printed so the message lands on a normal screen.
//!
//! [`EchoGuard`] is the lighter variant for line prompts: raw mode only, so
//! typed secrets are not echoed.

use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
};

/// Set while raw mode is active; the panic hook only restores when set.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Restores the terminal when dropped.
pub struct TerminalGuard {
    hook_installed: bool,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen, installing the panic hook.
    ///
    /// # Errors
    /// Returns I/O errors if terminal setup fails. Whatever was already set up
    /// is undone before returning.
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);
        if let Err(err) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            restore_terminal_best_effort();
            return Err(err);
        }

        let prev = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal_best_effort();
            prev(info);
        }));

        Ok(Self {
            hook_installed: true,
        })
    }

    /// Terminal dimensions (columns, rows), falling back to 80x24.
    #[must_use]
    pub fn terminal_size() -> (u16, u16) {
        terminal::size()
            .ok()
            .filter(|&(cols, rows)| cols > 0 && rows > 0)
            .unwrap_or((80, 24))
    }

    /// Set the window title.
    pub fn set_title(title: &str) -> io::Result<()> {
        execute!(io::stdout(), SetTitle(title))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.hook_installed {
            // The previous hook moved into our closure; fall back to the default.
            let _ = panic::take_hook();
        }
        restore_terminal_best_effort();
    }
}

/// Keeps terminal echo off while alive.
pub struct EchoGuard {
    _private: (),
}

impl EchoGuard {
    /// Enter raw mode without touching the screen.
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Leave the alternate screen and raw mode. Safe to call repeatedly.
fn restore_terminal_best_effort() {
    if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
        let _ = stdout.flush();
    }
}

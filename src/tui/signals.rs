//! Signal handling for the interactive session.
//!
//! SIGTERM, SIGINT and SIGHUP end the session cleanly so the terminal guard
//! can restore the screen; SIGUSR1 forces an immediate tracker pull. The
//! runtime polls these flags on every clock tick rather than blocking on
//! signals.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Flags shared between signal handlers and the runtime loop.
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
    pull_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a handler and register OS signal hooks.
    ///
    /// Registration is best-effort; a failed hook only loses that signal.
    pub fn new() -> Self {
        let handler = Self::unregistered();
        handler.register_signals();
        handler
    }

    fn unregistered() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            pull_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    /// Check and clear a pending pull request.
    pub fn should_pull(&self) -> bool {
        self.pull_flag.swap(false, Ordering::Relaxed)
    }

    #[cfg(test)]
    fn request_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }

    #[cfg(test)]
    fn request_pull(&self) {
        self.pull_flag.store(true, Ordering::Relaxed);
    }

    fn register_signals(&self) {
        let _ = signal_hook::flag::register(SIGTERM, Arc::clone(&self.shutdown_flag));
        let _ = signal_hook::flag::register(SIGINT, Arc::clone(&self.shutdown_flag));

        #[cfg(unix)]
        {
            use signal_hook::consts::{SIGHUP, SIGUSR1};
            let _ = signal_hook::flag::register(SIGHUP, Arc::clone(&self.shutdown_flag));
            let _ = signal_hook::flag::register(SIGUSR1, Arc::clone(&self.pull_flag));
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

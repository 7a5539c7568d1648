//! Cooperative cancellation and shutdown signal handling.
//!
//! The scheduler never looks at process-wide state to decide whether to stop.
//! It is handed a [`CancellationToken`] instead, which a signal adapter, a
//! timer or a test can trip. Waiting on the token doubles as the sampling
//! sleep, so a signal wakes the loop immediately.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread,
    time::Duration,
};

use crate::logger::Log;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

/// Shared cancellation flag with a blocking wait.
///
/// Clones refer to the same flag. Once cancelled a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the flag and wake every waiter.
    pub fn cancel(&self) {
        let mut cancelled = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.state.condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until cancelled or until `timeout` elapses.
    ///
    /// Returns `true` if the token is cancelled when the wait ends.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .state
            .condvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

fn describe_signal(sig: i32, verbose: bool) -> &'static str {
    match sig {
        SIGINT if verbose => "Received SIGINT (Ctrl+C), initiating graceful shutdown...",
        SIGINT => "Received interrupt signal, initiating graceful shutdown...",
        SIGTERM => "Received termination request, initiating graceful shutdown...",
        SIGHUP => "Received hangup signal, initiating graceful shutdown...",
        _ => "Received shutdown signal, initiating graceful shutdown...",
    }
}

/// Cancel `token` when SIGINT, SIGTERM or SIGHUP arrives.
///
/// Spawns a background thread that owns the signal iterator. The thread keeps
/// running after the first signal so repeated Ctrl+C presses are swallowed
/// while the backend is being released.
pub fn install_shutdown_handler(token: CancellationToken) -> Result<()> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;

    thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                if token.is_cancelled() {
                    continue;
                }
                Log::log_pipe();
                Log::log_decorated(describe_signal(sig, Log::verbosity() > 0));
                token.cancel();
            }
        })
        .context("failed to spawn signal handler thread")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(!token.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        // Cancelling twice is harmless
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = thread::spawn(move || {
            let started = Instant::now();
            let cancelled = waiter.wait_timeout(Duration::from_secs(30));
            (cancelled, started.elapsed())
        });
        thread::sleep(Duration::from_millis(50));
        token.cancel();
        let (cancelled, elapsed) = handle.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(10));
    }

    #[test]
    fn test_signal_descriptions() {
        assert!(describe_signal(SIGINT, true).contains("SIGINT"));
        assert!(describe_signal(SIGINT, false).contains("interrupt"));
        assert!(describe_signal(SIGTERM, false).contains("termination"));
        assert!(describe_signal(SIGHUP, false).contains("hangup"));
    }
}

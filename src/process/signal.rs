use std::sync::Arc;
use std::thread::{self, JoinHandle};

use libc::c_int;
use signal_hook::consts::{SIGHUP, SIGINT};
use signal_hook::iterator::{Handle, Signals};
use tracing::{debug, warn};

use crate::process::ProcessError;

type Callback = Box<dyn Fn() + Send + Sync>;

/// What the shell does when a handled signal arrives.
pub struct SignalCallbacks {
    pub on_reload: Callback,
    pub on_interrupt: Callback,
}

impl Default for SignalCallbacks {
    fn default() -> Self {
        Self {
            on_reload: Box::new(|| {}),
            on_interrupt: Box::new(|| {}),
        }
    }
}

/// SIGHUP asks for a configuration reload. SIGINT is caught rather than
/// ignored, so exec'd children still start with the default disposition.
pub struct SignalPolicy {
    callbacks: Arc<SignalCallbacks>,
}

impl SignalPolicy {
    pub const SIGNALS: [c_int; 2] = [SIGHUP, SIGINT];

    pub fn new(callbacks: SignalCallbacks) -> Self {
        Self {
            callbacks: Arc::new(callbacks),
        }
    }

    /// Routes one delivered signal to its callback. Returns false for
    /// signals outside the policy.
    pub fn handle(&self, signal: c_int) -> bool {
        dispatch(&self.callbacks, signal)
    }

    pub fn install(self) -> Result<SignalGuard, ProcessError> {
        let mut signals = Signals::new(Self::SIGNALS)
            .map_err(|e| ProcessError::SignalError(e.to_string()))?;
        let handle = signals.handle();
        let callbacks = Arc::clone(&self.callbacks);

        let thread = thread::Builder::new()
            .name("cronsh-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    dispatch(&callbacks, signal);
                }
            })
            .map_err(|e| ProcessError::SignalError(e.to_string()))?;

        debug!(signals = ?Self::SIGNALS, "signal policy installed");
        Ok(SignalGuard {
            handle,
            thread: Some(thread),
        })
    }
}

fn dispatch(callbacks: &SignalCallbacks, signal: c_int) -> bool {
    match signal {
        SIGHUP => {
            debug!("received SIGHUP");
            (callbacks.on_reload)();
            true
        }
        SIGINT => {
            debug!("received SIGINT");
            (callbacks.on_interrupt)();
            true
        }
        other => {
            warn!(signal = other, "unexpected signal delivered to policy");
            false
        }
    }
}

/// Keeps the signal thread alive; dropping it stops dispatching.
pub struct SignalGuard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

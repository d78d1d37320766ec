//! Background expiration sweeper.
//!
//! Scans the session store on a fixed interval for `awaiting_prompt` chats whose
//! deadline passed and drives the machine's expiry transition for each,
//! independently per chat. The scan predicate is re-evaluated fresh every sweep;
//! a chat reset once is never returned (or notified) again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storage::SessionRepository;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::machine::PromptStateMachine;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Owns the periodic sweep task. Constructed once by the composition root;
/// `start` is guarded against double invocation and `stop` guarantees no sweep
/// fires after it returns.
pub struct SessionSweeper {
    sessions: Arc<SessionRepository>,
    machine: Arc<PromptStateMachine>,
    interval: Duration,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<SessionRepository>, machine: Arc<PromptStateMachine>) -> Self {
        Self {
            sessions,
            machine,
            interval: DEFAULT_SWEEP_INTERVAL,
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawns the periodic sweep task. A second call while running is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sweeper already running, skipping start");
            return;
        }

        info!(interval_secs = self.interval.as_secs(), "Starting session sweeper");

        let sessions = Arc::clone(&self.sessions);
        let machine = Arc::clone(&self.machine);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // An interval's first tick completes immediately; the first sweep
            // should happen one full interval after start.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                run_sweep(&sessions, &machine).await;
            }
        });

        *self.handle.lock().expect("sweeper handle lock poisoned") = Some(handle);
    }

    /// Stops the sweep task and waits for it to terminate, so no sweep can fire
    /// after this returns. Safe to call when not running.
    pub async fn stop(&self) {
        let handle = self
            .handle
            .lock()
            .expect("sweeper handle lock poisoned")
            .take();

        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
            info!("Sweeper stopped");
        }
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs one scan-and-reset cycle immediately. Used by tests and available
    /// for an eager sweep at startup.
    pub async fn sweep_once(&self) {
        run_sweep(&self.sessions, &self.machine).await;
    }
}

/// One sweep: scan, then reset each expired chat in isolation. A storage error
/// aborts only this cycle; a per-chat failure only skips that chat.
async fn run_sweep(sessions: &SessionRepository, machine: &PromptStateMachine) {
    let expired = match sessions.expired_sessions().await {
        Ok(expired) => expired,
        Err(err) => {
            error!(error = %err, "Error scanning for expired sessions");
            return;
        }
    };

    if expired.is_empty() {
        debug!("No expired sessions found");
        return;
    }

    info!(expired_count = expired.len(), "Found expired sessions to process");

    for session in expired {
        match machine
            .expire_pending(&session.bot_token, session.chat_id)
            .await
        {
            Ok(true) => {
                info!(chat_id = session.chat_id, "Successfully processed expired session");
            }
            Ok(false) => {
                debug!(chat_id = session.chat_id, "Expired session already handled");
            }
            Err(err) => {
                error!(
                    error = %err,
                    chat_id = session.chat_id,
                    "Error processing expired session"
                );
            }
        }
    }
}

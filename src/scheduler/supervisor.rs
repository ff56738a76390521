//! Per-target polling loop.

use crate::checker::Checker;
use crate::state::Store;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Longest single sleep while waiting for the next check.
const WAIT_STEP: Duration = Duration::from_secs(1);

/// Pause after a check task faults before the loop resumes.
const FAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Upper bound of the random delay added to the first wait.
const START_JITTER_MS: u64 = 100;

/// Lifecycle of a [`Supervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Owns the polling loop of a single target.
///
/// A supervisor is started at most once. Stopping is cooperative: a check
/// that is already in flight is allowed to finish and record its result.
pub struct Supervisor {
    target_id: u64,
    store: Arc<Store>,
    checker: Checker,
    state: Arc<Mutex<SupervisorState>>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    pub fn new(target_id: u64, store: Arc<Store>, checker: Checker) -> Self {
        Self {
            target_id,
            store,
            checker,
            state: Arc::new(Mutex::new(SupervisorState::Idle)),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    pub fn target_id(&self) -> u64 {
        self.target_id
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin polling. Returns `false` if this supervisor was already started
    /// or stopped.
    pub fn start(&self) -> bool {
        let checker = self.checker.clone();
        self.start_with(move |id| {
            let checker = checker.clone();
            async move { checker.check(id).await }
        })
    }

    fn start_with<F, Fut>(&self, check: F) -> bool
    where
        F: Fn(u64) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != SupervisorState::Idle {
                return false;
            }
            *state = SupervisorState::Running;
        }

        let handle = tokio::spawn(run_loop(
            self.target_id,
            self.store.clone(),
            self.cancel.clone(),
            self.state.clone(),
            check,
        ));
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        true
    }

    /// Ask the loop to exit. Safe to call any number of times.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            SupervisorState::Idle => *state = SupervisorState::Stopped,
            SupervisorState::Running => {
                *state = SupervisorState::Stopping;
                self.cancel.cancel();
            }
            SupervisorState::Stopping | SupervisorState::Stopped => {}
        }
    }

    /// Wait for the loop task to exit.
    pub async fn join(&self) {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Supervisor for target {} ended abnormally: {}", self.target_id, e);
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_loop<F, Fut>(
    target_id: u64,
    store: Arc<Store>,
    cancel: CancellationToken,
    state: Arc<Mutex<SupervisorState>>,
    check: F,
) where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
{
    tracing::debug!("Supervisor for target {} started", target_id);

    // The caller checked the target synchronously, so the first automatic
    // check waits a full interval.
    let jitter = Duration::from_millis(rand::random::<u64>() % START_JITTER_MS);
    let mut keep_going = wait_for_next_check(target_id, &store, &cancel, jitter).await;

    while keep_going {
        if !store.contains(target_id) {
            tracing::info!("Target {} no longer exists, supervisor exiting", target_id);
            break;
        }

        // The check runs in its own task so a panic inside it is contained
        // and reported here instead of killing the loop.
        match tokio::spawn(check(target_id)).await {
            Ok(_) => {
                keep_going = wait_for_next_check(target_id, &store, &cancel, Duration::ZERO).await;
            }
            Err(e) => {
                tracing::error!(
                    "Check for target {} faulted: {}; retrying in {:?}",
                    target_id,
                    e,
                    FAULT_BACKOFF
                );
                keep_going = tokio::select! {
                    _ = cancel.cancelled() => false,
                    _ = tokio::time::sleep(FAULT_BACKOFF) => true,
                };
            }
        }
    }

    *state.lock().unwrap_or_else(PoisonError::into_inner) = SupervisorState::Stopped;
    tracing::debug!("Supervisor for target {} stopped", target_id);
}

/// Sleep until the target's current interval has elapsed.
///
/// The interval is re-read on every step so a changed interval applies to
/// the wait already in progress. Returns `false` if the loop should exit.
async fn wait_for_next_check(
    target_id: u64,
    store: &Store,
    cancel: &CancellationToken,
    extra: Duration,
) -> bool {
    let started = Instant::now();
    loop {
        let interval = match store.check_interval(target_id) {
            Some(secs) => Duration::from_secs(secs),
            None => return false,
        };

        let deadline = interval.checked_add(extra).and_then(|d| started.checked_add(d));
        let now = Instant::now();
        let step = match deadline {
            Some(deadline) if now >= deadline => return true,
            Some(deadline) => (deadline - now).min(WAIT_STEP),
            // Not representable as an instant; keep stepping and re-reading.
            None => WAIT_STEP,
        };

        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(step) => {}
        }
    }
}

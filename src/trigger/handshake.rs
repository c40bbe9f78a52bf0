// src/trigger/handshake.rs

//! Cooperative stop handshake shared by the time and signal triggers.
//!
//! Each trigger owns one [`Handshake`]. Its state is a single slot (a
//! `watch` channel) holding the worker's [`Phase`]. The slot is used in both
//! directions:
//!
//! - the stopper writes `Stopping` into it and then waits for `Finished`;
//! - the worker writes `Finished` into it on every exit path, through the
//!   `Drop` impl of its [`WorkerGuard`].
//!
//! Whichever side looks at the slot after the worker is done sees
//! `Finished`, so stopping never blocks on a worker that already exited, and
//! never returns while the worker can still fire. A trigger that was never
//! started is moved straight from `Idle` to `Finished` by the stopper; a
//! later start attempt then refuses to run.

use std::sync::Arc;

use tokio::sync::watch;

/// Lifecycle of a trigger worker, as seen through its handshake slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Configured, no worker spawned yet.
    Idle,
    /// Worker is running and may still fire.
    Running,
    /// A stop was requested; the worker has not acknowledged it yet.
    Stopping,
    /// The worker exited (or was never allowed to run).
    Finished,
}

/// Stopper side of the handshake, owned by the trigger.
#[derive(Debug)]
pub struct Handshake {
    phase: Arc<watch::Sender<Phase>>,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Idle);
        Self {
            phase: Arc::new(tx),
        }
    }

    /// Current phase of the slot.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Claim the slot for a worker (`Idle` -> `Running`).
    ///
    /// Returns `None` when a worker already ran or a stop already happened;
    /// in that case nothing must be spawned.
    pub fn begin(&self) -> Option<WorkerGuard> {
        let claimed = self.phase.send_if_modified(|phase| {
            if *phase == Phase::Idle {
                *phase = Phase::Running;
                true
            } else {
                false
            }
        });

        claimed.then(|| WorkerGuard {
            phase: Arc::clone(&self.phase),
            stop_rx: self.phase.subscribe(),
        })
    }

    /// Request a cooperative stop and wait until the worker has exited.
    ///
    /// Idempotent. Returns immediately when the worker already finished on
    /// its own, and never blocks for a trigger that was never started.
    pub async fn request_stop_and_wait(&self) {
        let mut rx = self.phase.subscribe();
        self.request_stop();

        // The sender lives in `self`, so this only resolves on `Finished`.
        let _ = rx.wait_for(|phase| *phase == Phase::Finished).await;
    }

    /// Request a stop without waiting for the worker to acknowledge it.
    pub fn request_stop(&self) {
        self.phase.send_if_modified(|phase| match *phase {
            Phase::Idle => {
                *phase = Phase::Finished;
                true
            }
            Phase::Running => {
                *phase = Phase::Stopping;
                true
            }
            Phase::Stopping | Phase::Finished => false,
        });
    }

    /// Wait for the worker to finish without asking it to stop.
    ///
    /// Stays pending for a trigger that is still `Idle`.
    pub async fn wait_finished(&self) {
        let mut rx = self.phase.subscribe();
        let _ = rx.wait_for(|phase| *phase == Phase::Finished).await;
    }
}

/// Worker side of the handshake.
///
/// Dropping the guard reports completion, so every exit path of a worker
/// (early return, natural end, panic unwinding, task cancellation) marks the
/// slot `Finished`.
#[derive(Debug)]
pub struct WorkerGuard {
    phase: Arc<watch::Sender<Phase>>,
    stop_rx: watch::Receiver<Phase>,
}

impl WorkerGuard {
    pub fn is_stop_requested(&self) -> bool {
        *self.stop_rx.borrow() == Phase::Stopping
    }

    /// Resolves once a stop has been requested.
    pub async fn stop_requested(&mut self) {
        let _ = self
            .stop_rx
            .wait_for(|phase| *phase == Phase::Stopping)
            .await;
    }

    /// Explicitly report completion. Equivalent to dropping the guard.
    pub fn report_completion(self) {
        drop(self);
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.phase.send_replace(Phase::Finished);
    }
}

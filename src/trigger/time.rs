// src/trigger/time.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info};

use crate::errors::Result;
use crate::trigger::handshake::{Handshake, Phase, WorkerGuard};
use crate::trigger::schedule::Schedule;
use crate::trigger::Fire;

/// Fires a callback according to a [`Schedule`].
///
/// The setters only record values; nothing is checked until
/// [`TimeTrigger::validate`] runs (which `TriggeredAction::start` does).
#[derive(Debug, Default)]
pub struct TimeTrigger {
    schedule: Schedule,
    handshake: Handshake,
}

impl TimeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after the given delay.
    pub fn after(&mut self, delay: Duration) -> &mut Self {
        self.schedule.start_after = Some(delay);
        self
    }

    /// Start at the given wall-clock instant.
    pub fn at(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.schedule.start_at = Some(at);
        self
    }

    /// Repeat at this interval after the first firing.
    pub fn every(&mut self, interval: Duration) -> &mut Self {
        self.schedule.interval = Some(interval);
        self
    }

    /// Keep repeating for this long, measured from the first firing.
    pub fn run_for(&mut self, length: Duration) -> &mut Self {
        self.schedule.run_for = Some(length);
        self
    }

    /// Keep repeating until this wall-clock instant.
    pub fn until(&mut self, until: DateTime<Utc>) -> &mut Self {
        self.schedule.run_until = Some(until);
        self
    }

    /// Replace the whole schedule at once.
    pub fn set_schedule(&mut self, schedule: Schedule) -> &mut Self {
        self.schedule = schedule;
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()
    }

    pub fn phase(&self) -> Phase {
        self.handshake.phase()
    }

    /// Spawn the schedule loop on `runtime`.
    ///
    /// Does nothing if the trigger already ran or was stopped before being
    /// started.
    pub fn start(&self, action: Arc<str>, fire: Fire, runtime: &Handle) {
        let Some(guard) = self.handshake.begin() else {
            debug!(action = %action, "time trigger already finished; not starting");
            return;
        };

        runtime.spawn(run_schedule(self.schedule.clone(), guard, fire, action));
    }

    /// Ask the loop to stop and wait until it has.
    pub async fn request_stop_and_wait(&self) {
        self.handshake.request_stop_and_wait().await;
    }

    /// Ask the loop to stop without waiting.
    pub fn request_stop(&self) {
        self.handshake.request_stop();
    }

    /// Wait for the loop to run out on its own.
    pub async fn wait_finished(&self) {
        self.handshake.wait_finished().await;
    }
}

/// Worker body. `guard` reports completion when this future returns or is
/// dropped.
async fn run_schedule(schedule: Schedule, mut guard: WorkerGuard, fire: Fire, action: Arc<str>) {
    if schedule.is_inert() {
        debug!(action = %action, "time trigger has no start condition or interval; inert");
        return;
    }

    let wait = schedule.initial_wait(Utc::now());
    debug!(action = %action, ?wait, schedule = %schedule, "time trigger armed");

    tokio::select! {
        biased;
        _ = guard.stop_requested() => {
            debug!(action = %action, "stop requested before first firing");
            return;
        }
        _ = sleep(wait) => {}
    }

    let first = Instant::now();
    let cutoff = schedule.cutoff(first, Utc::now());

    let mut ticks = match schedule.interval {
        Some(every) => match first.checked_add(every) {
            Some(next) => {
                let mut ticks = interval_at(next, every);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
                Some(ticks)
            }
            // An interval this large never comes around again.
            None => None,
        },
        None => None,
    };

    let mut fired: u64 = 0;
    while cutoff.is_none_or(|cutoff| Instant::now() < cutoff) {
        if guard.is_stop_requested() {
            debug!(action = %action, fired, "stop requested; leaving schedule");
            return;
        }

        debug!(action = %action, firing = fired + 1, "time trigger firing");
        fire().await;
        fired += 1;

        let Some(ticks) = ticks.as_mut() else {
            if schedule.is_one_shot() {
                debug!(action = %action, "one-shot schedule fired; done");
            } else {
                guard.stop_requested().await;
            }
            return;
        };

        tokio::select! {
            biased;
            _ = guard.stop_requested() => {
                debug!(action = %action, fired, "stop requested; leaving schedule");
                return;
            }
            _ = ticks.tick() => {}
        }
    }

    info!(action = %action, fired, "schedule cutoff reached");
}

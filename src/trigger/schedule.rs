// src/trigger/schedule.rs

//! Declarative time schedule and its resolution into concrete waits.
//!
//! Reading guide for the fields:
//! - `start_at` starts at a wall-clock instant.
//! - `start_after` starts after a delay from the moment the trigger starts.
//! - Omitting both starts right away.
//! - `interval` repeats after the first firing; omitting it fires once.
//! - `run_for` bounds the repetition by a duration measured from the first
//!   firing; `run_until` bounds it by a wall-clock instant.
//!
//! A zero `start_after` or `run_for` counts as unset.
//!
//! Everything here is pure. The run loop in [`super::time`] asks this type
//! how long to wait and when to stop.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::errors::{Result, TriplineError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub start_after: Option<Duration>,
    pub start_at: Option<DateTime<Utc>>,
    pub interval: Option<Duration>,
    pub run_for: Option<Duration>,
    pub run_until: Option<DateTime<Utc>>,
}

impl Schedule {
    /// Check the combination of fields.
    ///
    /// Has no side effects and can be called any number of times.
    pub fn validate(&self) -> Result<()> {
        if self.start_at.is_some() && self.effective_start_after().is_some() {
            return Err(TriplineError::AmbiguousStart);
        }

        if self.run_until.is_some() && self.effective_run_for().is_some() {
            return Err(TriplineError::AmbiguousStop);
        }

        if (self.effective_run_for().is_some() || self.run_until.is_some())
            && self.interval.is_none()
        {
            return Err(TriplineError::MissingInterval);
        }

        if self.interval == Some(Duration::ZERO) {
            return Err(TriplineError::ZeroInterval);
        }

        Ok(())
    }

    /// A schedule without any start condition and without an interval never
    /// fires.
    pub fn is_inert(&self) -> bool {
        self.effective_start_after().is_none()
            && self.start_at.is_none()
            && self.interval.is_none()
    }

    /// `start_after`, with a zero delay treated as unset.
    pub fn effective_start_after(&self) -> Option<Duration> {
        self.start_after.filter(|after| !after.is_zero())
    }

    /// `run_for`, with a zero length treated as unset.
    pub fn effective_run_for(&self) -> Option<Duration> {
        self.run_for.filter(|length| !length.is_zero())
    }

    pub fn is_one_shot(&self) -> bool {
        self.interval.is_none()
    }

    /// How long to wait before the first firing, relative to `now`.
    ///
    /// A `start_at` in the past resolves to zero.
    pub fn initial_wait(&self, now: DateTime<Utc>) -> Duration {
        if let Some(after) = self.effective_start_after() {
            return after;
        }

        if let Some(at) = self.start_at {
            return until_or_zero(at, now);
        }

        Duration::ZERO
    }

    /// Instant after which a repeating schedule stops firing.
    ///
    /// Evaluated at the first firing: `now` / `wall_now` are the tokio and
    /// wall clocks at that point. `None` means "repeat until stopped".
    pub fn cutoff(&self, now: Instant, wall_now: DateTime<Utc>) -> Option<Instant> {
        if let Some(run_for) = self.effective_run_for() {
            return now.checked_add(run_for);
        }

        if let Some(until) = self.run_until {
            return now.checked_add(until_or_zero(until, wall_now));
        }

        None
    }
}

fn until_or_zero(target: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inert() {
            return f.write_str("never");
        }

        let mut parts: Vec<String> = Vec::new();
        if let Some(after) = self.effective_start_after() {
            parts.push(format!("after {after:?}"));
        }
        if let Some(at) = self.start_at {
            parts.push(format!("at {}", at.to_rfc3339()));
        }
        match self.interval {
            Some(every) => parts.push(format!("every {every:?}")),
            None => parts.push("once".to_string()),
        }
        if let Some(run_for) = self.effective_run_for() {
            parts.push(format!("for {run_for:?}"));
        }
        if let Some(until) = self.run_until {
            parts.push(format!("until {}", until.to_rfc3339()));
        }

        f.write_str(&parts.join(", "))
    }
}

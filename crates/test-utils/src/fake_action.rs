use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tripline::action::Action;
use tripline::errors::{Result, TriplineError};

/// Shared log of lifecycle calls, e.g. `["start:a", "start:b", "end:a"]`.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// An action that does nothing but record `start` / `end` calls.
///
/// - `failing()` makes `start` return a configuration error.
/// - `with_end_delay()` makes `end` take that long (useful with paused time
///   to check that the host ends actions concurrently).
pub struct FakeAction {
    name: String,
    journal: Journal,
    fail_start: bool,
    end_delay: Duration,
}

impl FakeAction {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: Arc::clone(journal),
            fail_start: false,
            end_delay: Duration::ZERO,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn with_end_delay(mut self, delay: Duration) -> Self {
        self.end_delay = delay;
        self
    }

    pub fn boxed(self) -> Box<dyn Action> {
        Box::new(self)
    }
}

impl Action for FakeAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> Result<()> {
        self.journal.lock().unwrap().push(format!("start:{}", self.name));
        if self.fail_start {
            return Err(TriplineError::ConfigError(format!(
                "{} refuses to start",
                self.name
            )));
        }
        Ok(())
    }

    fn end(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if !self.end_delay.is_zero() {
                tokio::time::sleep(self.end_delay).await;
            }
            self.journal.lock().unwrap().push(format!("end:{}", self.name));
        })
    }

    fn finished(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// Snapshot of a journal.
pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

// src/action/triggered.rs

use std::future::Future;
use std::io::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info};

use crate::action::Action;
use crate::action::builtin;
use crate::action::target::{Output, OutputTarget};
use crate::config::ActionConfig;
use crate::errors::{Result, TriplineError};
use crate::trigger::{Fire, SignalTrigger, TimeTrigger};
use crate::types::SignalId;

/// User callback. Receives the action's output and may fail; failures are
/// logged and otherwise ignored.
pub type Callback = Arc<dyn Fn(&mut Output) -> anyhow::Result<()> + Send + Sync>;

/// Prefix of the log line emitted when a callback returns an error.
pub const CALLBACK_ERROR_PREFIX: &str = "tripline callback error";

/// A callback driven by a time schedule and/or process signals, writing to
/// an [`OutputTarget`].
///
/// Built fluently:
///
/// ```no_run
/// # use std::io::Write;
/// # use std::time::Duration;
/// # use tripline::action::TriggeredAction;
/// let action = TriggeredAction::new("heartbeat", |out| {
///     writeln!(out, "alive")?;
///     Ok(())
/// })
/// .after(Duration::from_millis(500))
/// .every(Duration::from_secs(1))
/// .run_for(Duration::from_secs(10))
/// .to_file("heartbeat.log");
/// ```
///
/// Configuration is frozen once [`TriggeredAction::start`] has run.
pub struct TriggeredAction {
    name: Arc<str>,
    callback: Callback,
    time: TimeTrigger,
    signal: SignalTrigger,
    target: OutputTarget,
    setup_error: Option<TriplineError>,
}

impl std::fmt::Debug for TriggeredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggeredAction")
            .field("name", &self.name)
            .field("time", &self.time)
            .field("signal", &self.signal)
            .field("target", &self.target)
            .field("setup_error", &self.setup_error)
            .finish_non_exhaustive()
    }
}

impl TriggeredAction {
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut Output) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::from_callback(name, Arc::new(callback))
    }

    pub fn from_callback(name: impl Into<String>, callback: Callback) -> Self {
        Self {
            name: Arc::from(name.into()),
            callback,
            time: TimeTrigger::new(),
            signal: SignalTrigger::new(),
            target: OutputTarget::new(),
            setup_error: None,
        }
    }

    /// Build an action from a validated config entry.
    ///
    /// The output file, if any, is created here.
    pub fn from_config(name: impl Into<String>, config: &ActionConfig) -> Self {
        let mut action = Self::from_callback(name, builtin::from_spec(&config.run));
        action.time.set_schedule(config.schedule.clone());
        action.signal.on_signals(config.signals.iter().copied());

        match &config.output {
            Some(path) => action.to_file(path),
            None => action,
        }
    }

    /// Start the schedule after `delay`.
    pub fn after(mut self, delay: Duration) -> Self {
        self.time.after(delay);
        self
    }

    /// Start the schedule at a wall-clock instant.
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.time.at(at);
        self
    }

    /// Repeat every `interval` after the first firing.
    pub fn every(mut self, interval: Duration) -> Self {
        self.time.every(interval);
        self
    }

    /// Bound the repetition by a duration measured from the first firing.
    pub fn run_for(mut self, length: Duration) -> Self {
        self.time.run_for(length);
        self
    }

    /// Bound the repetition by a wall-clock instant.
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.time.until(until);
        self
    }

    /// Fire whenever one of `signals` arrives. Replaces any earlier set.
    pub fn on_signals(mut self, signals: impl IntoIterator<Item = SignalId>) -> Self {
        self.signal.on_signals(signals);
        self
    }

    /// Write to a caller-owned sink.
    pub fn to_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.target.to_writer(writer);
        self
    }

    /// Write to a file created right now.
    ///
    /// A failure is remembered and returned by [`TriggeredAction::start`];
    /// only the first failure is kept.
    pub fn to_file(mut self, path: impl AsRef<Path>) -> Self {
        if self.setup_error.is_none() {
            if let Err(err) = self.target.to_file(path) {
                self.setup_error = Some(err);
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_trigger(&self) -> &TimeTrigger {
        &self.time
    }

    pub fn signal_trigger(&self) -> &SignalTrigger {
        &self.signal
    }

    pub fn target(&self) -> &OutputTarget {
        &self.target
    }

    /// The configuration error recorded during setup, if any.
    pub fn setup_error(&self) -> Option<&TriplineError> {
        self.setup_error.as_ref()
    }

    /// Validate the configuration and spawn both trigger workers on the
    /// current Tokio runtime. Returns as soon as they are spawned.
    pub fn start(&mut self) -> Result<()> {
        if let Some(err) = self.setup_error.take() {
            self.setup_error = Some(TriplineError::ConfigError(format!(
                "action '{}' failed during setup: {err}",
                self.name
            )));
            return Err(err);
        }

        self.time.validate()?;

        let runtime = Handle::try_current().map_err(|_| TriplineError::NoRuntime)?;
        let fire = self.wrapped_callback();

        self.signal
            .start(Arc::clone(&self.name), Arc::clone(&fire), &runtime)?;
        self.time.start(Arc::clone(&self.name), fire, &runtime);

        info!(
            action = %self.name,
            schedule = %self.time.schedule(),
            signals = ?self.signal.signals(),
            output = ?self.target.owned_path(),
            "action started"
        );
        Ok(())
    }

    /// Stop both triggers and release the output, all at once, and wait for
    /// the three to finish.
    pub async fn end(&self) {
        let ((), (), released) = tokio::join!(
            self.signal.request_stop_and_wait(),
            self.time.request_stop_and_wait(),
            async { self.target.release_if_owned() },
        );

        debug!(action = %self.name, released, "action ended");
    }

    /// Resolve once both triggers have run out by themselves.
    pub async fn finished(&self) {
        tokio::join!(self.signal.wait_finished(), self.time.wait_finished());
    }

    /// Wrap the user callback so neither errors nor panics escape into the
    /// trigger loops.
    ///
    /// The callback may block (shell commands, file reads), so each firing
    /// runs on the blocking pool and the trigger awaits it there.
    fn wrapped_callback(&self) -> Fire {
        let name = Arc::clone(&self.name);
        let callback = Arc::clone(&self.callback);
        let output = self.target.output();

        Arc::new(move || -> BoxFuture<'static, ()> {
            let name = Arc::clone(&name);
            let callback = Arc::clone(&callback);
            let mut out = output.clone();

            Box::pin(async move {
                let task = {
                    let name = Arc::clone(&name);
                    spawn_blocking(move || invoke(&name, &callback, &mut out))
                };

                if let Err(err) = task.await {
                    error!(action = %name, "{CALLBACK_ERROR_PREFIX}: callback task failed: {err}");
                }
            })
        })
    }
}

fn invoke(name: &str, callback: &Callback, out: &mut Output) {
    match catch_unwind(AssertUnwindSafe(|| callback(out))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(action = %name, "{CALLBACK_ERROR_PREFIX}: {err:#}");
        }
        Err(_) => {
            error!(action = %name, "{CALLBACK_ERROR_PREFIX}: callback panicked");
        }
    }
}

/// Dropping an action asks its workers to stop; use
/// [`TriggeredAction::end`] to also wait for them.
impl Drop for TriggeredAction {
    fn drop(&mut self) {
        self.signal.request_stop();
        self.time.request_stop();
    }
}

impl Action for TriggeredAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> Result<()> {
        TriggeredAction::start(self)
    }

    fn end(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(TriggeredAction::end(self))
    }

    fn finished(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(TriggeredAction::finished(self))
    }
}

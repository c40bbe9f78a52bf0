// src/trigger/signal.rs

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_stream::StreamExt;
use tokio_stream::StreamMap;
use tracing::{debug, info};

use crate::errors::Result;
use crate::trigger::handshake::{Handshake, Phase, WorkerGuard};
use crate::trigger::Fire;
use crate::types::SignalId;

#[cfg(unix)]
type Listener = tokio_stream::wrappers::SignalStream;
#[cfg(not(unix))]
type Listener = tokio_stream::Pending<()>;

type Listeners = StreamMap<SignalId, Listener>;

/// Fires a callback every time one of the configured process signals
/// arrives.
///
/// An empty signal set is valid and makes the trigger inert.
#[derive(Debug, Default)]
pub struct SignalTrigger {
    signals: Vec<SignalId>,
    handshake: Handshake,
}

impl SignalTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the signal set. Duplicates are dropped.
    pub fn on_signals(&mut self, signals: impl IntoIterator<Item = SignalId>) -> &mut Self {
        self.signals.clear();
        for signal in signals {
            if !self.signals.contains(&signal) {
                self.signals.push(signal);
            }
        }
        self
    }

    pub fn signals(&self) -> &[SignalId] {
        &self.signals
    }

    pub fn is_inert(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn phase(&self) -> Phase {
        self.handshake.phase()
    }

    /// Register the signal handlers and spawn the listening loop.
    ///
    /// Registration happens before this returns, so a signal sent right
    /// after a successful start is not lost. A signal the platform refuses
    /// to hand out (e.g. `SIGKILL`) is reported as a configuration error and
    /// leaves the trigger untouched.
    pub fn start(&self, action: Arc<str>, fire: Fire, runtime: &Handle) -> Result<()> {
        let listeners = {
            let _ctx = runtime.enter();
            register(&self.signals)?
        };

        let Some(guard) = self.handshake.begin() else {
            debug!(action = %action, "signal trigger already finished; not starting");
            return Ok(());
        };

        runtime.spawn(listen(listeners, guard, fire, action));
        Ok(())
    }

    /// Ask the listener to stop and wait until it has.
    pub async fn request_stop_and_wait(&self) {
        self.handshake.request_stop_and_wait().await;
    }

    /// Ask the listener to stop without waiting.
    pub fn request_stop(&self) {
        self.handshake.request_stop();
    }

    /// Wait for the listener to exit on its own.
    pub async fn wait_finished(&self) {
        self.handshake.wait_finished().await;
    }
}

#[cfg(unix)]
fn register(signals: &[SignalId]) -> Result<Listeners> {
    use tokio::signal::unix::signal;
    use tokio_stream::wrappers::SignalStream;

    use crate::errors::TriplineError;

    let mut listeners = StreamMap::new();
    for &id in signals {
        let stream = signal(id.kind())
            .map_err(|source| TriplineError::SignalRegistration { signal: id, source })?;
        listeners.insert(id, SignalStream::new(stream));
    }
    Ok(listeners)
}

#[cfg(not(unix))]
fn register(signals: &[SignalId]) -> Result<Listeners> {
    use crate::errors::TriplineError;

    match signals.first() {
        Some(&id) => Err(TriplineError::SignalRegistration {
            signal: id,
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "signal triggers are only supported on unix",
            ),
        }),
        None => Ok(StreamMap::new()),
    }
}

async fn listen(mut listeners: Listeners, mut guard: WorkerGuard, fire: Fire, action: Arc<str>) {
    if listeners.is_empty() {
        debug!(action = %action, "signal trigger has no signals; inert");
        return;
    }

    let names: Vec<String> = listeners.keys().map(|id| id.to_string()).collect();
    info!(action = %action, signals = ?names, "listening for signals");

    loop {
        tokio::select! {
            biased;
            _ = guard.stop_requested() => {
                debug!(action = %action, "stop requested; signal trigger exiting");
                return;
            }
            received = listeners.next() => match received {
                Some((signal, ())) => {
                    debug!(action = %action, %signal, "signal received; firing");
                    fire().await;
                }
                None => {
                    debug!(action = %action, "signal streams closed");
                    return;
                }
            }
        }
    }
}

// src/action/mod.rs

//! Actions: a user callback wired to the trigger engine.
//!
//! - [`triggered`] composes a time trigger, a signal trigger and an output
//!   target around a callback.
//! - [`target`] owns where the callback's bytes go.
//! - [`host`] boots a list of actions and tears them down together.
//! - [`builtin`] has a few ready-made callbacks (process dumps, shell
//!   commands, messages).
//!
//! The [`Action`] trait is the seam between the host and concrete actions,
//! so tests can drive the host with fakes.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub mod builtin;
pub mod host;
pub mod target;
pub mod triggered;

pub use host::Host;
pub use target::{Output, OutputTarget};
pub use triggered::{CALLBACK_ERROR_PREFIX, Callback, TriggeredAction};

/// Something the [`Host`] can start and stop.
pub trait Action: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Check configuration and start listening asynchronously.
    ///
    /// Must return without waiting for anything to fire.
    fn start(&mut self) -> Result<()>;

    /// Signal the action to stop and resolve once it has.
    ///
    /// Safe to call on an action that was never started, failed to start,
    /// or already ran out on its own, and safe to call more than once.
    fn end(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Resolve once the action has run out without being stopped.
    fn finished(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

// src/trigger/mod.rs

//! Trigger engine.
//!
//! Two independent mechanisms decide *when* an action fires:
//! - [`time::TimeTrigger`] resolves a [`schedule::Schedule`] into an initial
//!   wait, an optional repeat interval and an optional cutoff, and runs it as
//!   a Tokio task.
//! - [`signal::SignalTrigger`] fires on every received process signal.
//!
//! Both own a [`handshake::Handshake`] so that stopping them is idempotent
//! and never races with a late firing.

use std::sync::Arc;

use futures::future::BoxFuture;

pub mod handshake;
pub mod schedule;
pub mod signal;
pub mod time;

/// The wrapped callback a trigger invokes when it fires.
///
/// Errors have already been handled by the time this is called. The
/// returned future resolves once the callback has returned; triggers await
/// it before waiting for the next firing.
pub type Fire = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

pub use handshake::{Handshake, Phase, WorkerGuard};
pub use schedule::Schedule;
pub use signal::SignalTrigger;
pub use time::TimeTrigger;

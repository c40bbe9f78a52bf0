// src/action/host.rs

use futures::future::join_all;
use tracing::{info, warn};

use crate::action::Action;
use crate::errors::Result;

/// Owns a set of started actions.
///
/// Actions are started one after the other; stopping happens for all of
/// them at once, so shutdown takes as long as the slowest action.
#[derive(Default)]
pub struct Host {
    actions: Vec<Box<dyn Action>>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("actions", &self.names())
            .finish()
    }
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host and boot `actions` on it.
    pub async fn start_all(actions: Vec<Box<dyn Action>>) -> Result<Self> {
        let mut host = Self::new();
        host.boot(actions).await?;
        Ok(host)
    }

    /// Start each action in order.
    ///
    /// On the first failure every action this host already runs is ended,
    /// the remaining ones are never started, and the error is returned.
    pub async fn boot(&mut self, actions: Vec<Box<dyn Action>>) -> Result<()> {
        for mut action in actions {
            if let Err(err) = action.start() {
                warn!(
                    action = %action.name(),
                    error = %err,
                    started = self.actions.len(),
                    "action failed to start; ending already started actions"
                );
                self.end_all().await;
                return Err(err);
            }

            info!(action = %action.name(), "action booted");
            self.actions.push(action);
        }

        Ok(())
    }

    /// End every booted action concurrently and wait for all of them.
    pub async fn end_all(&self) {
        if self.actions.is_empty() {
            return;
        }

        info!(actions = self.actions.len(), "ending all actions");
        join_all(self.actions.iter().map(|action| action.end())).await;
        info!("all actions ended");
    }

    /// Resolve once every booted action has run out by itself.
    pub async fn wait_finished(&self) {
        join_all(self.actions.iter().map(|action| action.finished())).await;
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|action| action.name()).collect()
    }
}

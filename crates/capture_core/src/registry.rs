//! Tracks the running instance of each recurring effect by handle.

use std::{collections::HashMap, future::Future};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::effect::EffectHandle;

struct ActiveEffect {
    generation: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// At most one active instance per handle. Cancellation is cooperative: the
/// operation stops at its next await point, and anything it already sent
/// stays sent.
#[derive(Default)]
pub struct EffectRegistry {
    active: HashMap<EffectHandle, ActiveEffect>,
    next_generation: u64,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `operation` under `handle`, cancelling whatever was registered
    /// there before. Returns `true` when a previous instance was superseded.
    pub fn schedule<F>(&mut self, handle: EffectHandle, operation: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let superseded = self.cancel(handle);

        let token = CancellationToken::new();
        let child = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = operation => {}
            }
        });

        self.next_generation += 1;
        let generation = self.next_generation;
        debug!(handle = handle.as_str(), generation, superseded, "effect scheduled");
        self.active.insert(
            handle,
            ActiveEffect {
                generation,
                token,
                task,
            },
        );
        superseded
    }

    /// Returns `true` if an instance was registered under `handle`.
    pub fn cancel(&mut self, handle: EffectHandle) -> bool {
        let Some(previous) = self.active.remove(&handle) else {
            return false;
        };
        previous.token.cancel();
        debug!(
            handle = handle.as_str(),
            generation = previous.generation,
            "effect cancelled"
        );
        true
    }

    pub fn cancel_all(&mut self) {
        for (handle, effect) in self.active.drain() {
            effect.token.cancel();
            debug!(
                handle = handle.as_str(),
                generation = effect.generation,
                "effect cancelled on shutdown"
            );
        }
    }

    /// Registered and not yet finished on its own.
    pub fn is_active(&self, handle: EffectHandle) -> bool {
        self.active
            .get(&handle)
            .is_some_and(|effect| !effect.task.is_finished())
    }

    pub fn generation(&self, handle: EffectHandle) -> Option<u64> {
        self.active.get(&handle).map(|effect| effect.generation)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl Drop for EffectRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;

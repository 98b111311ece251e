//! Debounced live regeneration while inputs change.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinHandle;

/// Which input changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTrigger {
    /// Colour picker drag.
    Color,
    /// Size slider drag.
    Size,
    /// Discrete error-correction selection.
    EcLevel,
}

/// Quiet period per trigger source.
#[derive(Debug, Clone)]
pub struct DebounceDelays {
    pub color: Duration,
    pub size: Duration,
    pub ec_level: Duration,
}

impl Default for DebounceDelays {
    fn default() -> Self {
        Self {
            color: Duration::from_millis(80),
            size: Duration::from_millis(80),
            ec_level: Duration::ZERO,
        }
    }
}

impl DebounceDelays {
    pub fn delay_for(&self, trigger: InputTrigger) -> Duration {
        match trigger {
            InputTrigger::Color => self.color,
            InputTrigger::Size => self.size,
            InputTrigger::EcLevel => self.ec_level,
        }
    }
}

/// Runs only the most recently scheduled job, after its delay.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Schedule `job` after `delay`, aborting whatever was pending.
    pub fn schedule<F>(&mut self, delay: Duration, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        }));
    }

    /// Abort the pending job. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the supervisor restarts failed sessions. Unbounded by default; the
/// backoff keeps a persistently failing site from being hammered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RestartPolicy {
    /// `None` restarts forever.
    pub max_restarts: Option<u32>,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: None,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl RestartPolicy {
    /// Restart straight away, forever.
    pub fn immediate() -> Self {
        Self {
            max_restarts: None,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 1.0,
        }
    }

    /// Whether the `restart`-th restart (1-based) may happen.
    pub fn allows(&self, restart: u32) -> bool {
        self.max_restarts.map_or(true, |max| restart <= max)
    }

    /// Pause before the `restart`-th restart (1-based).
    pub fn backoff(&self, restart: u32) -> Duration {
        let exponent = restart.saturating_sub(1).min(32) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let ms = (self.initial_backoff_ms as f64 * factor).min(self.max_backoff_ms as f64);
        Duration::from_millis(ms as u64)
    }
}

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::session::policy::RestartPolicy;

/// Inclusive millisecond range a delay is drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub fn fixed(ms: u64) -> Self {
        Self { min: ms, max: ms }
    }

    /// Uniform draw; a reversed range collapses to `min`.
    pub fn sample(&self) -> Duration {
        let max = self.max.max(self.min);
        let ms = if max == self.min {
            self.min
        } else {
            rand::thread_rng().gen_range(self.min..=max)
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlackSettings {
    pub token_file: PathBuf,
    pub channel: String,
    /// Upper bound on delivering one message.
    #[serde(default = "default_slack_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_slack_timeout_ms() -> u64 {
    5_000
}

impl SlackSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Engine tunables, read from an optional JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Pause between poll cycles that claimed nothing.
    pub refresh_delay_ms: DelayRange,
    /// Upper bound on waiting for a single confirmation dialog.
    pub dialog_timeout_ms: u64,
    /// Stray dialogs accepted at the start of each cycle.
    pub max_dialogs_per_cycle: u32,
    /// Stop scanning a cycle at the first row departing after the latest
    /// desired time. Relies on the listing being sorted by departure.
    pub trust_departure_order: bool,
    pub restart: RestartPolicy,
    pub slack: Option<SlackSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_delay_ms: DelayRange {
                min: 2_000,
                max: 4_000,
            },
            dialog_timeout_ms: 2_000,
            max_dialogs_per_cycle: 5,
            trust_departure_order: true,
            restart: RestartPolicy::default(),
            slack: None,
        }
    }
}

impl Settings {
    /// Missing file means defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn dialog_timeout(&self) -> Duration {
        Duration::from_millis(self.dialog_timeout_ms)
    }
}

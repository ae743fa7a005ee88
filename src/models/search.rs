use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passengers {
    pub adults: u8,
    pub children: u8,
    pub seniors: u8,
}

impl Default for Passengers {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            seniors: 0,
        }
    }
}

/// What the user asked for, after input validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntent {
    pub departure_station: String,
    pub arrival_station: String,
    pub date: NaiveDate,
    /// Requested earliest departure hour, 0..=23.
    pub min_hour: u8,
    /// How many top-ranked rows to inspect per poll cycle.
    pub breadth: usize,
    /// Explicit departure times; empty means "any time after `min_hour`".
    pub desired_times: Vec<NaiveTime>,
    pub passengers: Passengers,
    pub waitlist: bool,
    pub greedy: bool,
    pub checkout: bool,
}

/// Search configuration actually submitted to the listing.
/// Produced by [`crate::search::resolve`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSearch {
    pub departure_station: String,
    pub arrival_station: String,
    pub date: NaiveDate,
    /// Always even and below 24.
    pub min_hour: u8,
    pub breadth: usize,
    /// Sorted ascending.
    pub desired_times: Vec<NaiveTime>,
    pub breadth_auto: bool,
    pub hour_auto: bool,
    pub passengers: Passengers,
    pub waitlist: bool,
    pub greedy: bool,
    /// Pay for each claimed seat. Needs a loaded card to take effect.
    pub checkout: bool,
}

impl EffectiveSearch {
    /// Two-digit hour bucket as the listing's search form expects it.
    pub fn min_hour_label(&self) -> String {
        format!("{:02}", self.min_hour)
    }

    pub fn wants(&self, time: NaiveTime) -> bool {
        self.desired_times.binary_search(&time).is_ok()
    }

    pub fn latest_desired(&self) -> Option<NaiveTime> {
        self.desired_times.last().copied()
    }

    pub fn desired_times_label(&self) -> String {
        if self.desired_times.is_empty() {
            return "-".to_string();
        }
        self.desired_times
            .iter()
            .map(|time| time.format("%H:%M").to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

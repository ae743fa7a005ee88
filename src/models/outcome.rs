use serde::{Deserialize, Serialize};

/// Progress of one engine run. Survives session restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub success_count: usize,
    pub done: bool,
}

impl RunOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a confirmed booking and applies the termination policy:
    /// a non-greedy run ends on its first booking, a greedy one once
    /// `breadth` distinct bookings have been made.
    pub fn record_booking(&mut self, greedy: bool, breadth: usize) -> bool {
        self.success_count += 1;
        if !greedy || self.success_count >= breadth {
            self.done = true;
        }
        self.done
    }
}

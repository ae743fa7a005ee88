use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    SessionStarting,
    Authenticated,
    Searching,
    Polling,
    Retrying,
    Succeeded,
    Fatal,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Succeeded | SessionPhase::Fatal)
    }

    pub fn can_advance_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        match (self, next) {
            (Idle | Retrying, SessionStarting) => true,
            (SessionStarting, Authenticated) => true,
            (Authenticated, Searching) => true,
            (Searching, Polling) => true,
            // Greedy runs search again after a non-terminal booking.
            (Polling, Searching) => true,
            (Polling, Succeeded) => true,
            (SessionStarting | Authenticated | Searching | Polling, Retrying | Fatal) => true,
            // Operator cancelled the run.
            (from, Idle) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Supervisor bookkeeping for the current run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorState {
    pub phase: SessionPhase,
    pub session_id: Option<String>,
    /// When the current session was opened.
    pub session_started_at: Option<DateTime<Utc>>,
    pub sessions_started: u32,
    pub restarts: u32,
    /// Poll cycles across all sessions of the run.
    pub cycles: u64,
    pub last_error: Option<String>,
}

impl SupervisorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_session(&mut self, session_id: String, now: DateTime<Utc>) {
        self.advance(SessionPhase::SessionStarting);
        self.session_id = Some(session_id);
        self.session_started_at = Some(now);
        self.sessions_started += 1;
    }

    pub fn advance(&mut self, next: SessionPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal session transition {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
    }

    /// Moves to `Retrying` and returns the 1-based restart number.
    pub fn record_failure(&mut self, error: String) -> u32 {
        self.advance(SessionPhase::Retrying);
        self.restarts += 1;
        self.last_error = Some(error);
        self.restarts
    }

    pub fn session_label(&self) -> &str {
        self.session_id.as_deref().unwrap_or("-")
    }
}

//! Per-run record of which departures this run has already acted on.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::TrainKey;

/// What this run has done for one departure. A key missing from the ledger
/// has never been acted on, which is the same as `LedgerEntry::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerEntry {
    pub booked: bool,
    pub waitlisted: bool,
}

/// Raised when a key is marked twice. The matcher checks availability before
/// every mark, so this only fires on a logic error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("departure {0} is already booked")]
    AlreadyBooked(TrainKey),
    #[error("departure {0} is already waitlisted")]
    AlreadyWaitlisted(TrainKey),
}

/// Idempotency ledger keyed by [`TrainKey`].
///
/// Created once per engine run and handed from session to session, so a
/// restart never re-books or re-waitlists a departure. Single writer: the
/// poll matcher.
#[derive(Debug, Default)]
pub struct ReservationLedger {
    entries: HashMap<TrainKey, LedgerEntry>,
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, key: &TrainKey) -> LedgerEntry {
        self.entries.get(key).copied().unwrap_or_default()
    }

    pub fn is_available_for_booking(&self, key: &TrainKey) -> bool {
        !self.entry(key).booked
    }

    pub fn is_available_for_waitlist(&self, key: &TrainKey) -> bool {
        let entry = self.entry(key);
        !entry.booked && !entry.waitlisted
    }

    pub fn mark_booked(&mut self, key: &TrainKey) -> Result<(), LedgerError> {
        let entry = self.entries.entry(key.clone()).or_default();
        if entry.booked {
            return Err(LedgerError::AlreadyBooked(key.clone()));
        }
        entry.booked = true;
        Ok(())
    }

    pub fn mark_waitlisted(&mut self, key: &TrainKey) -> Result<(), LedgerError> {
        let entry = self.entries.entry(key.clone()).or_default();
        if entry.booked {
            return Err(LedgerError::AlreadyBooked(key.clone()));
        }
        if entry.waitlisted {
            return Err(LedgerError::AlreadyWaitlisted(key.clone()));
        }
        entry.waitlisted = true;
        Ok(())
    }

    pub fn booked_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.booked).count()
    }

    pub fn waitlisted_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.waitlisted).count()
    }
}

pub mod checkout;
pub mod ledger;
pub mod matcher;

pub use checkout::CheckoutOrchestrator;
pub use ledger::{LedgerEntry, LedgerError, ReservationLedger};
pub use matcher::{CycleOutcome, CycleReport, PollingMatcher};

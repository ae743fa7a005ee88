use thiserror::Error;

use crate::booking::ledger::LedgerError;

/// Failures that reach the session supervisor.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Anything that went wrong while opening a session, logging in,
    /// searching, scraping, claiming or waitlisting. The supervisor restarts
    /// the session and keeps the ledger.
    #[error("session failed: {0:#}")]
    Session(#[from] anyhow::Error),

    /// Checkout broke after a seat was claimed. Never retried.
    #[error("payment failed for {train}: {source:#}")]
    Payment {
        train: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("reservation ledger invariant violated: {0}")]
    Ledger(#[from] LedgerError),
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::Session(_))
    }
}

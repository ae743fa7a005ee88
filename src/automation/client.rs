use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{EffectiveSearch, ListingRow, PaymentDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Success,
    /// The seat went to someone else between observation and click.
    SoldOut,
}

/// One authenticated handle on the listing site.
///
/// Every call may block for a bounded time; a call that times out surfaces as
/// an error and is handled by the session supervisor.
#[async_trait]
pub trait AutomationClient: Send {
    async fn login(&mut self, id: &str, secret: &str) -> Result<()>;

    async fn navigate_to_search(&mut self) -> Result<()>;

    async fn submit_search(&mut self, search: &EffectiveSearch) -> Result<()>;

    /// Returns up to `breadth` rows in rank order. A row that could not be
    /// scraped is reported as an `Err` entry instead of failing the call.
    async fn list_candidates(&mut self, breadth: usize) -> Result<Vec<Result<ListingRow>>>;

    async fn attempt_claim(&mut self, rank: usize) -> Result<ClaimOutcome>;

    async fn attempt_waitlist(&mut self, rank: usize) -> Result<()>;

    async fn refresh_results(&mut self) -> Result<()>;

    /// Accepts a pending confirmation dialog if one shows up within
    /// `timeout`. `Ok(false)` means none appeared.
    async fn dismiss_pending_dialog(&mut self, timeout: Duration) -> Result<bool>;

    async fn fill_checkout_form(&mut self, payment: &PaymentDetails) -> Result<()>;

    async fn confirm_payment(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens fresh automation sessions; the supervisor calls this on every
/// (re)start.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn AutomationClient>>;
}

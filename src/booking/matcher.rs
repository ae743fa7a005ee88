//! One poll cycle over the ranked listing.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::{
    automation::{AutomationClient, ClaimOutcome},
    error::EngineError,
    models::{
        EffectiveSearch, ListingRow, PaymentDetails, RunOutcome, SeatAvailability,
        WaitlistAvailability,
    },
    notify::{messages, Notifier},
    settings::Settings,
};

use super::{checkout::CheckoutOrchestrator, ledger::ReservationLedger};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A seat was claimed (and paid for, when checkout is on). The cycle ends
    /// here; `done` tells whether the whole run is finished.
    Booked { rank: usize, done: bool },
    /// Nothing was claimed; results have been refreshed for the next cycle.
    NoClaim(CycleReport),
    /// Cancelled while waiting before the refresh.
    Cancelled,
}

/// What a cycle without a claim looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Ranks whose row was read, in scan order.
    pub inspected: Vec<usize>,
    pub unreadable: Vec<usize>,
    /// Ranks that looked bookable but were taken before the click landed.
    pub claims_lost: Vec<usize>,
    pub waitlisted: Vec<usize>,
    /// Rank whose departure passed the latest desired time.
    pub early_exit_at: Option<usize>,
}

enum TimeFilter {
    Consider,
    Skip,
    StopScan,
}

/// Decides, row by row, whether to book, waitlist or skip.
///
/// Holds only read-only run context; the ledger and run outcome are passed
/// into each cycle by the supervisor that owns them.
pub struct PollingMatcher<'a> {
    search: &'a EffectiveSearch,
    settings: &'a Settings,
    payment: Option<&'a PaymentDetails>,
    notifier: &'a dyn Notifier,
    cancel: &'a CancellationToken,
}

impl<'a> PollingMatcher<'a> {
    pub fn new(
        search: &'a EffectiveSearch,
        settings: &'a Settings,
        payment: Option<&'a PaymentDetails>,
        notifier: &'a dyn Notifier,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            search,
            settings,
            payment,
            notifier,
            cancel,
        }
    }

    pub async fn poll_cycle(
        &self,
        client: &mut dyn AutomationClient,
        ledger: &mut ReservationLedger,
        outcome: &mut RunOutcome,
    ) -> Result<CycleOutcome, EngineError> {
        self.drain_dialogs(client).await;

        let rows = client.list_candidates(self.search.breadth).await?;
        let mut report = CycleReport::default();

        for (index, scraped) in rows.into_iter().enumerate() {
            let row = match scraped {
                Ok(row) => row,
                Err(err) => {
                    log_debug!("rank {} unreadable this cycle: {err:#}", index + 1);
                    report.unreadable.push(index + 1);
                    continue;
                }
            };
            report.inspected.push(row.rank);

            match self.time_filter(&row) {
                TimeFilter::Consider => {}
                TimeFilter::Skip => continue,
                TimeFilter::StopScan => {
                    log_debug!(
                        "rank {} departs {} after the latest desired time, stopping scan",
                        row.rank,
                        row.train.departure
                    );
                    report.early_exit_at = Some(row.rank);
                    break;
                }
            }

            let key = row.train.key();

            if ledger.is_available_for_booking(&key) && row.seat == SeatAvailability::Bookable {
                log_info!("rank {} ({}) looks bookable, claiming", row.rank, row.train.number);
                match client.attempt_claim(row.rank).await? {
                    ClaimOutcome::Success => {
                        return self.on_claimed(client, &row, ledger, outcome).await;
                    }
                    ClaimOutcome::SoldOut => {
                        log_info!("rank {} was taken before the claim landed", row.rank);
                        report.claims_lost.push(row.rank);
                    }
                }
            }

            if self.search.waitlist
                && ledger.is_available_for_waitlist(&key)
                && row.waitlist == WaitlistAvailability::Open
            {
                client.attempt_waitlist(row.rank).await?;
                ledger.mark_waitlisted(&key)?;
                log_info!("rank {} ({}) waitlisted", row.rank, row.train.number);
                self.notifier
                    .notify(&messages::waitlisted(row.rank, &row.train, self.search))
                    .await;
                report.waitlisted.push(row.rank);
            }
        }

        let delay = self.settings.refresh_delay_ms.sample();
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.cancel.cancelled() => return Ok(CycleOutcome::Cancelled),
        }
        client.refresh_results().await?;

        Ok(CycleOutcome::NoClaim(report))
    }

    async fn on_claimed(
        &self,
        client: &mut dyn AutomationClient,
        row: &ListingRow,
        ledger: &mut ReservationLedger,
        outcome: &mut RunOutcome,
    ) -> Result<CycleOutcome, EngineError> {
        ledger.mark_booked(&row.train.key())?;
        let done = outcome.record_booking(self.search.greedy, self.search.breadth);
        log_info!(
            "rank {} ({}) booked, {} so far",
            row.rank,
            row.train.number,
            outcome.success_count
        );
        self.notifier
            .notify(&messages::booked(row.rank, &row.train, self.search))
            .await;

        if let Some(payment) = self.payment {
            CheckoutOrchestrator::new(self.search, self.notifier, self.settings.dialog_timeout())
                .checkout(client, &row.train, payment)
                .await?;
        }

        Ok(CycleOutcome::Booked {
            rank: row.rank,
            done,
        })
    }

    fn time_filter(&self, row: &ListingRow) -> TimeFilter {
        let Some(latest) = self.search.latest_desired() else {
            return TimeFilter::Consider;
        };
        let Some(departure) = row.train.departure_time() else {
            log_warn!(
                "rank {} has unreadable departure '{}', skipping",
                row.rank,
                row.train.departure
            );
            return TimeFilter::Skip;
        };

        if self.search.wants(departure) {
            TimeFilter::Consider
        } else if departure > latest && self.settings.trust_departure_order {
            TimeFilter::StopScan
        } else {
            TimeFilter::Skip
        }
    }

    /// Best effort: stray dialogs left over from the previous cycle.
    async fn drain_dialogs(&self, client: &mut dyn AutomationClient) {
        for _ in 0..self.settings.max_dialogs_per_cycle {
            match client
                .dismiss_pending_dialog(self.settings.dialog_timeout())
                .await
            {
                Ok(true) => log_debug!("dismissed a stray dialog"),
                Ok(false) => break,
                Err(err) => {
                    log_debug!("dialog check failed, ignoring: {err:#}");
                    break;
                }
            }
        }
    }
}

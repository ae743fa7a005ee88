use std::{fmt, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    automation::{AutomationClient, SessionFactory},
    booking::{CycleOutcome, PollingMatcher, ReservationLedger},
    error::EngineError,
    models::{EffectiveSearch, PaymentDetails, RunOutcome},
    notify::{messages, Notifier},
    settings::Settings,
};

use super::state::{SessionPhase, SupervisorState};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Clone)]
pub struct Credentials {
    pub id: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    Succeeded,
    Cancelled,
    /// The restart policy ran out.
    GaveUp,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub verdict: RunVerdict,
    pub outcome: RunOutcome,
    pub sessions_started: u32,
    pub restarts: u32,
    pub cycles: u64,
    pub booked: usize,
    pub waitlisted: usize,
}

enum SessionEnd {
    Succeeded,
    Cancelled,
}

/// Owns a run: opens sessions, drives the matcher and restarts after
/// recoverable failures. The ledger and run outcome live here so they
/// survive every restart.
pub struct SessionSupervisor {
    factory: Arc<dyn SessionFactory>,
    notifier: Arc<dyn Notifier>,
    search: EffectiveSearch,
    credentials: Credentials,
    payment: Option<PaymentDetails>,
    settings: Settings,
    cancel: CancellationToken,
    ledger: ReservationLedger,
    outcome: RunOutcome,
    state: SupervisorState,
    announced: bool,
}

impl SessionSupervisor {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        notifier: Arc<dyn Notifier>,
        search: EffectiveSearch,
        credentials: Credentials,
        settings: Settings,
    ) -> Self {
        Self {
            factory,
            notifier,
            search,
            credentials,
            payment: None,
            settings,
            cancel: CancellationToken::new(),
            ledger: ReservationLedger::new(),
            outcome: RunOutcome::new(),
            state: SupervisorState::new(),
            announced: false,
        }
    }

    /// Card used after every claim when the search opted into checkout.
    pub fn with_payment(mut self, payment: Option<PaymentDetails>) -> Self {
        self.payment = payment;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    pub fn outcome(&self) -> &RunOutcome {
        &self.outcome
    }

    /// Runs until the booking goal is met, the operator cancels, the restart
    /// policy gives up, or a fatal error occurs. Fatal errors are returned
    /// as `Err`; everything else ends in a [`RunReport`].
    pub async fn run(&mut self) -> Result<RunReport, EngineError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(self.stop_cancelled());
            }

            self.state
                .begin_session(Uuid::new_v4().to_string(), Utc::now());
            log_info!(
                "session {} starting ({} of run)",
                self.state.session_label(),
                self.state.sessions_started
            );

            match self.run_session().await {
                Ok(SessionEnd::Succeeded) => {
                    self.state.advance(SessionPhase::Succeeded);
                    log_info!(
                        "run finished with {} booking(s) after {} cycle(s)",
                        self.outcome.success_count,
                        self.state.cycles
                    );
                    self.notifier
                        .notify(&messages::run_finished(self.outcome.success_count))
                        .await;
                    return Ok(self.report(RunVerdict::Succeeded));
                }
                Ok(SessionEnd::Cancelled) => return Ok(self.stop_cancelled()),
                Err(err) if err.is_fatal() => {
                    log::error!(
                        "session {} stopped on a fatal error: {err}",
                        self.state.session_label()
                    );
                    self.state.advance(SessionPhase::Fatal);
                    return Err(err);
                }
                Err(err) => {
                    let description = err.to_string();
                    log_warn!(
                        "session {} failed: {description}",
                        self.state.session_label()
                    );
                    let restart = self.state.record_failure(description.clone());

                    if !self.settings.restart.allows(restart) {
                        log::error!("giving up after {} restart(s)", restart - 1);
                        self.notifier
                            .notify(&messages::gave_up(restart - 1, &description))
                            .await;
                        return Ok(self.report(RunVerdict::GaveUp));
                    }

                    let backoff = self.settings.restart.backoff(restart);
                    log_info!("restart #{restart} in {backoff:?}");
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = self.cancel.cancelled() => return Ok(self.stop_cancelled()),
                    }
                }
            }
        }
    }

    async fn run_session(&mut self) -> Result<SessionEnd, EngineError> {
        let mut client = self
            .factory
            .open_session()
            .await
            .context("failed to open automation session")?;

        let result = self.drive(client.as_mut()).await;

        match &result {
            Err(err) if err.is_fatal() => {
                log_warn!("leaving the session open for manual intervention");
            }
            _ => {
                if let Err(err) = client.close().await {
                    log_warn!("failed to close session cleanly: {err:#}");
                }
            }
        }
        result
    }

    async fn drive(&mut self, client: &mut dyn AutomationClient) -> Result<SessionEnd, EngineError> {
        client
            .login(&self.credentials.id, &self.credentials.secret)
            .await
            .context("login failed")?;
        self.state.advance(SessionPhase::Authenticated);

        self.state.advance(SessionPhase::Searching);
        submit_search(client, &self.search).await?;
        let payment = if self.search.checkout {
            self.payment.as_ref()
        } else {
            None
        };
        if !self.announced {
            self.notifier
                .notify(&messages::run_started(&self.search, payment.is_some()))
                .await;
            self.announced = true;
        }
        self.state.advance(SessionPhase::Polling);

        let matcher = PollingMatcher::new(
            &self.search,
            &self.settings,
            payment,
            self.notifier.as_ref(),
            &self.cancel,
        );

        loop {
            if self.cancel.is_cancelled() {
                return Ok(SessionEnd::Cancelled);
            }
            self.state.cycles += 1;

            match matcher
                .poll_cycle(client, &mut self.ledger, &mut self.outcome)
                .await?
            {
                CycleOutcome::Booked { done: true, .. } => return Ok(SessionEnd::Succeeded),
                CycleOutcome::Booked { rank, done: false } => {
                    log_info!(
                        "rank {rank} booked, {} of {} so far, searching again",
                        self.outcome.success_count,
                        self.search.breadth
                    );
                    self.state.advance(SessionPhase::Searching);
                    submit_search(client, &self.search).await?;
                    self.state.advance(SessionPhase::Polling);
                }
                CycleOutcome::NoClaim(report) => {
                    log_debug!(
                        "cycle {}: inspected {:?}, unreadable {:?}, lost {:?}",
                        self.state.cycles,
                        report.inspected,
                        report.unreadable,
                        report.claims_lost
                    );
                }
                CycleOutcome::Cancelled => return Ok(SessionEnd::Cancelled),
            }
        }
    }

    fn stop_cancelled(&mut self) -> RunReport {
        if !self.state.phase.is_terminal() {
            self.state.advance(SessionPhase::Idle);
        }
        log_info!("run cancelled by operator");
        self.report(RunVerdict::Cancelled)
    }

    fn report(&self, verdict: RunVerdict) -> RunReport {
        RunReport {
            verdict,
            outcome: self.outcome.clone(),
            sessions_started: self.state.sessions_started,
            restarts: self.state.restarts,
            cycles: self.state.cycles,
            booked: self.ledger.booked_count(),
            waitlisted: self.ledger.waitlisted_count(),
        }
    }
}

async fn submit_search(
    client: &mut dyn AutomationClient,
    search: &EffectiveSearch,
) -> anyhow::Result<()> {
    client
        .navigate_to_search()
        .await
        .context("failed to open the search form")?;
    client
        .submit_search(search)
        .await
        .context("failed to submit search")?;
    Ok(())
}

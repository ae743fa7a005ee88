//! Scripted stand-in for the listing site.
//!
//! A [`Scenario`] describes departures and when their seats or waitlists
//! open, measured in polls (one poll per `refresh_results`). Faults can be
//! injected to exercise the supervisor's restart path.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::models::{
    train::parse_clock, EffectiveSearch, ListingRow, PaymentDetails, SeatAvailability, Train,
    WaitlistAvailability,
};

use super::client::{AutomationClient, ClaimOutcome, SessionFactory};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimTrain {
    pub category: String,
    pub number: String,
    pub origin: String,
    pub departure: String,
    pub destination: String,
    pub arrival: String,
    /// Poll from which standard seats are offered; `None` keeps it sold out.
    #[serde(default)]
    pub seat_opens_at: Option<u32>,
    #[serde(default = "default_seats")]
    pub seats: u32,
    /// Claim attempts lost to other buyers before one can succeed.
    #[serde(default)]
    pub lost_races: u32,
    #[serde(default)]
    pub waitlist_opens_at: Option<u32>,
    /// Polls during which the row cannot be scraped.
    #[serde(default)]
    pub unreadable_at: Vec<u32>,
}

fn default_seats() -> u32 {
    1
}

impl SimTrain {
    /// Scrapes the row the way the listing renders it: one "station time"
    /// cell per end.
    fn scrape(&self) -> Result<Train> {
        Train::from_cells(
            &self.category,
            &self.number,
            &format!("{} {}", self.origin, self.departure),
            &format!("{} {}", self.destination, self.arrival),
        )
    }

    fn departure_time(&self) -> NaiveTime {
        parse_clock(&self.departure).unwrap_or(NaiveTime::MIN)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    pub trains: Vec<SimTrain>,
    /// Refreshes reaching one of these polls fail once, dropping the session.
    pub session_drops_at: Vec<u32>,
    /// 1-based session numbers whose login fails.
    pub failed_logins: Vec<u32>,
    /// One stray dialog pops up per entry when its poll is reached.
    pub stray_dialogs_at: Vec<u32>,
    /// Polls during which checking for a dialog fails.
    pub broken_dialogs_at: Vec<u32>,
    pub fail_checkout: bool,
    /// Checkout steps complete without raising confirmation dialogs.
    pub silent_checkout: bool,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }
}

/// Everything the site saw, for inspection after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteLog {
    pub sessions_opened: u32,
    pub logins: u32,
    pub searches: u32,
    pub polls: u32,
    /// Train numbers, in order, of every claim attempt.
    pub claim_attempts: Vec<String>,
    pub claims: Vec<String>,
    pub waitlists: Vec<String>,
    pub payments: Vec<String>,
    pub dialogs_accepted: u32,
}

struct SiteState {
    scenario: Scenario,
    log: SiteLog,
    seats_taken: HashMap<String, u32>,
    races_left: HashMap<String, u32>,
    drops_done: HashSet<u32>,
}

impl SiteState {
    fn seat(&self, train: &SimTrain) -> SeatAvailability {
        let taken = self.seats_taken.get(&train.number).copied().unwrap_or(0);
        let open = train
            .seat_opens_at
            .map_or(false, |poll| self.log.polls >= poll);
        if open && taken < train.seats {
            SeatAvailability::Bookable
        } else {
            SeatAvailability::SoldOut
        }
    }

    fn waitlist(&self, train: &SimTrain) -> WaitlistAvailability {
        match train.waitlist_opens_at {
            Some(poll) if self.log.polls >= poll => WaitlistAvailability::Open,
            _ => WaitlistAvailability::Closed,
        }
    }
}

/// Shared site; every session opened from it sees the same seats.
#[derive(Clone)]
pub struct SimulatedSite {
    state: Arc<Mutex<SiteState>>,
}

impl SimulatedSite {
    pub fn new(scenario: Scenario) -> Self {
        let races_left = scenario
            .trains
            .iter()
            .map(|train| (train.number.clone(), train.lost_races))
            .collect();
        Self {
            state: Arc::new(Mutex::new(SiteState {
                scenario,
                log: SiteLog::default(),
                seats_taken: HashMap::new(),
                races_left,
                drops_done: HashSet::new(),
            })),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(Scenario::load(path)?))
    }

    pub async fn log(&self) -> SiteLog {
        self.state.lock().await.log.clone()
    }
}

#[async_trait]
impl SessionFactory for SimulatedSite {
    async fn open_session(&self) -> Result<Box<dyn AutomationClient>> {
        let number = {
            let mut state = self.state.lock().await;
            state.log.sessions_opened += 1;
            state.log.sessions_opened
        };
        Ok(Box::new(SimulatedSession {
            state: Arc::clone(&self.state),
            number,
            logged_in: false,
            min_hour: None,
            listing: Vec::new(),
            claimed: None,
            pending_dialogs: 0,
        }))
    }
}

struct SimulatedSession {
    state: Arc<Mutex<SiteState>>,
    number: u32,
    logged_in: bool,
    /// Set while a results page is showing.
    min_hour: Option<u32>,
    /// Train index per rank of the last listing served.
    listing: Vec<usize>,
    claimed: Option<usize>,
    pending_dialogs: u32,
}

impl SimulatedSession {
    fn train_at(&self, rank: usize) -> Result<usize> {
        rank.checked_sub(1)
            .and_then(|index| self.listing.get(index))
            .copied()
            .ok_or_else(|| anyhow!("no row at rank {rank}"))
    }
}

#[async_trait]
impl AutomationClient for SimulatedSession {
    async fn login(&mut self, _id: &str, _secret: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.log.logins += 1;
        if state.scenario.failed_logins.contains(&self.number) {
            bail!("login form did not load in session {}", self.number);
        }
        self.logged_in = true;
        Ok(())
    }

    async fn navigate_to_search(&mut self) -> Result<()> {
        self.min_hour = None;
        self.claimed = None;
        Ok(())
    }

    async fn submit_search(&mut self, search: &EffectiveSearch) -> Result<()> {
        if !self.logged_in {
            bail!("search submitted without a login");
        }
        self.state.lock().await.log.searches += 1;
        self.min_hour = Some(u32::from(search.min_hour));
        Ok(())
    }

    async fn list_candidates(&mut self, breadth: usize) -> Result<Vec<Result<ListingRow>>> {
        let min_hour = self
            .min_hour
            .ok_or_else(|| anyhow!("results page is not showing"))?;
        let state = self.state.lock().await;

        let mut order: Vec<usize> = (0..state.scenario.trains.len())
            .filter(|&index| state.scenario.trains[index].departure_time().hour() >= min_hour)
            .collect();
        order.sort_by_key(|&index| state.scenario.trains[index].departure_time());
        order.truncate(breadth);

        let rows = order
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                let train = &state.scenario.trains[index];
                if train.unreadable_at.contains(&state.log.polls) {
                    return Err(anyhow!("stale row reference at rank {}", position + 1));
                }
                Ok(ListingRow {
                    rank: position + 1,
                    train: train.scrape()?,
                    seat: state.seat(train),
                    waitlist: state.waitlist(train),
                })
            })
            .collect();

        self.listing = order;
        Ok(rows)
    }

    async fn attempt_claim(&mut self, rank: usize) -> Result<ClaimOutcome> {
        let index = self.train_at(rank)?;
        let mut state = self.state.lock().await;
        let train = state.scenario.trains[index].clone();
        state.log.claim_attempts.push(train.number.clone());

        let races_left = state.races_left.entry(train.number.clone()).or_insert(0);
        if *races_left > 0 {
            *races_left -= 1;
            return Ok(ClaimOutcome::SoldOut);
        }
        if state.seat(&train) != SeatAvailability::Bookable {
            return Ok(ClaimOutcome::SoldOut);
        }

        *state.seats_taken.entry(train.number.clone()).or_insert(0) += 1;
        state.log.claims.push(train.number);
        self.claimed = Some(index);
        self.min_hour = None;
        Ok(ClaimOutcome::Success)
    }

    async fn attempt_waitlist(&mut self, rank: usize) -> Result<()> {
        let index = self.train_at(rank)?;
        let mut state = self.state.lock().await;
        let number = state.scenario.trains[index].number.clone();
        state.log.waitlists.push(number);
        Ok(())
    }

    async fn refresh_results(&mut self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.log.polls += 1;
        let poll = state.log.polls;
        if state.scenario.session_drops_at.contains(&poll) && state.drops_done.insert(poll) {
            self.min_hour = None;
            bail!("session expired while refreshing (poll {poll})");
        }
        let strays = state
            .scenario
            .stray_dialogs_at
            .iter()
            .filter(|&&at| at == poll)
            .count();
        self.pending_dialogs += strays as u32;
        Ok(())
    }

    async fn dismiss_pending_dialog(&mut self, _timeout: Duration) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.scenario.broken_dialogs_at.contains(&state.log.polls) {
            bail!("dialog handle went stale (poll {})", state.log.polls);
        }
        if self.pending_dialogs == 0 {
            return Ok(false);
        }
        self.pending_dialogs -= 1;
        state.log.dialogs_accepted += 1;
        Ok(true)
    }

    async fn fill_checkout_form(&mut self, _payment: &PaymentDetails) -> Result<()> {
        if self.claimed.is_none() {
            bail!("no reservation to pay for");
        }
        let state = self.state.lock().await;
        if state.scenario.fail_checkout {
            bail!("card form was rejected");
        }
        if !state.scenario.silent_checkout {
            self.pending_dialogs += 1;
        }
        Ok(())
    }

    async fn confirm_payment(&mut self) -> Result<()> {
        let index = self
            .claimed
            .take()
            .ok_or_else(|| anyhow!("no reservation to pay for"))?;
        let mut state = self.state.lock().await;
        let number = state.scenario.trains[index].number.clone();
        state.log.payments.push(number);
        if !state.scenario.silent_checkout {
            self.pending_dialogs += 1;
        }
        Ok(())
    }
}

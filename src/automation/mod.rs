pub mod client;
pub mod simulator;

pub use client::{AutomationClient, ClaimOutcome, SessionFactory};
pub use simulator::{Scenario, SimTrain, SimulatedSite, SiteLog};

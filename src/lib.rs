pub mod automation;
pub mod booking;
pub mod cli;
pub mod error;
pub mod models;
pub mod notify;
pub mod search;
pub mod session;
pub mod settings;
pub mod utils;

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use automation::SimulatedSite;
use cli::Cli;
use models::PaymentDetails;
use notify::{LogNotifier, Notifier, SlackNotifier};
use session::{Credentials, RunVerdict, SessionSupervisor};
use settings::Settings;

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_INVALID_INPUT: i32 = 2;

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let code = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime.block_on(hunt(cli)),
        Err(err) => {
            log::error!("failed to start async runtime: {err}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

async fn hunt(cli: Cli) -> i32 {
    let intent = match cli.to_intent() {
        Ok(intent) => intent,
        Err(err) => {
            log::error!("invalid input: {err}");
            return EXIT_INVALID_INPUT;
        }
    };

    let settings = match Settings::load(&cli.settings) {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{err:#}");
            return EXIT_INVALID_INPUT;
        }
    };

    let Some(scenario) = cli.scenario.as_deref() else {
        log::error!("no listing backend configured, pass --scenario <file>");
        return EXIT_INVALID_INPUT;
    };
    let site = match SimulatedSite::load(scenario) {
        Ok(site) => site,
        Err(err) => {
            log::error!("{err:#}");
            return EXIT_INVALID_INPUT;
        }
    };

    let search = search::resolve(&intent);
    if search.breadth_auto {
        log::info!("breadth widened to {} to cover desired times", search.breadth);
    }
    if search.hour_auto {
        log::info!(
            "search hour moved to {} to reach desired times",
            search.min_hour_label()
        );
    }

    let payment = match cli.checkout.as_deref() {
        Some(path) if intent.checkout => match PaymentDetails::load(path) {
            Ok(details) => Some(details),
            Err(err) => {
                log::warn!("automatic checkout disabled, pay manually: {err:#}");
                None
            }
        },
        _ => None,
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Ctrl-C received, stopping after the current step");
                cancel.cancel();
            }
        });
    }

    let credentials = Credentials {
        id: cli.user.clone(),
        secret: cli.psw.clone(),
    };
    let mut supervisor = SessionSupervisor::new(
        Arc::new(site),
        build_notifier(&settings),
        search,
        credentials,
        settings,
    )
    .with_payment(payment)
    .with_cancel_token(cancel);

    match supervisor.run().await {
        Ok(report) => {
            log::info!(
                "run ended {:?}: {} booked, {} waitlisted, {} session(s), {} cycle(s)",
                report.verdict,
                report.booked,
                report.waitlisted,
                report.sessions_started,
                report.cycles
            );
            match report.verdict {
                RunVerdict::Succeeded | RunVerdict::Cancelled => EXIT_OK,
                RunVerdict::GaveUp => EXIT_FAILURE,
            }
        }
        Err(err) => {
            log::error!("run aborted: {err}");
            EXIT_FAILURE
        }
    }
}

fn build_notifier(settings: &Settings) -> Arc<dyn Notifier> {
    let Some(slack) = &settings.slack else {
        return Arc::new(LogNotifier);
    };
    match SlackNotifier::from_settings(slack) {
        Ok(notifier) => Arc::new(notifier),
        Err(err) => {
            log::warn!("slack notifications disabled: {err:#}");
            Arc::new(LogNotifier)
        }
    }
}

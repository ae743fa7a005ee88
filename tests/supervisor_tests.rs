mod common;

use std::{sync::Arc, time::Duration};

use common::*;
use seat_hunter_lib::{
    automation::SimulatedSite,
    error::EngineError,
    models::{SearchIntent, Train},
    notify::SlackNotifier,
    search::resolve,
    session::{Credentials, RestartPolicy, RunVerdict, SessionPhase, SessionSupervisor},
    settings::{DelayRange, Settings},
};
use tokio_util::sync::CancellationToken;

fn supervisor(
    site: &SimulatedSite,
    notifier: &Arc<RecordingNotifier>,
    intent: &SearchIntent,
    settings: Settings,
) -> SessionSupervisor {
    SessionSupervisor::new(
        Arc::new(site.clone()),
        notifier.clone(),
        resolve(intent),
        Credentials {
            id: "1234567890".into(),
            secret: "secret".into(),
        },
        settings,
    )
}

fn checkout_intent(breadth: usize) -> SearchIntent {
    SearchIntent {
        checkout: true,
        ..intent(breadth)
    }
}

#[tokio::test]
async fn test_single_booking_finishes_run() {
    let site = SimulatedSite::new(scenario(vec![
        sim_train("301", "07:00", None),
        sim_train("303", "08:00", Some(2)),
    ]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut supervisor = supervisor(&site, &notifier, &intent(2), fast_settings());

    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::Succeeded);
    assert_eq!(report.booked, 1);
    assert_eq!(report.sessions_started, 1);
    assert_eq!(report.cycles, 3);
    assert_eq!(supervisor.state().phase, SessionPhase::Succeeded);
    assert_eq!(site.log().await.claims, vec!["303".to_string()]);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].contains("*Reservation started (manual payment)*"));
    assert!(messages[1].contains("*Rank 2 booked!*"));
    assert!(messages[2].contains("*Reservation finished* (1 booked)"));
}

#[tokio::test]
async fn test_greedy_books_up_to_breadth() {
    let site = SimulatedSite::new(scenario(vec![
        sim_train("301", "07:00", Some(0)),
        sim_train("303", "08:00", Some(0)),
        sim_train("305", "09:00", Some(0)),
        sim_train("307", "10:00", Some(0)),
    ]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut intent = intent(3);
    intent.greedy = true;
    let mut supervisor = supervisor(&site, &notifier, &intent, fast_settings());

    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::Succeeded);
    assert_eq!(report.outcome.success_count, 3);
    assert!(report.outcome.done);
    let log = site.log().await;
    assert_eq!(log.claims, vec!["301", "303", "305"]);
    assert_eq!(log.searches, 3);
    assert_eq!(notifier.count_containing("booked!*"), 3);
    assert_eq!(notifier.count_containing("*Reservation finished*"), 1);
}

#[tokio::test]
async fn test_restart_keeps_bookings_from_earlier_session() {
    let mut first = sim_train("301", "07:00", Some(0));
    first.seats = 2;
    let mut scenario = scenario(vec![first, sim_train("303", "08:00", Some(2))]);
    scenario.session_drops_at = vec![1];
    let site = SimulatedSite::new(scenario);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut intent = intent(2);
    intent.greedy = true;
    let mut supervisor = supervisor(&site, &notifier, &intent, fast_settings());

    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::Succeeded);
    assert_eq!(report.sessions_started, 2);
    assert_eq!(report.restarts, 1);
    let log = site.log().await;
    // 301 still had a free seat after the restart but was not claimed again.
    assert_eq!(log.claim_attempts, vec!["301", "303"]);
    assert_eq!(log.logins, 2);
    assert_eq!(notifier.count_containing("*Reservation started"), 1);
    assert!(supervisor.state().last_error.is_some());

    let first_seat = Train {
        category: "SRT".into(),
        number: "301".into(),
        origin: "수서".into(),
        departure: "07:00".into(),
        destination: "부산".into(),
        arrival: "23:00".into(),
    };
    assert!(!supervisor.ledger().is_available_for_booking(&first_seat.key()));
    assert_eq!(supervisor.ledger().booked_count(), 2);
    assert_eq!(supervisor.outcome().success_count, 2);
    assert!(supervisor.outcome().done);
}

#[tokio::test]
async fn test_checkout_failure_is_fatal_and_not_retried() {
    let mut scenario = scenario(vec![sim_train("301", "07:00", Some(0))]);
    scenario.fail_checkout = true;
    let site = SimulatedSite::new(scenario);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut supervisor = supervisor(&site, &notifier, &checkout_intent(1), fast_settings())
        .with_payment(Some(test_card()));

    let err = supervisor.run().await.unwrap_err();

    assert!(matches!(err, EngineError::Payment { .. }));
    assert!(err.is_fatal());
    assert_eq!(supervisor.state().phase, SessionPhase::Fatal);
    let log = site.log().await;
    assert_eq!(log.sessions_opened, 1);
    assert!(log.payments.is_empty());
    let last = notifier.last().unwrap();
    assert!(last.contains("*Manual intervention required!*"));
}

#[tokio::test]
async fn test_checkout_success_is_announced_before_finish() {
    let site = SimulatedSite::new(scenario(vec![sim_train("301", "07:00", Some(0))]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut supervisor = supervisor(&site, &notifier, &checkout_intent(1), fast_settings())
        .with_payment(Some(test_card()));

    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::Succeeded);
    assert_eq!(site.log().await.payments, vec!["301"]);
    let messages = notifier.messages();
    assert!(messages[0].contains("(auto payment)"));
    assert!(messages[2].contains("*Payment succeeded!*"));
    assert!(messages[3].contains("*Reservation finished*"));
}

#[tokio::test]
async fn test_card_is_not_used_without_checkout_opt_in() {
    let site = SimulatedSite::new(scenario(vec![sim_train("301", "07:00", Some(0))]));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut supervisor =
        supervisor(&site, &notifier, &intent(1), fast_settings()).with_payment(Some(test_card()));

    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::Succeeded);
    let log = site.log().await;
    assert_eq!(log.claims, vec!["301"]);
    assert!(log.payments.is_empty());
    assert!(notifier.messages()[0].contains("(manual payment)"));
    assert_eq!(notifier.count_containing("Payment"), 0);
}

#[tokio::test]
async fn test_silent_slack_does_not_hold_up_booking_or_payment() {
    let site = SimulatedSite::new(scenario(vec![
        sim_train("301", "07:00", None),
        sim_train("303", "08:00", Some(1)),
    ]));
    let slack = SlackNotifier::new(reqwest::Client::new(), "xoxb-test", "reservations")
        .with_url(silent_endpoint().await)
        .with_timeout(Duration::from_millis(100));
    let mut supervisor = SessionSupervisor::new(
        Arc::new(site.clone()),
        Arc::new(slack),
        resolve(&checkout_intent(2)),
        Credentials {
            id: "1234567890".into(),
            secret: "secret".into(),
        },
        fast_settings(),
    )
    .with_payment(Some(test_card()));

    let report = tokio::time::timeout(Duration::from_secs(10), supervisor.run())
        .await
        .expect("run should not wait on slack")
        .unwrap();

    assert_eq!(report.verdict, RunVerdict::Succeeded);
    let log = site.log().await;
    assert_eq!(log.claims, vec!["303"]);
    assert_eq!(log.payments, vec!["303"]);
}

#[tokio::test]
async fn test_restart_cap_gives_up() {
    let mut scenario = scenario(vec![sim_train("301", "07:00", Some(0))]);
    scenario.failed_logins = vec![1, 2, 3];
    let site = SimulatedSite::new(scenario);
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = Settings {
        restart: RestartPolicy {
            max_restarts: Some(2),
            ..RestartPolicy::immediate()
        },
        ..fast_settings()
    };
    let mut supervisor = supervisor(&site, &notifier, &intent(1), settings);

    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::GaveUp);
    assert_eq!(report.sessions_started, 3);
    assert_eq!(report.booked, 0);
    assert_eq!(notifier.count_containing("*Reservation started"), 0);
    assert!(notifier.last().unwrap().contains("*Gave up after 2 restarts*"));
}

#[tokio::test]
async fn test_unbounded_policy_outlasts_login_failures() {
    let mut scenario = scenario(vec![sim_train("301", "07:00", Some(0))]);
    scenario.failed_logins = vec![1, 2, 3, 4, 5];
    let site = SimulatedSite::new(scenario);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut supervisor = supervisor(&site, &notifier, &intent(1), fast_settings());

    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::Succeeded);
    assert_eq!(report.sessions_started, 6);
    assert_eq!(report.restarts, 5);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let site = SimulatedSite::new(scenario(vec![sim_train("301", "07:00", None)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = Settings {
        refresh_delay_ms: DelayRange::fixed(1_000),
        ..fast_settings()
    };
    let cancel = CancellationToken::new();
    let mut supervisor =
        supervisor(&site, &notifier, &intent(1), settings).with_cancel_token(cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        cancel.cancel();
    });
    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::Cancelled);
    assert_eq!(report.booked, 0);
    assert_eq!(site.log().await.polls, 3);
    assert_eq!(supervisor.state().phase, SessionPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let mut scenario = scenario(vec![sim_train("301", "07:00", Some(0))]);
    scenario.failed_logins = vec![1];
    let site = SimulatedSite::new(scenario);
    let notifier = Arc::new(RecordingNotifier::default());
    let settings = Settings {
        restart: RestartPolicy::default(),
        ..fast_settings()
    };
    let cancel = CancellationToken::new();
    let mut supervisor =
        supervisor(&site, &notifier, &intent(1), settings).with_cancel_token(cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });
    let report = supervisor.run().await.unwrap();

    assert_eq!(report.verdict, RunVerdict::Cancelled);
    assert_eq!(report.sessions_started, 1);
    assert_eq!(site.log().await.sessions_opened, 1);
}

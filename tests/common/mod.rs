#![allow(dead_code)]

use std::{path::Path, sync::Mutex};

use tokio::net::TcpListener;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use seat_hunter_lib::{
    automation::{AutomationClient, Scenario, SessionFactory, SimTrain, SimulatedSite},
    models::{EffectiveSearch, Passengers, PaymentDetails, SearchIntent},
    notify::Notifier,
    session::RestartPolicy,
    settings::{DelayRange, Settings},
};

/// Keeps every notification so tests can check order and content.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages()
            .iter()
            .filter(|message| message.contains(needle))
            .count()
    }

    pub fn last(&self) -> Option<String> {
        self.messages().last().cloned()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}

pub fn clock(text: &str) -> NaiveTime {
    NaiveTime::parse_from_str(text, "%H:%M").unwrap()
}

pub fn sim_train(number: &str, departure: &str, seat_opens_at: Option<u32>) -> SimTrain {
    SimTrain {
        category: "SRT".into(),
        number: number.into(),
        origin: "수서".into(),
        departure: departure.into(),
        destination: "부산".into(),
        arrival: "23:00".into(),
        seat_opens_at,
        seats: 1,
        lost_races: 0,
        waitlist_opens_at: None,
        unreadable_at: Vec::new(),
    }
}

pub fn scenario(trains: Vec<SimTrain>) -> Scenario {
    Scenario {
        trains,
        ..Scenario::default()
    }
}

pub fn fixture(name: &str) -> Scenario {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    Scenario::load(&path).unwrap()
}

pub fn intent(breadth: usize) -> SearchIntent {
    SearchIntent {
        departure_station: "수서".into(),
        arrival_station: "부산".into(),
        date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        min_hour: 6,
        breadth,
        desired_times: Vec::new(),
        passengers: Passengers::default(),
        waitlist: false,
        greedy: false,
        checkout: false,
    }
}

/// No pauses and unbounded immediate restarts.
pub fn fast_settings() -> Settings {
    Settings {
        refresh_delay_ms: DelayRange::fixed(0),
        dialog_timeout_ms: 0,
        restart: RestartPolicy::immediate(),
        ..Settings::default()
    }
}

pub fn test_card() -> PaymentDetails {
    PaymentDetails::parse("1234-5678-9012-3456\n12/30\n12\n900101\n").unwrap()
}

/// A logged-in session sitting on the results page for `search`.
pub async fn results_page(
    site: &SimulatedSite,
    search: &EffectiveSearch,
) -> Box<dyn AutomationClient> {
    let mut client = site.open_session().await.unwrap();
    client.login("1234567890", "secret").await.unwrap();
    client.navigate_to_search().await.unwrap();
    client.submit_search(search).await.unwrap();
    client
}

/// An HTTP endpoint that accepts connections and never answers.
pub async fn silent_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/api/chat.postMessage")
}

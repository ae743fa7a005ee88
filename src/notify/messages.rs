//! Operator-facing notification texts. Each one starts with a local
//! timestamp line; bold markers use Slack's `*...*`.

use crate::models::{EffectiveSearch, Train};
use crate::utils::now_stamp;

pub fn run_started(search: &EffectiveSearch, auto_checkout: bool) -> String {
    let passengers = search.passengers;
    format!(
        "{}\n*Reservation started ({} payment)*\n\
         Route: {}▶{}\n\
         Time: {} after {}:00{}\n\
         Breadth: {}{}\n\
         Passengers: adults({}) children({}) seniors({})\n\
         Waitlist: {}\n\
         Greedy: {}\n\
         Desired times: {}",
        now_stamp(),
        if auto_checkout { "auto" } else { "manual" },
        search.departure_station,
        search.arrival_station,
        search.date.format("%Y-%m-%d %a"),
        search.min_hour_label(),
        auto_marker(search.hour_auto),
        search.breadth,
        auto_marker(search.breadth_auto),
        passengers.adults,
        passengers.children,
        passengers.seniors,
        search.waitlist,
        search.greedy,
        search.desired_times_label(),
    )
}

pub fn booked(rank: usize, train: &Train, search: &EffectiveSearch) -> String {
    format!(
        "{}\n*Rank {} booked!*\n{}",
        now_stamp(),
        rank,
        train.describe(search.date)
    )
}

pub fn waitlisted(rank: usize, train: &Train, search: &EffectiveSearch) -> String {
    format!(
        "{}\n*Rank {} waitlisted!*\n{}",
        now_stamp(),
        rank,
        train.describe(search.date)
    )
}

pub fn payment_succeeded(train: &Train, search: &EffectiveSearch) -> String {
    format!(
        "{}\n*Payment succeeded!*\n{}",
        now_stamp(),
        train.describe(search.date)
    )
}

pub fn payment_failed(train: &Train, search: &EffectiveSearch) -> String {
    format!(
        "{}\n*Payment error!*\n*Manual intervention required!*\n{}",
        now_stamp(),
        train.describe(search.date)
    )
}

pub fn run_finished(success_count: usize) -> String {
    format!(
        "{}\n*Reservation finished* ({} booked)",
        now_stamp(),
        success_count
    )
}

pub fn gave_up(restarts: u32, last_error: &str) -> String {
    format!(
        "{}\n*Gave up after {} restarts*\nLast error: {}",
        now_stamp(),
        restarts,
        last_error
    )
}

fn auto_marker(auto: bool) -> &'static str {
    if auto {
        "(auto)"
    } else {
        ""
    }
}

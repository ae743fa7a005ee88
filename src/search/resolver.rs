use chrono::Timelike;

use crate::models::{EffectiveSearch, SearchIntent};

/// Breadth used when explicit departure times are given; desired slots can
/// rank low in the listing.
pub const AUTO_BREADTH: usize = 10;

/// How far (in hours) the requested hour may drift from the earliest desired
/// time before the search bucket is moved to it.
pub const HOUR_TOLERANCE: u8 = 2;

/// The listing only exposes even-hour search buckets.
pub fn even_hour_at_or_below(hour: u8) -> u8 {
    let hour = hour.min(23);
    hour - hour % 2
}

/// Normalizes loose user intent into the configuration submitted to the
/// listing. Inputs are already validated, so this cannot fail.
pub fn resolve(intent: &SearchIntent) -> EffectiveSearch {
    let mut min_hour = even_hour_at_or_below(intent.min_hour);
    let mut breadth = intent.breadth;
    let mut breadth_auto = false;
    let mut hour_auto = false;

    let mut desired_times = intent.desired_times.clone();
    desired_times.sort();
    desired_times.dedup();

    if let Some(earliest) = desired_times.first() {
        if breadth < AUTO_BREADTH {
            breadth = AUTO_BREADTH;
            breadth_auto = true;
        }

        let earliest_hour = earliest.hour() as u8;
        if min_hour.abs_diff(earliest_hour) > HOUR_TOLERANCE {
            min_hour = even_hour_at_or_below(earliest_hour);
            hour_auto = true;
        }
    }

    EffectiveSearch {
        departure_station: intent.departure_station.clone(),
        arrival_station: intent.arrival_station.clone(),
        date: intent.date,
        min_hour,
        breadth,
        desired_times,
        breadth_auto,
        hour_auto,
        passengers: intent.passengers,
        waitlist: intent.waitlist,
        greedy: intent.greedy,
        checkout: intent.checkout,
    }
}

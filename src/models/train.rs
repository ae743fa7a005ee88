//! One scraped row of the departure listing and its identity.

use std::fmt;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Identity of a physical departure. Built only by [`Train::key`].
///
/// Two scrapes of the same departure produce the same key across poll
/// cycles and across sessions; the ledger relies on nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrainKey(String);

impl fmt::Display for TrainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    /// Category / class label as shown in the listing (e.g. `SRT`).
    pub category: String,
    pub number: String,
    pub origin: String,
    /// Departure clock time exactly as scraped, `HH:MM`.
    pub departure: String,
    pub destination: String,
    pub arrival: String,
}

impl Train {
    /// Builds a train from the listing's combined "station time" cells,
    /// e.g. `"동탄 08:00"`.
    pub fn from_cells(
        category: &str,
        number: &str,
        departure_cell: &str,
        arrival_cell: &str,
    ) -> Result<Self> {
        let (origin, departure) = split_station_cell(departure_cell)?;
        let (destination, arrival) = split_station_cell(arrival_cell)?;
        Ok(Self {
            category: category.trim().to_string(),
            number: number.trim().to_string(),
            origin,
            departure,
            destination,
            arrival,
        })
    }

    /// Plain concatenation of the six identity fields, no normalization.
    pub fn key(&self) -> TrainKey {
        TrainKey(
            [
                self.category.as_str(),
                self.number.as_str(),
                self.origin.as_str(),
                self.departure.as_str(),
                self.destination.as_str(),
                self.arrival.as_str(),
            ]
            .concat(),
        )
    }

    pub fn departure_time(&self) -> Option<NaiveTime> {
        parse_clock(&self.departure)
    }

    /// Human readable summary used in notifications.
    pub fn describe(&self, date: NaiveDate) -> String {
        format!(
            "{} {}({})\n{} {} ▶ {} {}",
            date.format("%Y-%m-%d(%a)"),
            self.category,
            self.number,
            self.origin,
            self.departure,
            self.destination,
            self.arrival
        )
    }
}

fn split_station_cell(cell: &str) -> Result<(String, String)> {
    let mut parts = cell.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(station), Some(time), None) => Ok((station.to_string(), time.to_string())),
        _ => Err(anyhow!("malformed station cell '{cell}'")),
    }
}

/// Parses `H:MM` or `HH:MM`.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// State of a row's standard-seat cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeatAvailability {
    Bookable,
    SoldOut,
    /// Held by someone else or otherwise not offered.
    Unavailable,
}

/// State of a row's waitlist cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitlistAvailability {
    Open,
    Closed,
}

/// A candidate as observed in one poll cycle. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRow {
    pub rank: usize,
    pub train: Train,
    pub seat: SeatAvailability,
    pub waitlist: WaitlistAvailability,
}

//! Offline checks on raw user input. Everything here runs before the first
//! session is opened.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::models::train::parse_clock;

/// Stations served by the listing. A station may also be referred to by its
/// index in this list.
pub const STATIONS: &[&str] = &[
    "수서",
    "동탄",
    "평택지제",
    "천안아산",
    "오송",
    "대전",
    "김천(구미)",
    "동대구",
    "신경주",
    "울산(통도사)",
    "부산",
    "공주",
    "익산",
    "정읍",
    "광주송정",
    "나주",
    "목포",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown station '{0}'")]
    UnknownStation(String),
    #[error("departure and arrival are both '{0}'")]
    SameStation(String),
    #[error("invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),
    #[error("invalid hour '{0}', expected 0-23")]
    InvalidHour(String),
    #[error("invalid departure time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("breadth must be at least 1")]
    ZeroBreadth,
}

pub fn resolve_station(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();
    let name = if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        input
            .parse::<usize>()
            .ok()
            .and_then(|index| STATIONS.get(index).copied())
    } else {
        STATIONS.iter().copied().find(|station| *station == input)
    };
    name.map(str::to_string)
        .ok_or_else(|| ValidationError::UnknownStation(input.to_string()))
}

pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    if input.len() != 8 || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(input, "%Y%m%d")
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

pub fn parse_hour(input: &str) -> Result<u8, ValidationError> {
    input
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|hour| *hour < 24)
        .ok_or_else(|| ValidationError::InvalidHour(input.to_string()))
}

/// Parses a comma separated list such as `08:00,9:30`. Blank entries are
/// ignored so an empty string means "no explicit times".
pub fn parse_desired_times(csv: &str) -> Result<Vec<NaiveTime>, ValidationError> {
    csv.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_clock(entry).ok_or_else(|| ValidationError::InvalidTime(entry.to_string())))
        .collect()
}

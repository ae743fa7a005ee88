use std::path::PathBuf;

use clap::Parser;

use crate::{
    models::{Passengers, SearchIntent},
    search::validation::{
        parse_date, parse_desired_times, parse_hour, resolve_station, ValidationError,
    },
};

/// Watch the SRT departure listing and book seats as soon as they open.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Member number
    #[arg(long, value_name = "1234567890")]
    pub user: String,

    /// Password
    #[arg(long, env = "SEAT_HUNTER_PASSWORD", hide_env_values = true)]
    pub psw: String,

    /// Departure station, by name or index
    #[arg(long, value_name = "동탄")]
    pub dpt: String,

    /// Arrival station, by name or index
    #[arg(long, value_name = "동대구")]
    pub arr: String,

    /// Departure date
    #[arg(long, value_name = "YYYYMMDD")]
    pub dt: String,

    /// Earliest departure hour
    #[arg(long, value_name = "08", default_value = "00")]
    pub tm: String,

    /// Number of top-ranked trains to check each cycle
    #[arg(long, default_value_t = 2)]
    pub num: usize,

    #[arg(long, default_value_t = 1)]
    pub adult: u8,

    #[arg(long, default_value_t = 0)]
    pub kid: u8,

    #[arg(long, default_value_t = 0)]
    pub elder: u8,

    /// Only book these departures, e.g. "08:00,09:30"
    #[arg(long, value_name = "HH:MM,...", default_value = "")]
    pub exact_times: String,

    /// Card file; pays for every booking automatically when given
    #[arg(long, value_name = "my_card.txt")]
    pub checkout: Option<PathBuf>,

    /// Join the waitlist when seats are sold out
    #[arg(long)]
    pub reserve: bool,

    /// Keep booking until `--num` seats are held
    #[arg(long)]
    pub greedy: bool,

    /// Engine settings (JSON)
    #[arg(long, default_value = "seat-hunter.json")]
    pub settings: PathBuf,

    /// Listing scenario (JSON) for the simulated site
    #[arg(long)]
    pub scenario: Option<PathBuf>,
}

impl Cli {
    pub fn to_intent(&self) -> Result<SearchIntent, ValidationError> {
        let departure_station = resolve_station(&self.dpt)?;
        let arrival_station = resolve_station(&self.arr)?;
        if departure_station == arrival_station {
            return Err(ValidationError::SameStation(departure_station));
        }
        if self.num == 0 {
            return Err(ValidationError::ZeroBreadth);
        }

        Ok(SearchIntent {
            departure_station,
            arrival_station,
            date: parse_date(&self.dt)?,
            min_hour: parse_hour(&self.tm)?,
            breadth: self.num,
            desired_times: parse_desired_times(&self.exact_times)?,
            passengers: Passengers {
                adults: self.adult,
                children: self.kid,
                seniors: self.elder,
            },
            waitlist: self.reserve,
            greedy: self.greedy,
            checkout: self.checkout.is_some(),
        })
    }
}

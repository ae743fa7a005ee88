pub mod outcome;
pub mod payment;
pub mod search;
pub mod train;

pub use outcome::RunOutcome;
pub use payment::PaymentDetails;
pub use search::{EffectiveSearch, Passengers, SearchIntent};
pub use train::{ListingRow, SeatAvailability, Train, TrainKey, WaitlistAvailability};

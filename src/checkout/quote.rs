//! Rental pricing

use crate::types::dates::RentalPeriod;
use crate::types::Price;

/// Price quote for a vehicle over a rental period.
///
/// Pure and deterministic; recomputed whenever either date changes. A
/// `RentalPeriod` cannot represent an empty or inverted range, so the quote
/// is always for at least one day.
#[derive(Debug, Clone, PartialEq)]
pub struct RentalQuote {
    /// Number of chargeable days.
    pub days:       u32,
    /// Daily rate the quote was computed from.
    pub daily_rate: Price,
    /// Total cost (days x daily rate).
    pub total:      Price,
}

impl RentalQuote {
    /// Calculates the quote for a daily rate over a period.
    #[must_use]
    pub fn calculate(daily_rate: &Price, period: &RentalPeriod) -> Self {
        let days = period.duration_days();
        Self { days, daily_rate: daily_rate.clone(), total: daily_rate.times(days) }
    }
}

//! Rental period dates

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{CheckoutError, CheckoutResult};

/// A rental date range: pick-up date to return date.
///
/// Calendar dates only, no time component. The constructor enforces that the
/// return date is strictly after the pick-up date, so a constructed period
/// always has a duration of at least one chargeable day. Deserialization
/// goes through the same check, which keeps a hand-edited or corrupted
/// draft slot from smuggling an inverted range back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct RentalPeriod {
    start: NaiveDate,
    end:   NaiveDate,
}

#[derive(Deserialize)]
struct RawPeriod {
    start: NaiveDate,
    end:   NaiveDate,
}

impl TryFrom<RawPeriod> for RentalPeriod {
    type Error = CheckoutError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl RentalPeriod {
    /// Creates a period, rejecting ranges where the return date is not
    /// strictly after the pick-up date.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CheckoutResult<Self> {
        if end <= start {
            return Err(CheckoutError::ReturnBeforePickup);
        }
        Ok(Self { start, end })
    }

    /// Pick-up date.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Return date.
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of chargeable days. Always at least 1.
    #[must_use]
    pub fn duration_days(&self) -> u32 {
        // end > start is guaranteed, so the difference is positive.
        (self.end - self.start).num_days() as u32
    }

    /// Whether the pick-up date is before the given day.
    #[must_use]
    pub fn starts_before(&self, today: NaiveDate) -> bool {
        self.start < today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_five_day_rental() {
        let period = RentalPeriod::new(date(2024, 6, 15), date(2024, 6, 20)).expect("valid period");
        assert_eq!(period.duration_days(), 5);
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let result = RentalPeriod::new(date(2024, 6, 20), date(2024, 6, 15));
        assert_eq!(result, Err(CheckoutError::ReturnBeforePickup));
    }

    #[test]
    fn test_same_day_return_is_rejected() {
        let result = RentalPeriod::new(date(2024, 6, 15), date(2024, 6, 15));
        assert_eq!(result, Err(CheckoutError::ReturnBeforePickup));
    }

    #[test]
    fn test_overnight_rental_is_one_day() {
        let period = RentalPeriod::new(date(2024, 6, 15), date(2024, 6, 16)).expect("valid period");
        assert_eq!(period.duration_days(), 1);
    }

    #[test]
    fn test_starts_before_today() {
        let period = RentalPeriod::new(date(2024, 6, 15), date(2024, 6, 20)).expect("valid period");
        assert!(period.starts_before(date(2024, 6, 16)));
        assert!(!period.starts_before(date(2024, 6, 15)));
        assert!(!period.starts_before(date(2024, 6, 10)));
    }

    #[test]
    fn test_deserialization_rejects_inverted_range() {
        let json = r#"{"start":"2024-06-20","end":"2024-06-15"}"#;
        let result: Result<RentalPeriod, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let period = RentalPeriod::new(date(2024, 6, 15), date(2024, 6, 20)).expect("valid period");
        let json = serde_json::to_string(&period).expect("serialize");
        let back: RentalPeriod = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(period, back);
    }
}

//! Calendar month used as the ledger key.

use std::fmt;

use chrono::NaiveDate;

use crate::ledger::error::LedgerError;

/// Earliest year accepted for a ledger period.
pub const MIN_YEAR: i32 = 1970;
/// Latest year accepted for a ledger period.
pub const MAX_YEAR: i32 = 2100;

/// A (month, year) pair. Months are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Validate and build a period.
    pub fn new(month: u32, year: i32) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::invalid_period(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(LedgerError::invalid_period(format!(
                "year must be between {} and {}, got {}",
                MIN_YEAR, MAX_YEAR, year
            )));
        }
        Ok(Self { year, month })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month before this one, wrapping January to December of the prior
    /// year. The result may fall before [`MIN_YEAR`]; it is only ever used as
    /// a lookup key.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The month after this one, wrapping December to January.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("period month and year are always in range")
    }

    /// First day of the following month; the exclusive upper bound of the
    /// period.
    pub fn next_first_day(&self) -> NaiveDate {
        self.next().first_day()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next_first_day()
            .pred_opt()
            .expect("first day of a month always has a predecessor")
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date < self.next_first_day()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_month_out_of_range() {
        assert!(Period::new(0, 2024).is_err());
        assert!(Period::new(13, 2024).is_err());
        assert!(Period::new(12, 2024).is_ok());
    }

    #[test]
    fn rejects_implausible_year() {
        let err = Period::new(5, 1850).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(Period::new(5, 3000).is_err());
    }

    #[test]
    fn previous_wraps_january_to_december() {
        let jan = Period::new(1, 2024).unwrap();
        let prev = jan.previous();
        assert_eq!(prev.month(), 12);
        assert_eq!(prev.year(), 2023);

        let jun = Period::new(6, 2024).unwrap();
        assert_eq!(jun.previous(), Period::new(5, 2024).unwrap());
    }

    #[test]
    fn next_wraps_december_to_january() {
        let dec = Period::new(12, 2023).unwrap();
        assert_eq!(dec.next(), Period::new(1, 2024).unwrap());
    }

    #[test]
    fn last_day_handles_leap_february() {
        assert_eq!(Period::new(2, 2024).unwrap().last_day(), date(2024, 2, 29));
        assert_eq!(Period::new(2, 2023).unwrap().last_day(), date(2023, 2, 28));
        assert_eq!(Period::new(12, 2023).unwrap().last_day(), date(2023, 12, 31));
    }

    #[test]
    fn contains_is_bounded_by_the_month() {
        let p = Period::new(3, 2024).unwrap();
        assert!(p.contains(date(2024, 3, 1)));
        assert!(p.contains(date(2024, 3, 31)));
        assert!(!p.contains(date(2024, 2, 29)));
        assert!(!p.contains(date(2024, 4, 1)));
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(Period::new(4, 2024).unwrap().to_string(), "2024-04");
    }
}

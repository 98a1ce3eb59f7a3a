use jiff::civil::Date;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("current reading ({current}) must not be less than previous reading ({previous})")]
pub struct ReadingOrderError {
    pub previous: u64,
    pub current: u64,
}

/// A pair of meter readings bounding one billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingPair {
    pub previous: u64,
    pub current: u64,
}

impl ReadingPair {
    /// Units consumed between the two readings. A current reading below the
    /// previous reading is a data-entry error, not a negative bill, so it is
    /// rejected instead of being fed to the tariff.
    pub fn consumption(&self) -> Result<u64, ReadingOrderError> {
        if self.current < self.previous {
            return Err(ReadingOrderError {
                previous: self.previous,
                current: self.current,
            });
        }
        Ok(self.current - self.previous)
    }
}

/// One row of a reading-history export from the citizen portal.
#[derive(Debug)]
pub struct ReadingEntry {
    pub connection: String,
    pub date: Date,
    pub readings: ReadingPair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumption_is_reading_difference() {
        let pair = ReadingPair {
            previous: 1200,
            current: 1245,
        };
        assert_eq!(pair.consumption(), Ok(45));
    }

    #[test]
    fn equal_readings_mean_zero_consumption() {
        let pair = ReadingPair {
            previous: 4562,
            current: 4562,
        };
        assert_eq!(pair.consumption(), Ok(0));
    }

    #[test]
    fn rolled_back_reading_is_rejected() {
        let pair = ReadingPair {
            previous: 100,
            current: 90,
        };
        let err = pair.consumption().unwrap_err();
        assert_eq!(
            err.to_string(),
            "current reading (90) must not be less than previous reading (100)"
        );
    }
}

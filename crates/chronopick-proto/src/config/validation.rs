use masterror::AppError;
use thiserror::Error;

use super::{DateIntervalConfig, PickerConfig};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Errors returned when validating a [`PickerConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// `min_date` is chronologically after `max_date`.
    #[error("min_date {min} is after max_date {max}")]
    InvertedDateBounds { min: String, max: String },

    /// An exclude/include interval has `start` after `end`.
    #[error("interval start {start} is after its end {end}")]
    InvertedInterval { start: String, end: String },

    /// Only one of `min_time`/`max_time` was provided; the time-range check
    /// needs both bounds.
    #[error("min_time and max_time must be provided together")]
    OneSidedTimeBounds,

    /// `time_intervals` must be a positive divisor of a day in minutes.
    #[error("time_intervals {value} does not evenly divide a day")]
    InvalidTimeIntervals { value: u32 },

    /// `year_item_number` must be positive.
    #[error("year_item_number must be positive")]
    ZeroYearItemNumber,
}

impl From<ConfigValidationError> for AppError {
    fn from(err: ConfigValidationError) -> Self {
        AppError::internal(err.to_string())
    }
}

impl PickerConfig {
    /// Validates the configuration, ensuring bounds and intervals are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] if date bounds or intervals are
    /// inverted, if only one time bound is given, or if a paging/stepping
    /// parameter is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronopick_proto::config::PickerConfig;
    ///
    /// let config = PickerConfig::default();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let (Some(min), Some(max)) = (self.min_date, self.max_date) {
            if min > max {
                return Err(ConfigValidationError::InvertedDateBounds {
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
        }

        let intervals = self
            .exclude_date_intervals
            .iter()
            .flatten()
            .chain(self.include_date_intervals.iter().flatten());

        for DateIntervalConfig { start, end } in intervals {
            if start > end {
                return Err(ConfigValidationError::InvertedInterval {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }

        if self.min_time.is_some() != self.max_time.is_some() {
            return Err(ConfigValidationError::OneSidedTimeBounds);
        }

        if self.time_intervals == 0 || !MINUTES_PER_DAY.is_multiple_of(self.time_intervals) {
            return Err(ConfigValidationError::InvalidTimeIntervals {
                value: self.time_intervals,
            });
        }

        if self.year_item_number == 0 {
            return Err(ConfigValidationError::ZeroYearItemNumber);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn default_config_is_valid() {
        assert!(PickerConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_date_bounds_are_rejected() {
        let config = PickerConfig {
            min_date: Some(date(2024, 6, 1)),
            max_date: Some(date(2024, 1, 1)),
            ..PickerConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvertedDateBounds { .. })
        ));
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let config = PickerConfig {
            include_date_intervals: Some(vec![DateIntervalConfig {
                start: date(2024, 3, 10),
                end: date(2024, 3, 1),
            }]),
            ..PickerConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvertedInterval { .. })
        ));
    }

    #[test]
    fn one_sided_time_bounds_are_rejected() {
        let config = PickerConfig {
            min_time: NaiveTime::from_hms_opt(9, 0, 0),
            ..PickerConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::OneSidedTimeBounds)
        );
    }

    #[test]
    fn uneven_time_intervals_are_rejected() {
        let config = PickerConfig {
            time_intervals: 7,
            ..PickerConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidTimeIntervals { value: 7 })
        );
    }

    #[test]
    fn zero_year_item_number_is_rejected() {
        let config = PickerConfig {
            year_item_number: 0,
            ..PickerConfig::default()
        };

        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroYearItemNumber)
        );
    }
}

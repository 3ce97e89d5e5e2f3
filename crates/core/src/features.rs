//! Fixed-shape feature record consumed by amount models.
//!
//! Field order matches the column order the regressors were trained on:
//!
//! | idx | feature              |
//! |-----|----------------------|
//! | 0   | avg_amount           |
//! | 1   | median_amount        |
//! | 2   | amount_std           |
//! | 3   | transaction_count    |
//! | 4   | avg_hour             |
//! | 5   | weekend_ratio        |
//! | 6   | days_since_first     |
//! | 7   | category_code        |
//! | 8   | receiver_type_code   |
//! | 9   | location_code        |
//! | 10  | payment_method_code  |
//! | 11  | hour                 |
//! | 12  | late_or_early_hour   |
//! | 13  | month                |
//! | 14  | day                  |

use crate::types::UserProfile;
use chrono::{Datelike, NaiveDate};
use ndarray::Array1;
use serde::Serialize;
use thiserror::Error;

/// Number of features in a [`FeatureRecord`].
pub const FEATURE_COUNT: usize = 15;

/// Placeholder for days since the user's first transaction; profiles do not
/// carry a first-seen date.
pub const DAYS_SINCE_FIRST_PLACEHOLDER: f64 = 30.0;

/// Column names in training order. Index 12 keeps its training-time name
/// `is_weekend` even though it is derived from the hour of day.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "avg_amount",
    "median_amount",
    "amount_std",
    "transaction_count",
    "avg_hour",
    "weekend_ratio",
    "days_since_first",
    "category_encoded",
    "receiver_type_encoded",
    "location_encoded",
    "payment_method_encoded",
    "hour",
    "is_weekend",
    "month",
    "day",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("hour {0} is outside 0-23")]
    HourOutOfRange(i64),

    #[error("feature '{name}' is not finite ({value})")]
    NonFinite { name: &'static str, value: f64 },
}

/// Integer codes for the four categorical request fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodedContext {
    pub category: i64,
    pub receiver_type: i64,
    pub location: i64,
    pub payment_method: i64,
}

/// One request's model input. Fields are readable everywhere, but outside
/// this crate a record can only come from [`FeatureRecord::build`]:
///
/// ```compile_fail
/// let record = upi_core::features::FeatureRecord {
///     avg_amount: 1.0,
///     median_amount: 1.0,
///     amount_std: 1.0,
///     transaction_count: 1.0,
///     avg_hour: 1.0,
///     weekend_ratio: 1.0,
///     days_since_first: 30.0,
///     category_code: 0.0,
///     receiver_type_code: 0.0,
///     location_code: 0.0,
///     payment_method_code: 0.0,
///     hour: 99.0,
///     late_or_early_hour: 0.0,
///     month: 1.0,
///     day: 1.0,
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[non_exhaustive]
pub struct FeatureRecord {
    pub avg_amount: f64,
    pub median_amount: f64,
    pub amount_std: f64,
    pub transaction_count: f64,
    pub avg_hour: f64,
    pub weekend_ratio: f64,
    pub days_since_first: f64,
    pub category_code: f64,
    pub receiver_type_code: f64,
    pub location_code: f64,
    pub payment_method_code: f64,
    pub hour: f64,
    /// 1 when `hour >= 18 || hour <= 6`. Trained under the name `is_weekend`,
    /// but it measures time of day, not day of week.
    pub late_or_early_hour: f64,
    pub month: f64,
    pub day: f64,
}

impl FeatureRecord {
    /// Assemble and validate a record from a profile, encoded request fields,
    /// the request hour and the calendar date of the request.
    pub fn build(
        profile: &UserProfile,
        encoded: EncodedContext,
        hour: i64,
        date: NaiveDate,
    ) -> Result<Self, FeatureError> {
        if !(0..=23).contains(&hour) {
            return Err(FeatureError::HourOutOfRange(hour));
        }

        let record = Self {
            avg_amount: profile.avg_amount,
            median_amount: profile.median_amount,
            amount_std: profile.amount_std,
            transaction_count: profile.transaction_count as f64,
            avg_hour: profile.avg_hour,
            weekend_ratio: profile.weekend_ratio,
            days_since_first: DAYS_SINCE_FIRST_PLACEHOLDER,
            category_code: encoded.category as f64,
            receiver_type_code: encoded.receiver_type as f64,
            location_code: encoded.location as f64,
            payment_method_code: encoded.payment_method as f64,
            hour: hour as f64,
            late_or_early_hour: if hour >= 18 || hour <= 6 { 1.0 } else { 0.0 },
            month: date.month() as f64,
            day: date.day() as f64,
        };

        for (name, value) in FEATURE_NAMES.into_iter().zip(record.to_array()) {
            if !value.is_finite() {
                return Err(FeatureError::NonFinite { name, value });
            }
        }

        Ok(record)
    }

    /// Values in training column order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.avg_amount,
            self.median_amount,
            self.amount_std,
            self.transaction_count,
            self.avg_hour,
            self.weekend_ratio,
            self.days_since_first,
            self.category_code,
            self.receiver_type_code,
            self.location_code,
            self.payment_method_code,
            self.hour,
            self.late_or_early_hour,
            self.month,
            self.day,
        ]
    }

    pub fn to_ndarray(&self) -> Array1<f64> {
        Array1::from(self.to_array().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            avg_amount: 300.0,
            median_amount: 250.0,
            amount_std: 80.0,
            transaction_count: 40,
            avg_hour: 13.5,
            weekend_ratio: 0.25,
            cluster: Some(2),
            preferred_category: Some("Food & Dining".to_string()),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 9).unwrap()
    }

    #[test]
    fn test_build_orders_fields() {
        let encoded = EncodedContext {
            category: 3,
            receiver_type: 1,
            location: 5,
            payment_method: 2,
        };
        let record = FeatureRecord::build(&profile(), encoded, 13, date()).unwrap();
        assert_eq!(
            record.to_array(),
            [300.0, 250.0, 80.0, 40.0, 13.5, 0.25, 30.0, 3.0, 1.0, 5.0, 2.0, 13.0, 0.0, 12.0, 9.0]
        );
        assert_eq!(record.to_ndarray().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_late_or_early_hour_flag() {
        let flag = |hour| {
            FeatureRecord::build(&profile(), EncodedContext::default(), hour, date())
                .unwrap()
                .late_or_early_hour
        };
        assert_eq!(flag(0), 1.0);
        assert_eq!(flag(6), 1.0);
        assert_eq!(flag(7), 0.0);
        assert_eq!(flag(17), 0.0);
        assert_eq!(flag(18), 1.0);
        assert_eq!(flag(23), 1.0);
    }

    #[test]
    fn test_rejects_out_of_range_hour() {
        let err = FeatureRecord::build(&profile(), EncodedContext::default(), 24, date());
        assert_eq!(err, Err(FeatureError::HourOutOfRange(24)));
        let err = FeatureRecord::build(&profile(), EncodedContext::default(), -1, date());
        assert_eq!(err, Err(FeatureError::HourOutOfRange(-1)));
    }

    #[test]
    fn test_rejects_non_finite_profile_values() {
        let mut bad = profile();
        bad.amount_std = f64::NAN;
        match FeatureRecord::build(&bad, EncodedContext::default(), 12, date()) {
            Err(FeatureError::NonFinite { name, .. }) => assert_eq!(name, "amount_std"),
            other => panic!("expected NonFinite, got {other:?}"),
        }
    }
}

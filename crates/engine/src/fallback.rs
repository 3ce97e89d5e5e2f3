//! Category-average recommendations for users without usable history.

use crate::jitter::UniformJitter;
use crate::predictor::clamp_amount;
use upi_core::types::{round_to, Recommendation};

pub const NEW_USER_ID: &str = "NEW_USER";
pub const FALLBACK_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_CATEGORY_AVERAGE: f64 = 500.0;
pub const NEW_USER_NOTE: &str = "Recommendation based on category average (new user)";

/// Typical ticket size per category.
pub const CATEGORY_AVERAGES: [(&str, f64); 10] = [
    ("Food & Dining", 250.0),
    ("Transportation", 120.0),
    ("Shopping", 800.0),
    ("Bills & Utilities", 650.0),
    ("Entertainment", 400.0),
    ("Healthcare", 800.0),
    ("Education", 2000.0),
    ("Groceries", 350.0),
    ("Fuel", 500.0),
    ("Transfer to Friends", 1500.0),
];

pub fn category_average(category: &str) -> f64 {
    CATEGORY_AVERAGES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, amount)| *amount)
        .unwrap_or(DEFAULT_CATEGORY_AVERAGE)
}

/// Category average scaled by `U(0.8, 1.2)`, marked as a non-personalized
/// estimate.
pub fn category_fallback(category: &str, jitter: &UniformJitter) -> Recommendation {
    let amount = clamp_amount(category_average(category) * jitter.sample());

    Recommendation {
        user_id: NEW_USER_ID.to_string(),
        recommended_amount: round_to(amount, 2),
        user_cluster: 0,
        confidence: FALLBACK_CONFIDENCE,
        user_avg_spending: 0.0,
        category: category.to_string(),
        context: None,
        note: Some(NEW_USER_NOTE.to_string()),
    }
}

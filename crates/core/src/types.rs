use serde::{Deserialize, Deserializer, Serialize};

/// Historical spend statistics for one user, loaded from the profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub avg_amount: f64,
    pub median_amount: f64,
    pub amount_std: f64,
    #[serde(deserialize_with = "de_count")]
    pub transaction_count: u64,
    pub avg_hour: f64,
    pub weekend_ratio: f64,
    /// Precomputed behavioural segment, expected in 0..=4.
    #[serde(default, deserialize_with = "de_opt_int")]
    pub cluster: Option<i64>,
    #[serde(default)]
    pub preferred_category: Option<String>,
}

impl UserProfile {
    pub fn cluster_id(&self) -> i64 {
        self.cluster.unwrap_or(0)
    }
}

/// One row of the historical transaction table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub user_id: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
}

/// Per-request transaction context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionContext {
    pub category: String,
    #[serde(default = "default_receiver_type")]
    pub receiver_type: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default = "default_hour")]
    pub hour: i64,
}

impl TransactionContext {
    /// Context for `category` with every other field at its default.
    pub fn for_category(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            receiver_type: default_receiver_type(),
            location: default_location(),
            payment_method: default_payment_method(),
            hour: default_hour(),
        }
    }
}

/// A recommendation request: who is paying, and in what context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub context: TransactionContext,
}

impl RecommendRequest {
    pub fn new(user_id: impl Into<String>, context: TransactionContext) -> Self {
        Self {
            user_id: user_id.into(),
            context,
        }
    }
}

/// Echo of the request context attached to personalized recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationContext {
    pub location: String,
    /// Hour formatted as `HH:00`.
    pub time: String,
    pub payment_method: String,
}

/// Recommended amount for one request, in its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub user_id: String,
    pub recommended_amount: f64,
    pub user_cluster: i64,
    pub confidence: f64,
    pub user_avg_spending: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<RecommendationContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// How a recommendation was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    /// Model (or statistical baseline) applied to the user's own history.
    Personalized(Recommendation),
    /// User absent from the profile table; category average used.
    NewUser(Recommendation),
    /// Known user, but personalization failed; category average used.
    Degraded {
        recommendation: Recommendation,
        reason: String,
    },
}

impl RecommendationOutcome {
    pub fn recommendation(&self) -> &Recommendation {
        match self {
            RecommendationOutcome::Personalized(r) | RecommendationOutcome::NewUser(r) => r,
            RecommendationOutcome::Degraded { recommendation, .. } => recommendation,
        }
    }

    pub fn into_recommendation(self) -> Recommendation {
        match self {
            RecommendationOutcome::Personalized(r) | RecommendationOutcome::NewUser(r) => r,
            RecommendationOutcome::Degraded { recommendation, .. } => recommendation,
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            RecommendationOutcome::Personalized(_) => OutcomeKind::Personalized,
            RecommendationOutcome::NewUser(_) => OutcomeKind::NewUser,
            RecommendationOutcome::Degraded { .. } => OutcomeKind::Degraded,
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, RecommendationOutcome::Personalized(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Personalized,
    NewUser,
    Degraded,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Personalized => "personalized",
            OutcomeKind::NewUser => "new_user",
            OutcomeKind::Degraded => "degraded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingProfile {
    pub avg_amount: f64,
    pub total_transactions: u64,
    pub spending_consistency: f64,
    pub preferred_category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorPatterns {
    pub typical_hour: f64,
    /// Share of weekend transactions, e.g. `"28.6%"`.
    pub weekend_activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSegment {
    pub cluster_id: i64,
    pub cluster_name: String,
}

/// Descriptive summary of a known user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInsight {
    pub user_id: String,
    pub spending_profile: SpendingProfile,
    pub behavior_patterns: BehaviorPatterns,
    pub user_segment: UserSegment,
}

/// Result of an insight lookup. `NotFound` serializes as
/// `{"error": "User not found"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightLookup {
    Found(UserInsight),
    NotFound { error: String },
}

impl InsightLookup {
    pub fn not_found() -> Self {
        InsightLookup::NotFound {
            error: "User not found".to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, InsightLookup::Found(_))
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn default_receiver_type() -> String {
    "Merchant".to_string()
}
fn default_location() -> String {
    "Mumbai".to_string()
}
fn default_payment_method() -> String {
    "PhonePe".to_string()
}
fn default_hour() -> i64 {
    14
}

// Tabular exports write integer columns as floats ("12.0"); accept both.
fn de_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a non-negative integer count, got {value}"
        )))
    }
}

fn de_opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(value) if value.is_finite() && value.fract() == 0.0 => Ok(Some(value as i64)),
        Some(value) => Err(serde::de::Error::custom(format!(
            "expected an integer cluster id, got {value}"
        ))),
        None => Ok(None),
    }
}

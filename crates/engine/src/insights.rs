//! Descriptive insights over the profile table.

use crate::engine::EngineConfig;
use std::sync::Arc;
use tracing::warn;
use upi_core::types::{
    round_to, BehaviorPatterns, InsightLookup, SpendingProfile, UserInsight, UserProfile,
    UserSegment,
};
use upi_store::profiles::ProfileLookup;

/// Segment labels, indexed by cluster id.
pub const CLUSTER_LABELS: [&str; 5] = [
    "Conservative Spenders",
    "High-Value Users",
    "Frequent Small Transactions",
    "Active Users",
    "Balanced Spenders",
];

pub const UNKNOWN_LABEL: &str = "Unknown";

pub fn cluster_name(cluster_id: i64) -> &'static str {
    usize::try_from(cluster_id)
        .ok()
        .and_then(|idx| CLUSTER_LABELS.get(idx))
        .copied()
        .unwrap_or(UNKNOWN_LABEL)
}

pub struct UserInsightService {
    config: Arc<EngineConfig>,
}

impl UserInsightService {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Summarize `user_id`'s profile. Absent users, and users whose profile
    /// row could not be parsed, yield the not-found sentinel.
    pub fn insights(&self, user_id: &str) -> InsightLookup {
        match self.config.profiles.lookup(user_id) {
            ProfileLookup::Found(profile) => InsightLookup::Found(summarize(user_id, profile)),
            ProfileLookup::Malformed(reason) => {
                warn!(user_id = %user_id, reason = %reason, "Insights requested for malformed profile");
                InsightLookup::not_found()
            }
            ProfileLookup::Missing => InsightLookup::not_found(),
        }
    }
}

fn summarize(user_id: &str, profile: &UserProfile) -> UserInsight {
    let cluster_id = profile.cluster_id();

    UserInsight {
        user_id: user_id.to_string(),
        spending_profile: SpendingProfile {
            avg_amount: round_to(profile.avg_amount, 2),
            total_transactions: profile.transaction_count,
            spending_consistency: round_to(profile.amount_std, 2),
            preferred_category: profile
                .preferred_category
                .clone()
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        },
        behavior_patterns: BehaviorPatterns {
            typical_hour: round_to(profile.avg_hour, 1),
            weekend_activity: format!("{:.1}%", profile.weekend_ratio * 100.0),
        },
        user_segment: UserSegment {
            cluster_id,
            cluster_name: cluster_name(cluster_id).to_string(),
        },
    }
}

//! Recommendation engine. Looks up the user's profile, builds the feature
//! record, runs the predictor and scores confidence. Falls back to the
//! category average whenever personalization is impossible.

use crate::encoder::FeatureEncoder;
use crate::fallback::category_fallback;
use crate::jitter::UniformJitter;
use crate::predictor::AmountPredictor;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info, warn};
use upi_core::config::AppConfig;
use upi_core::features::FeatureRecord;
use upi_core::inference::AmountModel;
use upi_core::types::{
    round_to, RecommendRequest, Recommendation, RecommendationContext, RecommendationOutcome,
    TransactionContext, UserProfile,
};
use upi_core::RecommenderResult;
use upi_store::profiles::ProfileLookup;
use upi_store::ProfileStore;

/// Confidence never exceeds this, however long the history.
pub const MAX_CONFIDENCE: f64 = 0.95;
const BASE_CONFIDENCE: f64 = 0.6;
const TRANSACTIONS_PER_CONFIDENCE_UNIT: f64 = 50.0;

/// `min(0.95, 0.6 + transaction_count / 50)`.
pub fn confidence_for(transaction_count: u64) -> f64 {
    (BASE_CONFIDENCE + transaction_count as f64 / TRANSACTIONS_PER_CONFIDENCE_UNIT)
        .min(MAX_CONFIDENCE)
}

/// Everything the engine reads, assembled once at startup and never mutated.
pub struct EngineConfig {
    pub profiles: ProfileStore,
    pub encoder: FeatureEncoder,
    /// `None` switches every known-user request to the statistical baseline.
    pub model: Option<Arc<dyn AmountModel>>,
}

impl EngineConfig {
    pub fn new(
        profiles: ProfileStore,
        encoder: FeatureEncoder,
        model: Option<Arc<dyn AmountModel>>,
    ) -> Self {
        Self {
            profiles,
            encoder,
            model,
        }
    }

    /// Load the profile table and the optional trained artifacts named in
    /// `config`. Any missing or unreadable source is fatal.
    pub fn load(config: &AppConfig) -> RecommenderResult<Self> {
        let profiles = ProfileStore::load(&config.data.profiles_path)?;

        let encoder = match &config.model.encoders_path {
            Some(path) => FeatureEncoder::load(path)?,
            None => {
                info!("No encoder tables configured, categorical fields encode to 0");
                FeatureEncoder::default()
            }
        };

        let model = match &config.model.model_path {
            Some(path) => Some(upi_inference::load_model(path)?),
            None => {
                warn!("No trained model configured, using the statistical baseline");
                None
            }
        };

        Ok(Self::new(profiles, encoder, model))
    }
}

pub struct RecommendationEngine {
    config: Arc<EngineConfig>,
    predictor: AmountPredictor,
    jitter: Arc<UniformJitter>,
}

impl RecommendationEngine {
    pub fn new(config: Arc<EngineConfig>, jitter: UniformJitter) -> Self {
        let jitter = Arc::new(jitter);
        let predictor = AmountPredictor::new(config.model.clone(), jitter.clone());

        info!(
            profiles = config.profiles.len(),
            model = predictor.model_name(),
            "Recommendation engine initialized"
        );

        Self {
            config,
            predictor,
            jitter,
        }
    }

    /// Recommend an amount for `request`, dated today (local time).
    pub fn recommend(&self, request: &RecommendRequest) -> RecommendationOutcome {
        self.recommend_on(request, Local::now().date_naive())
    }

    /// Recommend an amount for `request` as if it were made on `date`.
    pub fn recommend_on(&self, request: &RecommendRequest, date: NaiveDate) -> RecommendationOutcome {
        let user_id = request.user_id.as_str();
        let context = &request.context;

        match self.config.profiles.lookup(user_id) {
            ProfileLookup::Missing => {
                debug!(user_id = %user_id, category = %context.category, "Unknown user, using category average");
                metrics::counter!("recommendations.new_user").increment(1);
                RecommendationOutcome::NewUser(self.fallback_recommend(&context.category))
            }
            ProfileLookup::Malformed(reason) => {
                self.degrade(user_id, context, format!("malformed profile row: {reason}"))
            }
            ProfileLookup::Found(profile) => {
                match self.personalize(user_id, profile, context, date) {
                    Ok(recommendation) => {
                        metrics::counter!("recommendations.personalized").increment(1);
                        RecommendationOutcome::Personalized(recommendation)
                    }
                    Err(e) => self.degrade(user_id, context, e.to_string()),
                }
            }
        }
    }

    /// Category-average recommendation for a user with no usable history.
    pub fn fallback_recommend(&self, category: &str) -> Recommendation {
        category_fallback(category, &self.jitter)
    }

    fn personalize(
        &self,
        user_id: &str,
        profile: &UserProfile,
        context: &TransactionContext,
        date: NaiveDate,
    ) -> RecommenderResult<Recommendation> {
        let encoded = self.config.encoder.encode_context(context);
        let features = FeatureRecord::build(profile, encoded, context.hour, date)?;
        let amount = self.predictor.predict(&features, profile.avg_amount)?;

        Ok(Recommendation {
            user_id: user_id.to_string(),
            recommended_amount: round_to(amount, 2),
            user_cluster: profile.cluster_id(),
            confidence: confidence_for(profile.transaction_count),
            user_avg_spending: round_to(profile.avg_amount, 2),
            category: context.category.clone(),
            context: Some(RecommendationContext {
                location: context.location.clone(),
                time: format!("{:02}:00", context.hour),
                payment_method: context.payment_method.clone(),
            }),
            note: None,
        })
    }

    fn degrade(
        &self,
        user_id: &str,
        context: &TransactionContext,
        reason: String,
    ) -> RecommendationOutcome {
        warn!(
            user_id = %user_id,
            category = %context.category,
            reason = %reason,
            "Personalized recommendation failed, falling back to category average"
        );
        metrics::counter!("recommendations.degraded").increment(1);
        RecommendationOutcome::Degraded {
            recommendation: self.fallback_recommend(&context.category),
            reason,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle to the shared configuration, for read paths that sit beside the
    /// engine such as [`crate::UserInsightService`].
    pub fn shared_config(&self) -> Arc<EngineConfig> {
        self.config.clone()
    }

    pub fn predictor(&self) -> &AmountPredictor {
        &self.predictor
    }
}

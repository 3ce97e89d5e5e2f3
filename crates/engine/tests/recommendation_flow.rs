//! End-to-end flow: load profiles, encoders and a model from disk through
//! `EngineConfig::load`, then exercise recommend / insights / batch.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use upi_core::config::AppConfig;
use upi_core::types::{InsightLookup, OutcomeKind, RecommendRequest, TransactionContext};
use upi_core::RecommenderError;
use upi_engine::{BatchCoordinator, EngineConfig, RecommendationEngine, UniformJitter, UserInsightService};

const PROFILES_CSV: &str = "\
user_id,avg_amount,median_amount,amount_std,transaction_count,avg_hour,weekend_ratio,cluster,preferred_category
USER_0001,300,260,75.5,40,13.2,0.3,1,Food & Dining
USER_0002,95.5,80,20,12,8.4,0.125,2,Transportation
USER_0042,1200,1100,300,3,20.1,0.5,7,
";

const ENCODERS_JSON: &str = r#"{
    "category": ["Bills & Utilities", "Education", "Food & Dining", "Shopping", "Transportation"],
    "location": ["Bangalore", "Delhi", "Mumbai"],
    "payment_method": ["Google Pay", "Paytm", "PhonePe"],
    "receiver_type": ["E-commerce", "Individual", "Merchant", "Service Provider"]
}"#;

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path.display().to_string()
}

fn app_config(dir: &TempDir, model_json: Option<&str>) -> AppConfig {
    let mut config = AppConfig::default();
    config.data.profiles_path = write(dir.path(), "profiles.csv", PROFILES_CSV);
    config.model.encoders_path = Some(write(dir.path(), "encoders.json", ENCODERS_JSON));
    config.model.model_path = model_json.map(|json| write(dir.path(), "model.json", json));
    config
}

fn request(user_id: &str, category: &str, location: &str, payment_method: &str, hour: i64) -> RecommendRequest {
    RecommendRequest::new(
        user_id,
        TransactionContext {
            category: category.to_string(),
            receiver_type: "Merchant".to_string(),
            location: location.to_string(),
            payment_method: payment_method.to_string(),
            hour,
        },
    )
}

fn sample_requests() -> Vec<RecommendRequest> {
    vec![
        request("USER_0001", "Food & Dining", "Mumbai", "PhonePe", 13),
        request("USER_0002", "Transportation", "Delhi", "Google Pay", 8),
        request("NEW_USER_123", "Shopping", "Bangalore", "Paytm", 15),
    ]
}

#[test]
fn test_known_user_recommendation_with_linear_model() {
    let dir = TempDir::new().unwrap();
    // amount = 0.9 * avg_amount + 25 * category_code
    let mut coefficients = vec![0.0; 15];
    coefficients[0] = 0.9;
    coefficients[7] = 25.0;
    let model = serde_json::json!({"kind": "linear", "intercept": 0.0, "coefficients": coefficients});

    let config = EngineConfig::load(&app_config(&dir, Some(&model.to_string()))).unwrap();
    let engine = RecommendationEngine::new(Arc::new(config), UniformJitter::seeded(1));
    assert_eq!(engine.predictor().model_name(), "linear_regression");

    let outcome = engine.recommend(&sample_requests()[0]);
    assert_eq!(outcome.kind(), OutcomeKind::Personalized);
    let rec = outcome.into_recommendation();
    // 0.9 * 300 + 25 * 2
    assert_eq!(rec.recommended_amount, 320.0);
    assert_eq!(rec.confidence, 0.95);
    assert_eq!(rec.user_cluster, 1);
    assert_eq!(rec.user_avg_spending, 300.0);
}

#[test]
fn test_statistical_baseline_without_model() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::load(&app_config(&dir, None)).unwrap();
    let engine = RecommendationEngine::new(Arc::new(config), UniformJitter::seeded(2));

    let rec = engine.recommend(&sample_requests()[0]).into_recommendation();
    assert!((240.0..=360.0).contains(&rec.recommended_amount));
    assert_eq!(rec.confidence, 0.95);
}

#[test]
fn test_seeded_fallbacks_are_reproducible() {
    let dir = TempDir::new().unwrap();
    let run = |seed| {
        let config = EngineConfig::load(&app_config(&dir, None)).unwrap();
        let engine = RecommendationEngine::new(Arc::new(config), UniformJitter::seeded(seed));
        sample_requests()
            .iter()
            .map(|r| engine.recommend(r).into_recommendation().recommended_amount)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(1234), run(1234));
}

#[test]
fn test_unknown_users_and_categories() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::load(&app_config(&dir, None)).unwrap();
    let engine = RecommendationEngine::new(Arc::new(config), UniformJitter::from_entropy());

    let shopping = engine.recommend(&sample_requests()[2]).into_recommendation();
    assert_eq!(shopping.user_id, "NEW_USER");
    assert_eq!(shopping.confidence, 0.3);
    assert!((640.0..=960.0).contains(&shopping.recommended_amount));

    let unlisted = engine
        .recommend(&request("NOBODY", "Unlisted Category", "Mumbai", "PhonePe", 14))
        .into_recommendation();
    assert!((400.0..=600.0).contains(&unlisted.recommended_amount));
}

#[test]
fn test_insights_from_loaded_table() {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(EngineConfig::load(&app_config(&dir, None)).unwrap());
    let insights = UserInsightService::new(config);

    assert_eq!(insights.insights("NO_SUCH_USER"), InsightLookup::not_found());

    match insights.insights("USER_0042") {
        InsightLookup::Found(insight) => {
            assert_eq!(insight.user_segment.cluster_id, 7);
            assert_eq!(insight.user_segment.cluster_name, "Unknown");
            assert_eq!(insight.spending_profile.preferred_category, "Unknown");
            assert_eq!(insight.behavior_patterns.weekend_activity, "50.0%");
        }
        other => panic!("expected insight, got {other:?}"),
    }
}

#[test]
fn test_batch_of_known_and_unknown_users() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::load(&app_config(&dir, None)).unwrap();
    let engine = Arc::new(RecommendationEngine::new(Arc::new(config), UniformJitter::seeded(3)));
    let coordinator = BatchCoordinator::new(engine, 2);

    let outcomes = coordinator.recommend_batch(&sample_requests());
    let kinds: Vec<OutcomeKind> = outcomes.iter().map(|o| o.kind()).collect();
    assert_eq!(
        kinds,
        vec![OutcomeKind::Personalized, OutcomeKind::Personalized, OutcomeKind::NewUser]
    );
    assert_eq!(outcomes[0].recommendation().user_id, "USER_0001");
    assert_eq!(outcomes[1].recommendation().user_id, "USER_0002");
    assert_eq!(outcomes[2].recommendation().user_id, "NEW_USER");
    for outcome in &outcomes {
        let rec = outcome.recommendation();
        assert!((10.0..=10_000.0).contains(&rec.recommended_amount));
        assert!((0.3..=0.95).contains(&rec.confidence));
    }
}

#[test]
fn test_missing_sources_are_fatal() {
    let mut config = AppConfig::default();
    config.data.profiles_path = "/nonexistent/profiles.csv".to_string();
    assert!(matches!(
        EngineConfig::load(&config),
        Err(RecommenderError::DataSource { .. })
    ));

    let dir = TempDir::new().unwrap();
    let mut config = app_config(&dir, None);
    config.model.model_path = Some(write(dir.path(), "model.json", r#"{"kind": "linear"}"#));
    assert!(matches!(
        EngineConfig::load(&config),
        Err(RecommenderError::ModelLoad(_))
    ));
}

//! REST API handlers for recommendations, user insights and operational endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};
use upi_core::types::{InsightLookup, RecommendRequest, Recommendation, RecommendationOutcome};
use upi_engine::{BatchCoordinator, RecommendationEngine, UserInsightService};

/// Transport limit on the length of a user id or any categorical field.
const MAX_FIELD_LEN: usize = 256;

/// Response header carrying how the recommendation was produced.
pub const OUTCOME_HEADER: &str = "x-recommendation-kind";

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub insights: Arc<UserInsightService>,
    pub batch: Arc<BatchCoordinator>,
    pub node_id: String,
    pub start_time: Instant,
    pub batch_max_size: usize,
}

/// Items stay raw JSON so one malformed item cannot reject the whole batch.
#[derive(Debug, Deserialize)]
pub struct BatchRecommendRequest {
    pub requests: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct BatchRecommendResponse {
    pub results: Vec<Recommendation>,
}

/// Enforce the field-length limit. Empty or unknown values are left to the
/// engine, which degrades them to defined fallbacks.
fn validate_request(request: &RecommendRequest) -> Result<(), &'static str> {
    let context = &request.context;
    let too_long = [
        &request.user_id,
        &context.category,
        &context.receiver_type,
        &context.location,
        &context.payment_method,
    ]
    .iter()
    .any(|field| field.len() > MAX_FIELD_LEN);
    if too_long {
        return Err("request field exceeds maximum length");
    }
    Ok(())
}

fn bad_request(error: &str, msg: &str) -> (StatusCode, Json<ErrorResponse>) {
    metrics::counter!("api.validation_errors").increment(1);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
            message: msg.to_string(),
        }),
    )
}

/// GET /: Service index.
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "UPI Recommendation API".to_string(),
        endpoints: vec![
            "/recommend".to_string(),
            "/user-insights/<user_id>".to_string(),
            "/v1/recommend/batch".to_string(),
        ],
    })
}

/// POST /recommend: Recommend an amount for one payment.
///
/// Empty fields and out-of-range hours are not rejected here: the engine
/// degrades them like any other personalization failure. Only the
/// field-length limit answers 400.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if let Err(msg) = validate_request(&request) {
        warn!(user_id = %request.user_id, error = msg, "Recommend request validation failed");
        return Err(bad_request("invalid_recommend_request", msg));
    }

    let outcome = state.engine.recommend(&request);
    metrics::counter!("api.recommendations").increment(1);
    debug!(
        user_id = %request.user_id,
        kind = outcome.kind().as_str(),
        "Recommendation served"
    );

    let kind = outcome.kind().as_str();
    Ok(([(OUTCOME_HEADER, kind)], Json(outcome.into_recommendation())).into_response())
}

/// GET /user-insights/:user_id: Spending and segment summary for a user.
pub async fn handle_user_insights(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    metrics::counter!("api.insights").increment(1);
    match state.insights.insights(&user_id) {
        found @ InsightLookup::Found(_) => Json(found).into_response(),
        not_found => (StatusCode::NOT_FOUND, Json(not_found)).into_response(),
    }
}

/// Parse one batch item. An item that is not a valid request, or breaks the
/// field-length limit, becomes a degraded fallback for the category it names
/// (empty if it names none).
fn parse_batch_item(
    engine: &RecommendationEngine,
    index: usize,
    item: &serde_json::Value,
) -> Result<RecommendRequest, RecommendationOutcome> {
    let reason = match RecommendRequest::deserialize(item) {
        Ok(request) => match validate_request(&request) {
            Ok(()) => return Ok(request),
            Err(msg) => msg.to_string(),
        },
        Err(e) => format!("malformed batch item: {e}"),
    };

    let category = item
        .get("category")
        .and_then(|c| c.as_str())
        .unwrap_or_default();
    warn!(index = index, reason = %reason, "Batch item degraded to category average");
    metrics::counter!("api.batch_degraded_items").increment(1);
    Err(RecommendationOutcome::Degraded {
        recommendation: engine.fallback_recommend(category),
        reason,
    })
}

/// POST /v1/recommend/batch: Ordered recommendations for many payments.
///
/// Only the batch as a whole can be rejected (empty or over the size limit);
/// every item yields exactly one result, in request order.
pub async fn handle_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchRecommendRequest>,
) -> Result<Json<BatchRecommendResponse>, (StatusCode, Json<ErrorResponse>)> {
    let items = body.requests;
    if items.is_empty() {
        return Err(bad_request("invalid_batch", "batch must contain at least one request"));
    }
    if items.len() > state.batch_max_size {
        warn!(
            batch_size = items.len(),
            max = state.batch_max_size,
            "Batch exceeds maximum size"
        );
        return Err(bad_request("invalid_batch", "batch exceeds maximum number of requests"));
    }

    // `None` slots are filled from the coordinator's results, in order.
    let mut requests = Vec::with_capacity(items.len());
    let slots: Vec<Option<RecommendationOutcome>> = items
        .iter()
        .enumerate()
        .map(|(index, item)| match parse_batch_item(&state.engine, index, item) {
            Ok(request) => {
                requests.push(request);
                None
            }
            Err(degraded) => Some(degraded),
        })
        .collect();

    let batch = state.batch.clone();
    let computed = tokio::task::spawn_blocking(move || batch.recommend_batch(&requests))
        .await
        .map_err(|e| {
            error!(error = %e, "Batch recommendation task failed");
            metrics::counter!("api.errors").increment(1);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "batch_failed".to_string(),
                    message: "Internal processing error".to_string(),
                }),
            )
        })?;

    let mut computed = computed.into_iter();
    let results: Vec<Recommendation> = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| computed.next()))
        .map(RecommendationOutcome::into_recommendation)
        .collect();

    metrics::counter!("api.batch_items").increment(results.len() as u64);
    Ok(Json(BatchRecommendResponse { results }))
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = state.engine.config();
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        profiles: config.profiles.len(),
        model: state.engine.predictor().model_name().to_string(),
    })
}

/// GET /ready: Readiness check. Ready once a non-empty profile table is loaded.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.engine.config().profiles.is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live: Liveness check.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub endpoints: Vec<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub profiles: usize,
    pub model: String,
}

use std::env;
use std::path::PathBuf;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use pulse_app::services::{LinkProfile, Scope, parse_metric};
use pulse_app::{ApiError, AppState, Period};
use pulse_core::{LeaderboardEntry, MetricsSummary, SubmissionPayload};

#[derive(Deserialize)]
struct MetricsQuery {
    period: Option<String>,
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    metric: Option<String>,
    period: Option<String>,
    scope: Option<String>,
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct LinkNewRequest {
    user_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    org_id: Option<String>,
    #[serde(default)]
    org_name: Option<String>,
}

#[derive(Deserialize)]
struct LinkClaimRequest {
    code: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Serialize)]
struct SubmitResponse {
    ok: bool,
    dates_written: usize,
    reported_at: String,
}

#[derive(Serialize)]
struct LeaderboardResponse {
    leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
struct LinkNewResponse {
    code: String,
    expires_at: String,
}

#[derive(Serialize)]
struct LinkClaimResponse {
    token: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = env::var("PULSEBOARD_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("pulseboard.sqlite"));
    let state = AppState::new(db_path.clone());
    if let Err(err) = state.setup_db() {
        tracing::error!(error = %err, db_path = %db_path.display(), "failed to initialize database");
        std::process::exit(1);
    }

    let addr = env::var("PULSEBOARD_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("bind server");
    tracing::info!(%addr, db_path = %db_path.display(), "pulseboard listening");
    axum::serve(listener, build_app(state)).await.expect("serve");
}

fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/submit", post(submit))
        .route("/api/metrics", get(metrics))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/link/new", post(link_new))
        .route("/api/link/claim", post(link_claim))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SubmissionPayload>,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<ApiError>)> {
    let credential = bearer_token(&headers)?;
    let receipt = state
        .services
        .metrics
        .submit(&credential, &payload)
        .map_err(to_api_error)?;
    tracing::info!(
        dates_written = receipt.dates_written,
        reported_at = %receipt.reported_at,
        "submission stored"
    );
    Ok(Json(SubmitResponse {
        ok: true,
        dates_written: receipt.dates_written,
        reported_at: receipt.reported_at,
    }))
}

async fn metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsSummary>, (StatusCode, Json<ApiError>)> {
    let credential = bearer_token(&headers)?;
    let period = Period::parse(query.period.as_deref());
    state
        .services
        .metrics
        .summary(&credential, period)
        .map(Json)
        .map_err(to_api_error)
}

async fn leaderboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, (StatusCode, Json<ApiError>)> {
    let credential = bearer_token(&headers)?;
    let scope = Scope::parse(query.scope.as_deref()).map_err(to_api_error)?;
    let metric = parse_metric(query.metric.as_deref());
    let period = Period::parse(query.period.as_deref());
    let entries = state
        .services
        .leaderboard
        .leaderboard_for_caller(&credential, scope, metric, period, query.limit)
        .map_err(to_api_error)?;
    Ok(Json(LeaderboardResponse {
        leaderboard: entries,
    }))
}

async fn link_new(
    State(state): State<AppState>,
    Json(request): Json<LinkNewRequest>,
) -> Result<Json<LinkNewResponse>, (StatusCode, Json<ApiError>)> {
    let issued = state
        .services
        .linking
        .begin_link(&LinkProfile {
            user_id: request.user_id,
            name: request.name,
            email: request.email,
            org_id: request.org_id,
            org_name: request.org_name,
        })
        .map_err(to_api_error)?;
    Ok(Json(LinkNewResponse {
        code: issued.code,
        expires_at: issued.expires_at,
    }))
}

async fn link_claim(
    State(state): State<AppState>,
    Json(request): Json<LinkClaimRequest>,
) -> Result<Json<LinkClaimResponse>, (StatusCode, Json<ApiError>)> {
    let claimed = state
        .services
        .linking
        .claim_link(&request.code, request.label.as_deref())
        .map_err(to_api_error)?;
    Ok(Json(LinkClaimResponse {
        token: claimed.token,
    }))
}

fn bearer_token(headers: &HeaderMap) -> Result<String, (StatusCode, Json<ApiError>)> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiError {
                status: 401,
                message: "missing bearer credential".to_string(),
                code: Some("unauthorized".to_string()),
            }),
        )),
    }
}

fn to_api_error(err: pulse_app::AppError) -> (StatusCode, Json<ApiError>) {
    let body = ApiError::from(err);
    let status = StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body))
}

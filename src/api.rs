use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::classifier::DynClassifier;
use crate::config::AppConfig;
use crate::decision::{Decision, DecisionSource};
use crate::delivery::{DeliveryRecord, Dispatcher};
use crate::engine;
use crate::error::{AppError, AppResult};
use crate::logging::anon_hash;
use crate::submission::{ClientMeta, Submission};

pub const BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub classifier: DynClassifier,
    pub delivery: Dispatcher,
}

impl AppState {
    pub fn new(config: AppConfig, classifier: DynClassifier, http: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            classifier,
            delivery: Dispatcher::new(http),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/quiz", post(quiz))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn quiz(State(state): State<AppState>, req: Request) -> AppResult<Json<Decision>> {
    let meta = client_meta(&req);

    let bytes = body::to_bytes(req.into_body(), BODY_LIMIT)
        .await
        .map_err(|e| AppError::BadSubmission(e.to_string()))?;
    let sub = parse_submission(&bytes)?;

    let decision = engine::decide(&state.config, state.classifier.as_ref(), &sub, &meta).await;

    info!(
        user = %anon_hash(&sub.user_id),
        phone = %anon_hash(&sub.phone),
        frontend = %sub.frontend,
        score = decision.score,
        action = %decision.action,
        source = decision.source.as_str(),
        "quiz decision"
    );

    // Short-circuit denials are answered without logging or lead delivery.
    if !matches!(
        decision.source,
        DecisionSource::Blacklist | DecisionSource::Honeypot
    ) {
        let endpoints = state.config.frontends.resolve(meta.origin.as_deref());
        let record = DeliveryRecord::new(&sub, &meta, decision.clone());
        // Fire-and-forget: the handle is dropped, the task keeps running.
        let _ = state.delivery.dispatch(endpoints, record);
    }

    Ok(Json(decision))
}

fn parse_submission(bytes: &[u8]) -> AppResult<Submission> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Submission::default());
    }
    serde_json::from_slice(bytes).map_err(|e| AppError::BadSubmission(e.to_string()))
}

/// First `X-Forwarded-For` hop, else the socket peer, else empty.
fn client_meta(req: &Request) -> ClientMeta {
    let headers = req.headers();
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    ClientMeta {
        ip: forwarded.or(peer).unwrap_or_default(),
        user_agent: header_str(headers, header::USER_AGENT.as_str())
            .unwrap_or_default()
            .to_string(),
        origin: header_str(headers, header::ORIGIN.as_str()).map(str::to_string),
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name)?.to_str().ok()
}

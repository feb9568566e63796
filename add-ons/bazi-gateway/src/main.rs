//! Axum-based Bazi API gateway. Config-driven via GatewayConfig; the chart
//! engine is pure and local, with NLP narration optionally delegated to an
//! OpenAI-compatible endpoint (the API key never leaves the backend).

mod config;
mod llm;
mod view;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bazi_core::{
    compute_chart, compute_fortune, BaziError, BirthChart, BirthInput, FortuneCycles, Gender,
    ZiHourMode,
};
use config::GatewayConfig;
use llm::{NlpClient, NlpError};
use view::Options;

pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
struct AppState {
    config: Arc<GatewayConfig>,
    nlp: Arc<NlpClient>,
}

/// Gender on the wire: the numeric form (1 = 男, 0 = 女) or a spelled-out
/// variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GenderField {
    Code(u8),
    Word(String),
}

impl GenderField {
    fn resolve(&self) -> Option<Gender> {
        match self {
            GenderField::Code(1) => Some(Gender::Male),
            GenderField::Code(0) => Some(Gender::Female),
            GenderField::Code(_) => None,
            GenderField::Word(w) => match w.as_str() {
                "男" | "male" => Some(Gender::Male),
                "女" | "female" => Some(Gender::Female),
                _ => None,
            },
        }
    }

    fn describe(&self) -> String {
        match self {
            GenderField::Code(n) => n.to_string(),
            GenderField::Word(w) => w.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CalculateRequest {
    year: i32,
    month: u32,
    day: u32,
    #[serde(default)]
    hour: u32,
    #[serde(default)]
    minute: u32,
    gender: GenderField,
    #[serde(default)]
    options: Option<String>,
    #[serde(default)]
    zi_hour_mode: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn success(data: serde_json::Value) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": data,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

fn engine_error(e: BaziError) -> ApiError {
    let status = match e {
        // The request was well-formed; the instant itself is unusable.
        BaziError::InvalidDate(_) | BaziError::MissingCoverage { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BaziError::ComputationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(target: "bazi::engine", error = %e, "engine invariant violation");
    }
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}

impl CalculateRequest {
    fn parse(&self) -> Result<(BirthInput, Options), ApiError> {
        let gender = self
            .gender
            .resolve()
            .ok_or_else(|| bad_request(format!("unknown gender '{}'", self.gender.describe())))?;
        let zi_hour_mode = match self.zi_hour_mode.as_deref() {
            None | Some("modern") => ZiHourMode::Modern,
            Some("traditional") => ZiHourMode::Traditional,
            Some(other) => return Err(bad_request(format!("unknown zi_hour_mode '{other}'"))),
        };
        let options = match self.options.as_deref() {
            None => Options::All,
            Some(s) => {
                Options::parse(s).ok_or_else(|| bad_request(format!("unknown options '{s}'")))?
            }
        };
        Ok((
            BirthInput {
                year: self.year,
                month: self.month,
                day: self.day,
                hour: self.hour,
                minute: self.minute,
                gender,
                zi_hour_mode,
            },
            options,
        ))
    }
}

fn derive(input: &BirthInput) -> Result<(BirthChart, FortuneCycles), ApiError> {
    let chart = compute_chart(input).map_err(engine_error)?;
    let fortune = compute_fortune(&chart).map_err(engine_error)?;
    Ok((chart, fortune))
}

/// POST /api/v1/calculate_bazi – full chart derivation with section selection.
async fn calculate_bazi(
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = payload.map_err(|e| bad_request(format!("invalid request body: {e}")))?;
    let (input, options) = body.parse()?;
    let (chart, fortune) = derive(&input)?;
    tracing::info!(
        target: "bazi::api",
        year = input.year,
        month = input.month,
        day = input.day,
        "chart served"
    );
    Ok(success(view::project(options, &chart, &fortune)))
}

#[derive(Debug, Deserialize)]
struct NlpRequest {
    query: String,
    #[serde(default)]
    options: Option<String>,
    #[serde(default)]
    zi_hour_mode: Option<String>,
}

/// POST /api/v1/nlp/bazi – extract birth parameters from a free-text query,
/// then derive the chart. The response echoes what was parsed.
async fn nlp_bazi(
    State(state): State<AppState>,
    payload: Result<Json<NlpRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = payload.map_err(|e| bad_request(format!("invalid request body: {e}")))?;
    let extracted = state.nlp.extract_birth(&body.query).await.map_err(|e| {
        tracing::warn!(target: "bazi::nlp", error = %e, "NLP extraction failed");
        match e {
            NlpError::Transport(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": e.to_string() })),
            ),
            NlpError::Unusable(_) => bad_request(e.to_string()),
        }
    })?;
    let request = CalculateRequest {
        year: extracted.year,
        month: extracted.month,
        day: extracted.day,
        hour: extracted.hour,
        minute: extracted.minute,
        gender: GenderField::Word(extracted.gender.clone()),
        options: body.options,
        zi_hour_mode: body.zi_hour_mode,
    };
    let (input, options) = request.parse()?;
    let (chart, fortune) = derive(&input)?;
    let mut data = view::project(options, &chart, &fortune);
    if let Some(map) = data.as_object_mut() {
        map.insert("parsed_input".to_string(), serde_json::json!(extracted));
    }
    Ok(success(data))
}

/// GET / – service banner.
async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": state.config.app_name,
        "version": GATEWAY_VERSION,
        "docs": "/api/v1/",
    }))
}

/// GET /health – liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/ – API index.
async fn api_index(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": state.config.app_name,
        "version": GATEWAY_VERSION,
        "llm_mode": if state.nlp.is_mock() { "mock" } else { "live" },
        "endpoints": {
            "calculate_bazi": "POST /api/v1/calculate_bazi",
            "nlp_bazi": "POST /api/v1/nlp/bazi",
        },
    }))
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/", get(api_index))
        .route("/api/v1/calculate_bazi", post(calculate_bazi))
        .route("/api/v1/nlp/bazi", post(nlp_bazi))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load .env first so the LLM key stays backend-only.
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[bazi-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match GatewayConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[bazi-gateway] config error: {e}");
            std::process::exit(1);
        }
    };
    if config.llm_is_live() && std::env::var("BAZI_LLM_API_KEY").is_err() {
        eprintln!("[bazi-gateway] Hint: llm_mode=live but BAZI_LLM_API_KEY is unset; NLP requests will fall back to mock.");
    }

    let nlp = NlpClient::new(
        config.llm_api_url.clone(),
        config.llm_model.clone(),
        config.llm_is_live(),
    );
    let state = AppState {
        config: Arc::new(config),
        nlp: Arc::new(nlp),
    };
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app_name = state.config.app_name.clone();
    let app = build_app(state);

    tracing::info!("{} listening on {}", app_name, addr);
    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}

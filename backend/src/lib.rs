//! HTTP API over the AgriSure recommendation pipeline.

pub mod error;
pub mod request;

pub use error::AppError;

use agrisure::datasources::{ForecastProvider, OpenMeteoClient};
use agrisure::logic::{RecommendationService, WeatherRiskAssessor};
use agrisure::models::RecommendationResponse;
use agrisure::Config;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use request::{parse_crop_request, parse_weather_risk_request};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommendationService>,
    pub forecasts: Arc<dyn ForecastProvider>,
    pub risk: Arc<WeatherRiskAssessor>,
}

impl AppState {
    pub fn new(service: RecommendationService, forecasts: Arc<dyn ForecastProvider>) -> Self {
        Self {
            service: Arc::new(service),
            forecasts,
            risk: Arc::new(WeatherRiskAssessor::new()),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        tracing::info!("Loading historical tables...");
        let service = RecommendationService::from_config(config)?;
        tracing::info!(
            "Loaded {} crops across {} districts",
            service.store().yields.crops().len(),
            service.store().yields.district_count()
        );

        let forecasts = OpenMeteoClient::new(config.open_meteo.clone())?;
        Ok(Self::new(service, Arc::new(forecasts)))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/predictForCrop", post(predict_for_crop))
        .route("/futureWeatherPrediction", post(future_weather_prediction))
        // Middleware (applied in reverse order)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn predict_for_crop(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, AppError> {
    let Json(body) = payload.map_err(json_error)?;
    let request = parse_crop_request(&body)?;

    let response = state
        .service
        .recommend(&request.crop_name, request.point)
        .await?;

    Ok(Json(response))
}

async fn future_weather_prediction(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload.map_err(json_error)?;
    let request = parse_weather_risk_request(&body)?;

    let forecast = state.forecasts.daily_forecast(request.point).await?;
    let assessment = state.risk.assess(&forecast, request.language)?;

    Ok(Json(serde_json::json!({
        "claim_recommendation": assessment
    })))
}

fn json_error(rejection: JsonRejection) -> AppError {
    tracing::debug!("Rejected request body: {}", rejection);
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::Rejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: format!("Request body exceeds {} bytes", MAX_BODY_BYTES),
        },
        _ => AppError::BadRequest("Request must be JSON".into()),
    }
}

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::{AppState, services::weather, utils::success_to_api_response};

/// Always 200: the demo payload stands in when the provider is unavailable.
#[axum::debug_handler]
pub async fn get_weather(State(state): State<AppState>) -> impl IntoResponse {
    let report = match &state.config.weather_api_key {
        Some(api_key) => {
            match weather::fetch(&state.http, api_key, &state.config.weather_city).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!("Weather fetch failed, serving demo data: {}", e);
                    weather::demo_report()
                }
            }
        }
        None => weather::demo_report(),
    };

    (StatusCode::OK, success_to_api_response(report))
}

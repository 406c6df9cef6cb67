use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    middleware::CurrentUser,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreateVehicleRequest, UpdateVehicleRequest, Vehicle};

#[axum::debug_handler]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    match Vehicle::list_for_user(&state.pool, user.id).await {
        Ok(vehicles) => (StatusCode::OK, success_to_api_response(vehicles)),
        Err(e) => {
            tracing::error!("Vehicle list failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateVehicleRequest>,
) -> impl IntoResponse {
    let has_required = req.brand.as_deref().is_some_and(|b| !b.is_empty())
        && req.model.as_deref().is_some_and(|m| !m.is_empty());
    if !has_required {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "brand and model required".to_string(),
            ),
        );
    }

    match Vehicle::create(&state.pool, user.id, &req).await {
        Ok(vehicle) => (StatusCode::CREATED, success_to_api_response(vehicle)),
        Err(e) => {
            tracing::error!("Vehicle create failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(vehicle_id): Path<i64>,
    Json(req): Json<UpdateVehicleRequest>,
) -> impl IntoResponse {
    match Vehicle::update(&state.pool, user.id, vehicle_id, &req).await {
        Ok(Some(vehicle)) => (StatusCode::OK, success_to_api_response(vehicle)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Vehicle not found".to_string()),
        ),
        Err(e) => {
            tracing::error!("Vehicle update failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(vehicle_id): Path<i64>,
) -> impl IntoResponse {
    match Vehicle::delete(&state.pool, user.id, vehicle_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response("Vehicle deleted".to_string()),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Vehicle not found".to_string()),
        ),
        Err(e) => {
            tracing::error!("Vehicle delete failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

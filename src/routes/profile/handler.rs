use axum::{
    Extension,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    middleware::CurrentUser,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{Favorite, FavoriteRequest, Profile, ProfileResponse, UpdateProfileRequest};

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    let profile = match Profile::fetch(&state.pool, user.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Profile not found".to_string()),
            );
        }
        Err(e) => {
            tracing::error!("Profile fetch failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            );
        }
    };

    match Favorite::list(&state.pool, user.id).await {
        Ok(favorites) => (
            StatusCode::OK,
            success_to_api_response(ProfileResponse { profile, favorites }),
        ),
        Err(e) => {
            tracing::error!("Favorites fetch failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    match Profile::update(&state.pool, user.id, &req).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response("Profile updated".to_string()),
        ),
        Err(e) => {
            tracing::error!("Profile update failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<FavoriteRequest>,
) -> impl IntoResponse {
    let (Some(item_type), Some(item_id)) = (req.item_type.as_deref(), req.item_id) else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "item_type and item_id required".to_string(),
            ),
        );
    };

    match Favorite::add(&state.pool, user.id, item_type, item_id).await {
        Ok(true) => (
            StatusCode::CREATED,
            success_to_api_response("Added to favorites".to_string()),
        ),
        Ok(false) => (
            StatusCode::CONFLICT,
            error_to_api_response(error_codes::ALREADY_EXISTS, "Already in favorites".to_string()),
        ),
        Err(e) => {
            tracing::error!("Favorite insert failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<FavoriteRequest>,
) -> impl IntoResponse {
    let (Some(item_type), Some(item_id)) = (req.item_type.as_deref(), req.item_id) else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "item_type and item_id required".to_string(),
            ),
        );
    };

    match Favorite::remove(&state.pool, user.id, item_type, item_id).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response("Removed from favorites".to_string()),
        ),
        Err(e) => {
            tracing::error!("Favorite delete failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    AppState,
    middleware::{AUTH_HEADER, CurrentUser},
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{AuthResponse, AuthUser, LogoutResponse, MeResponse, Session, TelegramAuthRequest};

#[axum::debug_handler]
pub async fn telegram_auth(
    State(state): State<AppState>,
    Json(req): Json<TelegramAuthRequest>,
) -> impl IntoResponse {
    let (Some(telegram_id), true) = (
        req.telegram_id,
        req.first_name.as_deref().is_some_and(|n| !n.is_empty()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "telegram_id and first_name required".to_string(),
            ),
        );
    };

    let existing = match AuthUser::find_by_telegram_id(&state.pool, telegram_id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Telegram auth lookup failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            );
        }
    };

    let (status, user) = match existing {
        Some(user) => {
            if let Err(e) = AuthUser::refresh_telegram_profile(&state.pool, user.id, &req).await {
                tracing::warn!("Profile refresh failed for user {}: {}", user.id, e);
            }
            (StatusCode::OK, user)
        }
        None => match AuthUser::create_from_telegram(&state.pool, &req).await {
            Ok(user) => (StatusCode::CREATED, user),
            Err(e) => {
                tracing::error!("Telegram user creation failed: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(
                        error_codes::INTERNAL_ERROR,
                        "Failed to create user".to_string(),
                    ),
                );
            }
        },
    };

    match Session::create(&state.pool, user.id, state.config.session_ttl()).await {
        Ok(token) => (status, success_to_api_response(AuthResponse { token, user })),
        Err(e) => {
            tracing::error!("Session creation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to create session".to_string(),
                ),
            )
        }
    }
}

/// Deletes the presented session if there is one. Always succeeds so that a
/// client with a stale token can still "log out".
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()) {
        if let Err(e) = Session::delete(&state.pool, token).await {
            tracing::warn!("Logout session delete failed: {}", e);
        }
    }

    (
        StatusCode::OK,
        success_to_api_response(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    )
}

#[axum::debug_handler]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    match AuthUser::callsign(&state.pool, user.id).await {
        Ok(callsign) => (
            StatusCode::OK,
            success_to_api_response(MeResponse {
                id: user.id,
                email: user.email,
                name: user.name,
                role: user.role,
                callsign,
            }),
        ),
        Err(e) => {
            tracing::error!("Callsign lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

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

use super::model::{
    FriendRequest, Friendship, FriendshipStatus, RequestDecision, RespondRequest, decide_request,
};

fn db_error<T>(context: &str, e: sqlx::Error) -> (StatusCode, axum::Json<crate::utils::ApiResponse<T>>) {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
    )
}

#[axum::debug_handler]
pub async fn send_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<FriendRequest>,
) -> impl IntoResponse {
    let Some(friend_id) = req.friend_id else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "friend_id required".to_string()),
        );
    };

    if friend_id == user.id {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Cannot send a friend request to yourself".to_string(),
            ),
        );
    }

    let existing = match Friendship::find_between(&state.pool, user.id, friend_id).await {
        Ok(row) => row,
        Err(e) => return db_error("Friendship lookup failed", e),
    };

    let decision = decide_request(existing.as_ref().map(|f| f.status));
    match (decision, existing) {
        (RequestDecision::Create, _) | (_, None) => {
            match Friendship::create(&state.pool, user.id, friend_id).await {
                Ok(row) => (StatusCode::CREATED, success_to_api_response(row)),
                Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => (
                    StatusCode::NOT_FOUND,
                    error_to_api_response(error_codes::NOT_FOUND, "User not found".to_string()),
                ),
                Err(e) => db_error("Friendship create failed", e),
            }
        }
        (RequestDecision::ReturnExisting, Some(row)) => {
            (StatusCode::OK, success_to_api_response(row))
        }
        (RequestDecision::AlreadyFriends, Some(_)) => (
            StatusCode::CONFLICT,
            error_to_api_response(error_codes::ALREADY_EXISTS, "Already friends".to_string()),
        ),
        (RequestDecision::Reset, Some(row)) => {
            match Friendship::reset_to_pending(&state.pool, row.id, user.id, friend_id).await {
                Ok(row) => (StatusCode::OK, success_to_api_response(row)),
                Err(e) => db_error("Friendship reset failed", e),
            }
        }
    }
}

#[axum::debug_handler]
pub async fn respond_to_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(friendship_id): Path<i64>,
    Json(req): Json<RespondRequest>,
) -> impl IntoResponse {
    let status = match req.action.as_deref() {
        Some("accept") => FriendshipStatus::Accepted,
        Some("reject") => FriendshipStatus::Rejected,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::VALIDATION_ERROR,
                    "action must be accept or reject".to_string(),
                ),
            );
        }
    };

    match Friendship::respond(&state.pool, friendship_id, user.id, status).await {
        Ok(Some(row)) => (StatusCode::OK, success_to_api_response(row)),
        // Wrong caller, already resolved, or no such request - all the same 404
        // so responding twice never double-transitions.
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "No pending request".to_string()),
        ),
        Err(e) => db_error("Friendship respond failed", e),
    }
}

#[axum::debug_handler]
pub async fn delete_friendship(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(friendship_id): Path<i64>,
) -> impl IntoResponse {
    match Friendship::delete(&state.pool, friendship_id, user.id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response("Friendship removed".to_string()),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Friendship not found".to_string()),
        ),
        Err(e) => db_error("Friendship delete failed", e),
    }
}

#[axum::debug_handler]
pub async fn list_friends(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    match Friendship::list_for_user(&state.pool, user.id).await {
        Ok(entries) => (StatusCode::OK, success_to_api_response(entries)),
        Err(e) => db_error("Friendship list failed", e),
    }
}

use axum::{
    Extension, Json as AxumJson,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    access::Permission,
    middleware::CurrentUser,
    services::telegram,
    utils::{ApiResponse, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{Organization, OrganizationRequest, RequestListQuery, SubmitRequest};

fn db_error<T>(context: &str, e: sqlx::Error) -> (StatusCode, AxumJson<ApiResponse<T>>) {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
    )
}

#[axum::debug_handler]
pub async fn submit_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SubmitRequest>,
) -> impl IntoResponse {
    if req.name.as_deref().unwrap_or("").is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "name required".to_string()),
        );
    }

    let request = match OrganizationRequest::submit(&state.pool, user.id, &req).await {
        Ok(request) => request,
        Err(e) => return db_error("Organization request insert failed", e),
    };

    // Notification is best effort; the application stands regardless.
    if let Some(bot_token) = state.config.telegram_bot_token.clone() {
        let message = format!("Новая заявка от организации: {}", request.name);
        if let Err(e) = telegram::notify_ceos(
            &state.pool,
            &state.http,
            &bot_token,
            "organization_request",
            &message,
        )
        .await
        {
            tracing::warn!("CEO notification failed: {}", e);
        }
    }

    (StatusCode::CREATED, success_to_api_response(request))
}

#[axum::debug_handler]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RequestListQuery>,
) -> impl IntoResponse {
    if !user.role.can(Permission::Moderate) {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Moderator access required".to_string(),
            ),
        );
    }

    match OrganizationRequest::list(&state.pool, query.status.as_deref()).await {
        Ok(requests) => (StatusCode::OK, success_to_api_response(requests)),
        Err(e) => db_error("Organization request list failed", e),
    }
}

#[axum::debug_handler]
pub async fn approve_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<i64>,
) -> impl IntoResponse {
    if !user.role.can(Permission::Moderate) {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Moderator access required".to_string(),
            ),
        );
    }

    match OrganizationRequest::approve(&state.pool, request_id, user.id).await {
        Ok(Some(organization)) => (StatusCode::OK, success_to_api_response(organization)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "No pending request".to_string()),
        ),
        Err(e) => db_error("Organization approve failed", e),
    }
}

#[axum::debug_handler]
pub async fn reject_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(request_id): Path<i64>,
) -> impl IntoResponse {
    if !user.role.can(Permission::Moderate) {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Moderator access required".to_string(),
            ),
        );
    }

    match OrganizationRequest::reject(&state.pool, request_id, user.id).await {
        Ok(Some(request)) => (StatusCode::OK, success_to_api_response(request)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "No pending request".to_string()),
        ),
        Err(e) => db_error("Organization reject failed", e),
    }
}

#[axum::debug_handler]
pub async fn list_organizations(State(state): State<AppState>) -> impl IntoResponse {
    match Organization::list_active(&state.pool).await {
        Ok(organizations) => (StatusCode::OK, success_to_api_response(organizations)),
        Err(e) => db_error("Organization list failed", e),
    }
}

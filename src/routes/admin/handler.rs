use axum::{
    Extension, Json as AxumJson,
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    AppState,
    access::{Permission, Role},
    middleware::{AUTH_HEADER, CurrentUser},
    utils::{
        ApiResponse, error_codes, error_to_api_response, generate_admin_token,
        success_to_api_response, verify_admin_token,
    },
};

use super::model::{
    ActivityEntry, ActivityQuery, AdminAuth, AdminPasswordRequest, AdminUser,
    ChangeAdminPasswordRequest, LogActivityRequest, RecentActivity, SetStatusRequest, Stats,
    StatsResponse, UpdateRoleRequest,
};

fn forbidden<T>(msg: &str) -> (StatusCode, AxumJson<ApiResponse<T>>) {
    (
        StatusCode::FORBIDDEN,
        error_to_api_response(error_codes::PERMISSION_DENIED, msg.to_string()),
    )
}

fn db_error<T>(context: &str, e: sqlx::Error) -> (StatusCode, AxumJson<ApiResponse<T>>) {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
    )
}

/// Business exceptions layered on top of the permission check for role edits
/// and account deletion.
pub fn role_change_denial(
    caller_id: i64,
    caller_role: Role,
    target_id: i64,
    target_role: Role,
    new_role: Option<Role>,
    target_protected: bool,
) -> Option<&'static str> {
    if target_protected {
        return Some("Cannot modify a protected account");
    }
    if target_id == caller_id {
        return Some("Cannot change your own role");
    }
    if target_role == Role::Ceo && caller_role != Role::Ceo {
        return Some("Only a CEO may modify another CEO");
    }
    if new_role == Some(Role::Ceo) && caller_role != Role::Ceo {
        return Some("Only a CEO may grant the CEO role");
    }
    None
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ManageUsers) {
        return forbidden("Admin access required");
    }

    match AdminUser::list(&state.pool).await {
        Ok(users) => (StatusCode::OK, success_to_api_response(users)),
        Err(e) => db_error("User list failed", e),
    }
}

#[axum::debug_handler]
pub async fn update_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateRoleRequest>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ManageUsers) {
        return forbidden("Admin access required");
    }

    let (Some(target_id), Some(role_str)) = (req.user_id, req.role.as_deref()) else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "user_id and role required".to_string(),
            ),
        );
    };

    let Ok(new_role) = role_str.parse::<Role>() else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "Invalid role".to_string()),
        );
    };

    let target_role = match AdminUser::find_role(&state.pool, target_id).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "User not found".to_string()),
            );
        }
        Err(e) => return db_error("Role lookup failed", e),
    };

    if let Some(denial) = role_change_denial(
        user.id,
        user.role,
        target_id,
        target_role,
        Some(new_role),
        state.config.is_protected_user(target_id),
    ) {
        return forbidden(denial);
    }

    match AdminUser::update_role(&state.pool, target_id, new_role).await {
        Ok(Some(updated)) => (StatusCode::OK, success_to_api_response(updated)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User not found".to_string()),
        ),
        Err(e) => db_error("Role update failed", e),
    }
}

#[axum::debug_handler]
pub async fn set_user_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(target_id): Path<i64>,
    Json(req): Json<SetStatusRequest>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ManageUsers) {
        return forbidden("Admin access required");
    }

    let Some(is_active) = req.is_active else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "is_active required".to_string()),
        );
    };

    if state.config.is_protected_user(target_id) {
        return forbidden("Cannot modify a protected account");
    }

    match AdminUser::set_active(&state.pool, target_id, is_active).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response("Status updated".to_string()),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User not found".to_string()),
        ),
        Err(e) => db_error("Status update failed", e),
    }
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(target_id): Path<i64>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ManageUsers) {
        return forbidden("Admin access required");
    }

    let target_role = match AdminUser::find_role(&state.pool, target_id).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "User not found".to_string()),
            );
        }
        Err(e) => return db_error("Role lookup failed", e),
    };

    if let Some(denial) = role_change_denial(
        user.id,
        user.role,
        target_id,
        target_role,
        None,
        state.config.is_protected_user(target_id),
    ) {
        return forbidden(denial);
    }

    match AdminUser::delete_cascade(&state.pool, target_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response("User deleted".to_string()),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User not found".to_string()),
        ),
        Err(e) => db_error("User delete failed", e),
    }
}

#[axum::debug_handler]
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ViewStats) {
        return forbidden("Insufficient permissions");
    }

    let stats = match Stats::collect(&state.pool).await {
        Ok(stats) => stats,
        Err(e) => return db_error("Stats collection failed", e),
    };

    match RecentActivity::latest(&state.pool, 10).await {
        Ok(recent_activity) => (
            StatusCode::OK,
            success_to_api_response(StatsResponse {
                stats,
                recent_activity,
            }),
        ),
        Err(e) => db_error("Recent activity fetch failed", e),
    }
}

#[axum::debug_handler]
pub async fn log_activity(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<LogActivityRequest>,
) -> impl IntoResponse {
    let Some(action) = req.action.as_deref().filter(|a| !a.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "action required".to_string()),
        );
    };

    // Anyone may record their own actions; writing someone else's history is
    // an admin operation.
    let subject = req.user_id.unwrap_or(user.id);
    if subject != user.id && !user.role.can(Permission::ManageUsers) {
        return forbidden("Cannot log activity for another user");
    }

    match ActivityEntry::log(
        &state.pool,
        subject,
        action,
        req.location.as_deref(),
        req.details.as_deref(),
    )
    .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            success_to_api_response("Activity logged".to_string()),
        ),
        Err(e) => db_error("Activity insert failed", e),
    }
}

#[axum::debug_handler]
pub async fn user_activity(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ActivityQuery>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ManageUsers) {
        return forbidden("Admin access required");
    }

    let Some(user_id) = query.user_id else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "user_id required".to_string()),
        );
    };

    match ActivityEntry::for_user(&state.pool, user_id).await {
        Ok(entries) => (StatusCode::OK, success_to_api_response(entries)),
        Err(e) => db_error("Activity fetch failed", e),
    }
}

#[axum::debug_handler]
pub async fn admin_password_status(State(state): State<AppState>) -> impl IntoResponse {
    match AdminAuth::has_password(&state.pool).await {
        Ok(has_password) => (
            StatusCode::OK,
            success_to_api_response(json!({ "hasPassword": has_password })),
        ),
        Err(e) => db_error("Admin auth lookup failed", e),
    }
}

#[axum::debug_handler]
pub async fn setup_or_verify_admin_password(
    State(state): State<AppState>,
    Json(req): Json<AdminPasswordRequest>,
) -> impl IntoResponse {
    let password = req.password.unwrap_or_default();
    if password.len() < 6 {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Password must be at least 6 characters".to_string(),
            ),
        );
    }

    match req.action.as_deref() {
        Some("setup") => match AdminAuth::setup(&state.pool, &password).await {
            Ok(true) => (
                StatusCode::OK,
                success_to_api_response(json!({ "message": "Password set" })),
            ),
            Ok(false) => (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::ALREADY_EXISTS,
                    "Password already set".to_string(),
                ),
            ),
            Err(e) => db_error("Admin password setup failed", e),
        },
        Some("verify") => match AdminAuth::verify(&state.pool, &password).await {
            Ok(None) => (
                StatusCode::BAD_REQUEST,
                error_to_api_response(error_codes::NOT_FOUND, "Password not set".to_string()),
            ),
            Ok(Some(false)) => (
                StatusCode::OK,
                success_to_api_response(json!({ "valid": false })),
            ),
            Ok(Some(true)) => match generate_admin_token(&state.config) {
                Ok(token) => (
                    StatusCode::OK,
                    success_to_api_response(json!({ "valid": true, "token": token })),
                ),
                Err(e) => {
                    tracing::error!("Admin token generation failed: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        error_to_api_response(
                            error_codes::INTERNAL_ERROR,
                            "Failed to generate token".to_string(),
                        ),
                    )
                }
            },
            Err(e) => db_error("Admin password verify failed", e),
        },
        _ => (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "action must be setup or verify".to_string(),
            ),
        ),
    }
}

#[axum::debug_handler]
pub async fn change_admin_password(
    State(state): State<AppState>,
    Json(req): Json<ChangeAdminPasswordRequest>,
) -> impl IntoResponse {
    let new_password = req.new_password.unwrap_or_default();
    if new_password.len() < 6 {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "New password must be at least 6 characters".to_string(),
            ),
        );
    }

    let old_password = req.old_password.unwrap_or_default();
    match AdminAuth::change(&state.pool, &old_password, &new_password).await {
        Ok(None) => (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::NOT_FOUND, "Password not set".to_string()),
        ),
        Ok(Some(false)) => forbidden("Wrong old password"),
        Ok(Some(true)) => (
            StatusCode::OK,
            success_to_api_response(json!({ "message": "Password changed" })),
        ),
        Err(e) => db_error("Admin password change failed", e),
    }
}

/// Pre-session admin panel path: authorized by the short-lived JWT minted on
/// panel password verification, not by a user session.
#[axum::debug_handler]
pub async fn legacy_stats(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let authorized = headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|token| verify_admin_token(token, &state.config))
        .unwrap_or(false);

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            error_to_api_response(error_codes::AUTH_FAILED, "Unauthorized".to_string()),
        );
    }

    let stats = match Stats::collect(&state.pool).await {
        Ok(stats) => stats,
        Err(e) => return db_error("Stats collection failed", e),
    };

    match RecentActivity::latest(&state.pool, 10).await {
        Ok(recent_activity) => (
            StatusCode::OK,
            success_to_api_response(StatsResponse {
                stats,
                recent_activity,
            }),
        ),
        Err(e) => db_error("Recent activity fetch failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_accounts_are_untouchable() {
        let denial = role_change_denial(2, Role::Ceo, 1, Role::User, Some(Role::Admin), true);
        assert_eq!(denial, Some("Cannot modify a protected account"));
    }

    #[test]
    fn admins_cannot_change_their_own_role() {
        let denial = role_change_denial(5, Role::Admin, 5, Role::Admin, Some(Role::User), false);
        assert_eq!(denial, Some("Cannot change your own role"));
    }

    #[test]
    fn only_ceo_touches_ceo() {
        let denial = role_change_denial(2, Role::Admin, 3, Role::Ceo, Some(Role::User), false);
        assert_eq!(denial, Some("Only a CEO may modify another CEO"));

        assert!(role_change_denial(2, Role::Ceo, 3, Role::Ceo, Some(Role::User), false).is_none());
    }

    #[test]
    fn only_ceo_grants_ceo() {
        let denial = role_change_denial(2, Role::Admin, 3, Role::User, Some(Role::Ceo), false);
        assert_eq!(denial, Some("Only a CEO may grant the CEO role"));
    }

    #[test]
    fn ordinary_promotion_is_allowed() {
        assert!(
            role_change_denial(2, Role::Admin, 3, Role::User, Some(Role::Moderator), false)
                .is_none()
        );
        // deletion path passes None as the new role
        assert!(role_change_denial(2, Role::Admin, 3, Role::User, None, false).is_none());
    }
}

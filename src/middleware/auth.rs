use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    access::Role,
    utils::{error_codes, error_to_api_response},
};

pub const AUTH_HEADER: &str = "x-auth-token";

/// Authenticated caller, resolved from an `X-Auth-Token` session token and
/// injected into request extensions for protected routes.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

fn unauthorized(msg: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        error_to_api_response::<()>(error_codes::AUTH_FAILED, msg.to_string()),
    )
        .into_response()
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // HeaderMap lookup is case-insensitive, covering X-Auth-Token variants.
    let token = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let Some(token) = token else {
        return unauthorized("No token provided");
    };

    let row = sqlx::query_as::<_, (i64, String, String, Role, bool)>(
        r#"
        SELECT u.id, u.name, u.email, u.role, u.is_active
        FROM users u
        JOIN user_sessions s ON u.id = s.user_id
        WHERE s.token = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(&token)
    .fetch_optional(&state.pool)
    .await;

    match row {
        Ok(Some((id, name, email, role, is_active))) => {
            if !is_active {
                return (
                    StatusCode::FORBIDDEN,
                    error_to_api_response::<()>(
                        error_codes::PERMISSION_DENIED,
                        "Account is disabled".to_string(),
                    ),
                )
                    .into_response();
            }
            request.extensions_mut().insert(CurrentUser {
                id,
                name,
                email,
                role,
            });
            next.run(request).await
        }
        Ok(None) => unauthorized("Invalid or expired token"),
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response::<()>(
                    error_codes::INTERNAL_ERROR,
                    "Internal server error".to_string(),
                ),
            )
                .into_response()
        }
    }
}

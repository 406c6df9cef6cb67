use axum::{
    Extension,
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState,
    access::Permission,
    middleware::CurrentUser,
    services::telegram::{self, FALLBACK_MEMBER_COUNT},
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub channel: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub message: Option<String>,
}

/// Channel stats never fail outward: the fallback count ships with the error
/// message when the Bot API is unreachable.
#[axum::debug_handler]
pub async fn telegram_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    let channel = query
        .channel
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(state.config.telegram_default_channel.as_str())
        .trim_start_matches('@')
        .to_string();

    let Some(bot_token) = state.config.telegram_bot_token.as_deref() else {
        return (
            StatusCode::OK,
            success_to_api_response(json!({
                "channel": channel,
                "member_count": FALLBACK_MEMBER_COUNT,
                "error": "Bot token not configured",
            })),
        );
    };

    match telegram::channel_stats(&state.http, bot_token, &channel).await {
        Ok(stats) => (
            StatusCode::OK,
            success_to_api_response(json!({
                "channel": channel,
                "title": stats.title,
                "member_count": stats.member_count,
            })),
        ),
        Err(e) => {
            tracing::warn!("Telegram stats for @{} failed: {}", channel, e);
            (
                StatusCode::OK,
                success_to_api_response(json!({
                    "channel": channel,
                    "member_count": FALLBACK_MEMBER_COUNT,
                    "error": e,
                })),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn notify_ceos(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<NotifyRequest>,
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

    let Some(message) = req.message.as_deref().filter(|m| !m.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "message required".to_string()),
        );
    };

    let Some(bot_token) = state.config.telegram_bot_token.as_deref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(
                error_codes::INTERNAL_ERROR,
                "Bot token not configured".to_string(),
            ),
        );
    };

    let notification_type = req.notification_type.as_deref().unwrap_or("info");
    match telegram::notify_ceos(&state.pool, &state.http, bot_token, notification_type, message)
        .await
    {
        Ok(outcome) if outcome.total_ceos == 0 => (
            StatusCode::NOT_FOUND,
            error_to_api_response(
                error_codes::NOT_FOUND,
                "No CEOs with linked Telegram accounts".to_string(),
            ),
        ),
        Ok(outcome) => (StatusCode::OK, success_to_api_response(json!(outcome))),
        Err(e) => {
            tracing::error!("CEO notification failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
            )
        }
    }
}

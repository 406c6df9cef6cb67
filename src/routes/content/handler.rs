use axum::{
    Extension,
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState,
    access::Permission,
    middleware::CurrentUser,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{
    Announcement, ContentKind, ContentPayload, ContentQuery, ListFilter, School, Service, Shop,
    delete_entity,
};

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<i64>,
}

fn bad_request(msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        error_to_api_response::<serde_json::Value>(
            error_codes::VALIDATION_ERROR,
            msg.to_string(),
        ),
    )
        .into_response()
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        error_to_api_response::<serde_json::Value>(
            error_codes::PERMISSION_DENIED,
            "Content management access required".to_string(),
        ),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_to_api_response::<serde_json::Value>(
            error_codes::NOT_FOUND,
            "Not found".to_string(),
        ),
    )
        .into_response()
}

fn db_error(context: &str, e: sqlx::Error) -> Response {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_to_api_response::<serde_json::Value>(
            error_codes::INTERNAL_ERROR,
            "Database error".to_string(),
        ),
    )
        .into_response()
}

fn parse_kind(kind: Option<&str>) -> Result<ContentKind, Response> {
    kind.unwrap_or("shops")
        .parse::<ContentKind>()
        .map_err(|()| bad_request("Invalid content type"))
}

#[axum::debug_handler]
pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> Response {
    let kind = match parse_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    let filter = ListFilter::from_query(&query);

    match kind {
        ContentKind::Shops => match Shop::list(&state.pool, &filter).await {
            Ok(rows) => (StatusCode::OK, success_to_api_response(rows)).into_response(),
            Err(e) => db_error("Shop list failed", e),
        },
        ContentKind::Schools => match School::list(&state.pool, &filter).await {
            Ok(rows) => (StatusCode::OK, success_to_api_response(rows)).into_response(),
            Err(e) => db_error("School list failed", e),
        },
        ContentKind::Services => match Service::list(&state.pool, &filter).await {
            Ok(rows) => (StatusCode::OK, success_to_api_response(rows)).into_response(),
            Err(e) => db_error("Service list failed", e),
        },
        ContentKind::Announcements => match Announcement::list(&state.pool, &filter).await {
            Ok(rows) => (StatusCode::OK, success_to_api_response(rows)).into_response(),
            Err(e) => db_error("Announcement list failed", e),
        },
    }
}

#[axum::debug_handler]
pub async fn create_content(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ContentQuery>,
    Json(payload): Json<ContentPayload>,
) -> Response {
    if !user.role.can(Permission::ManageContent) {
        return forbidden();
    }

    let kind = match parse_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };

    if kind == ContentKind::Announcements {
        if payload.title.as_deref().unwrap_or("").is_empty() {
            return bad_request("title required");
        }
    } else if payload.name.as_deref().unwrap_or("").is_empty() {
        return bad_request("name required");
    }

    let created = match kind {
        ContentKind::Shops => Shop::create(&state.pool, &payload).await,
        ContentKind::Schools => School::create(&state.pool, &payload).await,
        ContentKind::Services => Service::create(&state.pool, &payload).await,
        ContentKind::Announcements => Announcement::create(&state.pool, &payload).await,
    };

    match created {
        Ok(id) => (
            StatusCode::CREATED,
            success_to_api_response(json!({ "id": id })),
        )
            .into_response(),
        Err(e) => db_error("Content create failed", e),
    }
}

#[axum::debug_handler]
pub async fn update_content(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ContentQuery>,
    Json(payload): Json<ContentPayload>,
) -> Response {
    if !user.role.can(Permission::ManageContent) {
        return forbidden();
    }

    let kind = match parse_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    let Some(id) = payload.id else {
        return bad_request("id required");
    };

    let updated = match kind {
        ContentKind::Shops => Shop::update(&state.pool, id, &payload).await,
        ContentKind::Schools => School::update(&state.pool, id, &payload).await,
        ContentKind::Services => Service::update(&state.pool, id, &payload).await,
        ContentKind::Announcements => Announcement::update(&state.pool, id, &payload).await,
    };

    match updated {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response("Updated".to_string()),
        )
            .into_response(),
        Ok(false) => not_found(),
        Err(e) => db_error("Content update failed", e),
    }
}

#[axum::debug_handler]
pub async fn delete_content(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    if !user.role.can(Permission::ManageContent) {
        return forbidden();
    }

    let kind = match parse_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    let Some(id) = query.id else {
        return bad_request("id required");
    };

    match delete_entity(&state.pool, kind, id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response("Deleted".to_string()),
        )
            .into_response(),
        Ok(false) => not_found(),
        Err(e) => db_error("Content delete failed", e),
    }
}

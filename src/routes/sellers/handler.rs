use axum::{
    Extension, Json as AxumJson,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    AppState,
    access::Permission,
    middleware::CurrentUser,
    utils::{ApiResponse, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{
    AssignmentRequest, Product, ProductRequest, SellerAssignment, SellerInfo, SellerListQuery,
    is_seller_for_shop, shop_for_seller,
};

fn forbidden<T>(msg: &str) -> (StatusCode, AxumJson<ApiResponse<T>>) {
    (
        StatusCode::FORBIDDEN,
        error_to_api_response(error_codes::PERMISSION_DENIED, msg.to_string()),
    )
}

fn bad_request<T>(msg: &str) -> (StatusCode, AxumJson<ApiResponse<T>>) {
    (
        StatusCode::BAD_REQUEST,
        error_to_api_response(error_codes::VALIDATION_ERROR, msg.to_string()),
    )
}

fn db_error<T>(context: &str, e: sqlx::Error) -> (StatusCode, AxumJson<ApiResponse<T>>) {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_to_api_response(error_codes::INTERNAL_ERROR, "Database error".to_string()),
    )
}

#[axum::debug_handler]
pub async fn seller_info(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> impl IntoResponse {
    let shop = match shop_for_seller(&state.pool, user.id).await {
        Ok(Some(shop)) => shop,
        Ok(None) => return forbidden("No active seller assignment"),
        Err(e) => return db_error("Seller lookup failed", e),
    };

    match Product::for_shop(&state.pool, shop.id).await {
        Ok(products) => (
            StatusCode::OK,
            success_to_api_response(SellerInfo { shop, products }),
        ),
        Err(e) => db_error("Product list failed", e),
    }
}

#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ProductRequest>,
) -> impl IntoResponse {
    let (Some(shop_id), Some(name)) = (req.shop_id, req.name.as_deref()) else {
        return bad_request("name and shop_id required");
    };
    if name.is_empty() {
        return bad_request("name and shop_id required");
    }

    match is_seller_for_shop(&state.pool, user.id, shop_id).await {
        Ok(true) => {}
        Ok(false) => return forbidden("Not a seller for this shop"),
        Err(e) => return db_error("Seller check failed", e),
    }

    match Product::create(&state.pool, &req).await {
        Ok(id) => (
            StatusCode::CREATED,
            success_to_api_response(json!({ "id": id })),
        ),
        Err(e) => db_error("Product insert failed", e),
    }
}

/// Resolves the product's shop and re-checks the caller's assignment before
/// touching the row.
async fn guard_product(
    state: &AppState,
    user_id: i64,
    product_id: i64,
) -> Result<(), (StatusCode, AxumJson<ApiResponse<serde_json::Value>>)> {
    let shop_id = match Product::shop_of(&state.pool, product_id).await {
        Ok(Some(shop_id)) => shop_id,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Product not found".to_string()),
            ));
        }
        Err(e) => return Err(db_error("Product lookup failed", e)),
    };

    match is_seller_for_shop(&state.pool, user_id, shop_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(forbidden("Not a seller for this shop")),
        Err(e) => Err(db_error("Seller check failed", e)),
    }
}

#[axum::debug_handler]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<i64>,
    Json(req): Json<ProductRequest>,
) -> impl IntoResponse {
    if let Err(resp) = guard_product(&state, user.id, product_id).await {
        return resp;
    }

    match Product::update(&state.pool, product_id, &req).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(json!({ "message": "Product updated" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Product not found".to_string()),
        ),
        Err(e) => db_error("Product update failed", e),
    }
}

#[axum::debug_handler]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(resp) = guard_product(&state, user.id, product_id).await {
        return resp;
    }

    match Product::retire(&state.pool, product_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(json!({ "message": "Product removed" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Product not found".to_string()),
        ),
        Err(e) => db_error("Product delete failed", e),
    }
}

#[axum::debug_handler]
pub async fn assign_seller(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AssignmentRequest>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ManageSellers) {
        return forbidden("Only a CEO may assign sellers");
    }

    let (Some(seller_user_id), Some(shop_id)) = (req.seller_user_id, req.shop_id) else {
        return bad_request("seller_user_id and shop_id required");
    };

    match SellerAssignment::assign(&state.pool, seller_user_id, shop_id, user.id).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response("Seller assigned".to_string()),
        ),
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User or shop not found".to_string()),
        ),
        Err(e) => db_error("Seller assign failed", e),
    }
}

#[axum::debug_handler]
pub async fn revoke_seller(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AssignmentRequest>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ManageSellers) {
        return forbidden("Only a CEO may revoke sellers");
    }

    let (Some(seller_user_id), Some(shop_id)) = (req.seller_user_id, req.shop_id) else {
        return bad_request("seller_user_id and shop_id required");
    };

    match SellerAssignment::revoke(&state.pool, seller_user_id, shop_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response("Seller revoked".to_string()),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Assignment not found".to_string()),
        ),
        Err(e) => db_error("Seller revoke failed", e),
    }
}

#[axum::debug_handler]
pub async fn list_sellers(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SellerListQuery>,
) -> impl IntoResponse {
    if !user.role.can(Permission::ManageSellers) {
        return forbidden("Only a CEO may list sellers");
    }

    let Some(shop_id) = query.shop_id else {
        return bad_request("shop_id required");
    };

    match SellerAssignment::for_shop(&state.pool, shop_id).await {
        Ok(sellers) => (StatusCode::OK, success_to_api_response(sellers)),
        Err(e) => db_error("Seller list failed", e),
    }
}

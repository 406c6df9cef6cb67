use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Serialize, FromRow)]
pub struct SellerShop {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub shop_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SellerInfo {
    pub shop: SellerShop,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SellerAssignment {
    pub id: i64,
    pub user_id: i64,
    pub shop_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub shop_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub seller_user_id: Option<i64>,
    pub shop_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SellerListQuery {
    pub shop_id: Option<i64>,
}

/// The shop the user actively sells for, if any.
pub async fn shop_for_seller(pool: &PgPool, user_id: i64) -> Result<Option<SellerShop>, sqlx::Error> {
    sqlx::query_as::<_, SellerShop>(
        r#"
        SELECT s.id, s.name, s.description
        FROM shops s
        JOIN shop_sellers ss ON s.id = ss.shop_id
        WHERE ss.user_id = $1 AND ss.is_active
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn is_seller_for_shop(
    pool: &PgPool,
    user_id: i64,
    shop_id: i64,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT 1 FROM shop_sellers WHERE user_id = $1 AND shop_id = $2 AND is_active LIMIT 1",
    )
    .bind(user_id)
    .bind(shop_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

impl Product {
    pub async fn for_shop(pool: &PgPool, shop_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE shop_id = $1 ORDER BY created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(pool)
        .await
    }

    pub async fn shop_of(pool: &PgPool, product_id: i64) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT shop_id FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(shop_id,)| shop_id))
    }

    pub async fn create(pool: &PgPool, req: &ProductRequest) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO products
                (shop_id, name, description, price, image_url, category, brand, model, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(req.shop_id)
        .bind(req.name.as_deref())
        .bind(req.description.as_deref())
        .bind(req.price.as_deref())
        .bind(req.image_url.as_deref())
        .bind(req.category.as_deref())
        .bind(req.brand.as_deref())
        .bind(req.model.as_deref())
        .bind(req.in_stock.unwrap_or(true))
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: i64, req: &ProductRequest) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                image_url = COALESCE($4, image_url),
                category = COALESCE($5, category),
                brand = COALESCE($6, brand),
                model = COALESCE($7, model),
                in_stock = COALESCE($8, in_stock),
                updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(req.name.as_deref())
        .bind(req.description.as_deref())
        .bind(req.price.as_deref())
        .bind(req.image_url.as_deref())
        .bind(req.category.as_deref())
        .bind(req.brand.as_deref())
        .bind(req.model.as_deref())
        .bind(req.in_stock)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft delete; the product stays listed for the shop but out of stock.
    pub async fn retire(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE products SET in_stock = false, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl SellerAssignment {
    pub async fn assign(
        pool: &PgPool,
        seller_user_id: i64,
        shop_id: i64,
        assigned_by: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO shop_sellers (user_id, shop_id, assigned_by, is_active)
            VALUES ($1, $2, $3, true)
            ON CONFLICT (user_id, shop_id)
            DO UPDATE SET is_active = true, assigned_by = $3, assigned_at = NOW()
            "#,
        )
        .bind(seller_user_id)
        .bind(shop_id)
        .bind(assigned_by)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn revoke(
        pool: &PgPool,
        seller_user_id: i64,
        shop_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE shop_sellers SET is_active = false WHERE user_id = $1 AND shop_id = $2",
        )
        .bind(seller_user_id)
        .bind(shop_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn for_shop(pool: &PgPool, shop_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SellerAssignment>(
            r#"
            SELECT
                ss.id, ss.user_id, ss.shop_id,
                u.username, u.first_name, u.last_name,
                ss.assigned_at, ss.is_active
            FROM shop_sellers ss
            JOIN users u ON ss.user_id = u.id
            WHERE ss.shop_id = $1
            ORDER BY ss.assigned_at DESC
            "#,
        )
        .bind(shop_id)
        .fetch_all(pool)
        .await
    }
}

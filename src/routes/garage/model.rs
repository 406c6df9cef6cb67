use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Serialize, FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i32>,
    pub engine: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<i32>,
    pub status: String,
    pub photo_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub engine: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<i32>,
    pub photo_url: Option<String>,
    pub description: Option<String>,
}

fn default_kind() -> String {
    "motorcycle".to_string()
}

#[derive(Debug, Deserialize)]
pub struct UpdateVehicleRequest {
    pub kind: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub engine: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<i32>,
    pub status: Option<String>,
    pub photo_url: Option<String>,
    pub description: Option<String>,
}

impl Vehicle {
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM user_vehicles WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        req: &CreateVehicleRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO user_vehicles
                (user_id, kind, brand, model, year, engine, color, mileage, status, photo_url, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', $9, $10)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&req.kind)
        .bind(&req.brand)
        .bind(&req.model)
        .bind(req.year)
        .bind(&req.engine)
        .bind(&req.color)
        .bind(req.mileage)
        .bind(&req.photo_url)
        .bind(&req.description)
        .fetch_one(pool)
        .await
    }

    /// Updates only the caller's own vehicle; None when the row does not exist
    /// or belongs to someone else.
    pub async fn update(
        pool: &PgPool,
        user_id: i64,
        vehicle_id: i64,
        req: &UpdateVehicleRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE user_vehicles
            SET kind = COALESCE($1, kind),
                brand = COALESCE($2, brand),
                model = COALESCE($3, model),
                year = COALESCE($4, year),
                engine = COALESCE($5, engine),
                color = COALESCE($6, color),
                mileage = COALESCE($7, mileage),
                status = COALESCE($8, status),
                photo_url = COALESCE($9, photo_url),
                description = COALESCE($10, description),
                updated_at = NOW()
            WHERE id = $11 AND user_id = $12
            RETURNING *
            "#,
        )
        .bind(&req.kind)
        .bind(&req.brand)
        .bind(&req.model)
        .bind(req.year)
        .bind(&req.engine)
        .bind(&req.color)
        .bind(req.mileage)
        .bind(&req.status)
        .bind(&req.photo_url)
        .bind(&req.description)
        .bind(vehicle_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: i64, vehicle_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_vehicles WHERE id = $1 AND user_id = $2")
            .bind(vehicle_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

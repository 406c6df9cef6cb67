use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Serialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub telegram: Option<String>,
    pub callsign: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Favorite {
    pub item_type: String,
    pub item_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub callsign: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub item_type: Option<String>,
    pub item_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
    pub favorites: Vec<Favorite>,
}

impl Profile {
    pub async fn fetch(pool: &PgPool, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT
                u.id, u.email, u.name, u.created_at,
                p.phone, p.avatar_url, p.bio, p.location, p.telegram, p.callsign
            FROM users u
            LEFT JOIN user_profiles p ON u.id = p.user_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Partial update: absent fields keep their current value.
    pub async fn update(
        pool: &PgPool,
        user_id: i64,
        req: &UpdateProfileRequest,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE user_profiles
            SET phone = COALESCE($1, phone),
                bio = COALESCE($2, bio),
                location = COALESCE($3, location),
                avatar_url = COALESCE($4, avatar_url),
                callsign = COALESCE($5, callsign),
                updated_at = NOW()
            WHERE user_id = $6
            "#,
        )
        .bind(&req.phone)
        .bind(&req.bio)
        .bind(&req.location)
        .bind(&req.avatar_url)
        .bind(&req.callsign)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl Favorite {
    pub async fn list(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Favorite>(
            r#"
            SELECT item_type, item_id, created_at
            FROM user_favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Returns false when the item is already a favorite.
    pub async fn add(
        pool: &PgPool,
        user_id: i64,
        item_type: &str,
        item_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO user_favorites (user_id, item_type, item_id) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(item_type)
                .bind(item_id)
                .execute(pool)
                .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn remove(
        pool: &PgPool,
        user_id: i64,
        item_type: &str,
        item_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "DELETE FROM user_favorites WHERE user_id = $1 AND item_type = $2 AND item_id = $3",
        )
        .bind(user_id)
        .bind(item_type)
        .bind(item_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

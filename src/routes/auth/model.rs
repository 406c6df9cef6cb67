use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::access::Role;
use crate::utils::generate_session_token;

#[derive(Debug, Deserialize)]
pub struct TelegramAuthRequest {
    pub telegram_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub callsign: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

impl AuthUser {
    pub async fn find_by_telegram_id(
        pool: &PgPool,
        telegram_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuthUser>(
            "SELECT id, name, email, role FROM users WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create_from_telegram(
        pool: &PgPool,
        req: &TelegramAuthRequest,
    ) -> Result<Self, sqlx::Error> {
        let telegram_id = req.telegram_id.unwrap_or_default();
        let first_name = req.first_name.clone().unwrap_or_default();
        let name = match &req.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", first_name, last),
            _ => first_name.clone(),
        };

        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, AuthUser>(
            r#"
            INSERT INTO users (telegram_id, name, first_name, last_name, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6, '', 'user')
            RETURNING id, name, email, role
            "#,
        )
        .bind(telegram_id)
        .bind(&name)
        .bind(&first_name)
        .bind(&req.last_name)
        .bind(&req.username)
        .bind(format!("tg_{}@telegram.user", telegram_id))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_profiles (user_id, avatar_url, telegram) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&req.photo_url)
            .bind(&req.username)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Refreshes avatar and telegram handle on every login; empty values are
    /// left untouched.
    pub async fn refresh_telegram_profile(
        pool: &PgPool,
        user_id: i64,
        req: &TelegramAuthRequest,
    ) -> Result<(), sqlx::Error> {
        if !req.photo_url.is_empty() {
            sqlx::query("UPDATE user_profiles SET avatar_url = $1 WHERE user_id = $2")
                .bind(&req.photo_url)
                .bind(user_id)
                .execute(pool)
                .await?;
        }

        if let Some(username) = req.username.as_deref().filter(|u| !u.is_empty()) {
            sqlx::query("UPDATE user_profiles SET telegram = $1 WHERE user_id = $2")
                .bind(username)
                .bind(user_id)
                .execute(pool)
                .await?;
        }

        Ok(())
    }

    pub async fn callsign(pool: &PgPool, user_id: i64) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT callsign FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.and_then(|(callsign,)| callsign))
    }
}

pub struct Session;

impl Session {
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        ttl: chrono::Duration,
    ) -> Result<String, sqlx::Error> {
        let token = generate_session_token();
        let expires_at: DateTime<Utc> = Utc::now() + ttl;

        sqlx::query("INSERT INTO user_sessions (user_id, token, expires_at) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(&token)
            .bind(expires_at)
            .execute(pool)
            .await?;

        Ok(token)
    }

    pub async fn delete(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_sessions WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }
}

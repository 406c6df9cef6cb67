use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::access::Role;
use crate::utils::{hash_password, verify_password};

#[derive(Debug, Serialize, FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct UpdatedUser {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub user_id: Option<i64>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_shops: i64,
    pub total_announcements: i64,
    pub total_schools: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RecentActivity {
    pub id: i64,
    pub action: String,
    pub created_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Stats,
    pub recent_activity: Vec<RecentActivity>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub action: String,
    pub location: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LogActivityRequest {
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub location: Option<String>,
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdminPasswordRequest {
    pub action: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAdminPasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

impl AdminUser {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT
                u.id, u.email, u.name, u.role, u.is_active, u.created_at,
                u.telegram_id, u.username, u.first_name, u.last_name,
                p.phone, p.bio, p.location
            FROM users u
            LEFT JOIN user_profiles p ON u.id = p.user_id
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_role(pool: &PgPool, user_id: i64) -> Result<Option<Role>, sqlx::Error> {
        let row: Option<(Role,)> = sqlx::query_as("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(role,)| role))
    }

    pub async fn update_role(
        pool: &PgPool,
        user_id: i64,
        role: Role,
    ) -> Result<Option<UpdatedUser>, sqlx::Error> {
        sqlx::query_as::<_, UpdatedUser>(
            "UPDATE users SET role = $1 WHERE id = $2 RETURNING id, name, role",
        )
        .bind(role)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_active(pool: &PgPool, user_id: i64, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
            .bind(active)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Removes the user and every dependent row in one transaction, so a
    /// half-deleted account can never be observed.
    pub async fn delete_cascade(pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        for sql in [
            "UPDATE shop_sellers SET assigned_by = NULL WHERE assigned_by = $1",
            "UPDATE organization_requests SET reviewed_by = NULL WHERE reviewed_by = $1",
            "DELETE FROM user_sessions WHERE user_id = $1",
            "DELETE FROM user_favorites WHERE user_id = $1",
            "DELETE FROM user_vehicles WHERE user_id = $1",
            "DELETE FROM friendships WHERE user_id = $1 OR friend_id = $1",
            "DELETE FROM shop_sellers WHERE user_id = $1",
            "DELETE FROM organization_requests WHERE user_id = $1",
            "DELETE FROM user_activity_log WHERE user_id = $1",
            "DELETE FROM user_profiles WHERE user_id = $1",
        ] {
            sqlx::query(sql).bind(user_id).execute(&mut *tx).await?;
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Stats {
    pub async fn collect(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let count = |sql: &'static str| sqlx::query_scalar::<_, i64>(sql).fetch_one(pool);

        Ok(Stats {
            total_users: count("SELECT COUNT(*) FROM users").await?,
            active_users: count("SELECT COUNT(*) FROM users WHERE is_active").await?,
            total_shops: count("SELECT COUNT(*) FROM shops").await?,
            total_announcements: count("SELECT COUNT(*) FROM announcements").await?,
            total_schools: count("SELECT COUNT(*) FROM schools").await?,
        })
    }
}

impl RecentActivity {
    pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RecentActivity>(
            r#"
            SELECT
                l.id, l.action, l.created_at,
                u.name AS user_name,
                u.role AS user_role,
                p.location
            FROM user_activity_log l
            LEFT JOIN users u ON l.user_id = u.id
            LEFT JOIN user_profiles p ON u.id = p.user_id
            ORDER BY l.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

impl ActivityEntry {
    pub async fn log(
        pool: &PgPool,
        user_id: i64,
        action: &str,
        location: Option<&str>,
        details: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_activity_log (user_id, action, location, details) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(action)
        .bind(location)
        .bind(details)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, action, location, details, created_at
            FROM user_activity_log
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 100
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

/// Single-row bcrypt hash backing the legacy admin panel password.
pub struct AdminAuth;

impl AdminAuth {
    pub async fn has_password(pool: &PgPool) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_auth")
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    /// Sets the initial password; fails once one exists.
    pub async fn setup(pool: &PgPool, password: &str) -> Result<bool, sqlx::Error> {
        if Self::has_password(pool).await? {
            return Ok(false);
        }
        let hash = hash_password(password)
            .map_err(|e| sqlx::Error::Protocol(format!("bcrypt failure: {}", e)))?;
        sqlx::query("INSERT INTO admin_auth (password_hash) VALUES ($1)")
            .bind(hash)
            .execute(pool)
            .await?;
        Ok(true)
    }

    pub async fn verify(pool: &PgPool, password: &str) -> Result<Option<bool>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM admin_auth ORDER BY id DESC LIMIT 1")
                .fetch_optional(pool)
                .await?;
        match row {
            None => Ok(None),
            Some((hash,)) => Ok(Some(verify_password(password, &hash).unwrap_or(false))),
        }
    }

    pub async fn change(pool: &PgPool, old: &str, new: &str) -> Result<Option<bool>, sqlx::Error> {
        match Self::verify(pool, old).await? {
            None => Ok(None),
            Some(false) => Ok(Some(false)),
            Some(true) => {
                let hash = hash_password(new)
                    .map_err(|e| sqlx::Error::Protocol(format!("bcrypt failure: {}", e)))?;
                sqlx::query("UPDATE admin_auth SET password_hash = $1, updated_at = NOW()")
                    .bind(hash)
                    .execute(pool)
                    .await?;
                Ok(Some(true))
            }
        }
    }
}

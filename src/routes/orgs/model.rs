use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Serialize, FromRow)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub contact: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct OrganizationRequest {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub contact: Option<String>,
    pub website: Option<String>,
    pub status: String,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub contact: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
}

impl OrganizationRequest {
    pub async fn submit(
        pool: &PgPool,
        user_id: i64,
        req: &SubmitRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, OrganizationRequest>(
            r#"
            INSERT INTO organization_requests (user_id, name, description, category, contact, website, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(req.name.as_deref())
        .bind(req.description.as_deref())
        .bind(req.category.as_deref())
        .bind(req.contact.as_deref())
        .bind(req.website.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn list(pool: &PgPool, status: Option<&str>) -> Result<Vec<Self>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, OrganizationRequest>(
                    "SELECT * FROM organization_requests WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, OrganizationRequest>(
                    "SELECT * FROM organization_requests ORDER BY created_at DESC",
                )
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Approves a still-pending request and materializes the organization in
    /// one transaction. Returns None when the request is gone or already
    /// resolved, so a second approval cannot create a duplicate.
    pub async fn approve(
        pool: &PgPool,
        request_id: i64,
        reviewer: i64,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, OrganizationRequest>(
            r#"
            UPDATE organization_requests
            SET status = 'approved', reviewed_by = $1, reviewed_at = NOW()
            WHERE id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(reviewer)
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            return Ok(None);
        };

        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, description, category, contact, website, is_active)
            VALUES ($1, $2, $3, $4, $5, true)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(request.description.as_deref())
        .bind(request.category.as_deref())
        .bind(request.contact.as_deref())
        .bind(request.website.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(organization))
    }

    pub async fn reject(
        pool: &PgPool,
        request_id: i64,
        reviewer: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, OrganizationRequest>(
            r#"
            UPDATE organization_requests
            SET status = 'rejected', reviewed_by = $1, reviewed_at = NOW()
            WHERE id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(reviewer)
        .bind(request_id)
        .fetch_optional(pool)
        .await
    }
}

impl Organization {
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE is_active ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}

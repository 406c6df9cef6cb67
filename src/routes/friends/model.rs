use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Friendship {
    pub id: i64,
    /// Requester.
    pub user_id: i64,
    /// Recipient; the only side allowed to accept or reject.
    pub friend_id: i64,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct FriendEntry {
    pub id: i64,
    pub user_id: i64,
    pub friend_id: i64,
    pub status: FriendshipStatus,
    pub direction: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FriendRequest {
    pub friend_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: Option<String>,
}

/// What to do with an incoming friend request given the current relationship
/// between the pair.
#[derive(Debug, PartialEq, Eq)]
pub enum RequestDecision {
    /// No row for the pair: insert a fresh pending request.
    Create,
    /// A pending request already exists: hand it back unchanged.
    ReturnExisting,
    /// Already friends: the request is a conflict.
    AlreadyFriends,
    /// Previously rejected: the pair may try again, flipping the row back to
    /// pending under the new requester.
    Reset,
}

pub fn decide_request(existing: Option<FriendshipStatus>) -> RequestDecision {
    match existing {
        None => RequestDecision::Create,
        Some(FriendshipStatus::Pending) => RequestDecision::ReturnExisting,
        Some(FriendshipStatus::Accepted) => RequestDecision::AlreadyFriends,
        Some(FriendshipStatus::Rejected) => RequestDecision::Reset,
    }
}

/// Only the recipient of a still-pending request may resolve it.
pub fn can_respond(friendship: &Friendship, caller: i64) -> bool {
    friendship.friend_id == caller && friendship.status == FriendshipStatus::Pending
}

impl Friendship {
    /// The relationship row for an unordered pair, whichever way it points.
    pub async fn find_between(pool: &PgPool, a: i64, b: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Friendship>(
            r#"
            SELECT * FROM friendships
            WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, requester: i64, recipient: i64) -> Result<Self, sqlx::Error> {
        // The unordered-pair unique index serializes racing requests; losing
        // the race falls back to the row the winner created.
        let inserted = sqlx::query_as::<_, Friendship>(
            r#"
            INSERT INTO friendships (user_id, friend_id, status)
            VALUES ($1, $2, 'pending')
            ON CONFLICT (LEAST(user_id, friend_id), GREATEST(user_id, friend_id)) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(requester)
        .bind(recipient)
        .fetch_optional(pool)
        .await?;

        match inserted {
            Some(row) => Ok(row),
            None => Self::find_between(pool, requester, recipient)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Turns a rejected row back into a pending request from `requester`.
    pub async fn reset_to_pending(
        pool: &PgPool,
        id: i64,
        requester: i64,
        recipient: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Friendship>(
            r#"
            UPDATE friendships
            SET user_id = $1, friend_id = $2, status = 'pending', updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(requester)
        .bind(recipient)
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Resolves a pending request. The WHERE clause enforces the recipient-only
    /// guard and makes a second call a no-op returning None.
    pub async fn respond(
        pool: &PgPool,
        id: i64,
        caller: i64,
        status: FriendshipStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Friendship>(
            r#"
            UPDATE friendships
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND friend_id = $3 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(id)
        .bind(caller)
        .fetch_optional(pool)
        .await
    }

    /// Either party may delete a pending or accepted relationship.
    pub async fn delete(pool: &PgPool, id: i64, caller: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE id = $1 AND (user_id = $2 OR friend_id = $2)
              AND status IN ('pending', 'accepted')
            "#,
        )
        .bind(id)
        .bind(caller)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<FriendEntry>, sqlx::Error> {
        sqlx::query_as::<_, FriendEntry>(
            r#"
            SELECT
                f.id, f.user_id, f.friend_id, f.status,
                CASE WHEN f.user_id = $1 THEN 'outgoing' ELSE 'incoming' END AS direction,
                u.name, p.avatar_url
            FROM friendships f
            JOIN users u ON u.id = CASE WHEN f.user_id = $1 THEN f.friend_id ELSE f.user_id END
            LEFT JOIN user_profiles p ON p.user_id = u.id
            WHERE (f.user_id = $1 OR f.friend_id = $1) AND f.status <> 'rejected'
            ORDER BY f.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friendship(requester: i64, recipient: i64, status: FriendshipStatus) -> Friendship {
        Friendship {
            id: 1,
            user_id: requester,
            friend_id: recipient,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fresh_pair_creates_a_request() {
        assert_eq!(decide_request(None), RequestDecision::Create);
    }

    #[test]
    fn duplicate_pending_returns_existing_row() {
        assert_eq!(
            decide_request(Some(FriendshipStatus::Pending)),
            RequestDecision::ReturnExisting
        );
    }

    #[test]
    fn requesting_an_accepted_friend_conflicts() {
        assert_eq!(
            decide_request(Some(FriendshipStatus::Accepted)),
            RequestDecision::AlreadyFriends
        );
    }

    #[test]
    fn rejected_pair_may_try_again() {
        assert_eq!(
            decide_request(Some(FriendshipStatus::Rejected)),
            RequestDecision::Reset
        );
    }

    #[test]
    fn only_recipient_of_pending_request_may_respond() {
        let pending = friendship(1, 2, FriendshipStatus::Pending);
        assert!(can_respond(&pending, 2));
        // requester cannot resolve their own request
        assert!(!can_respond(&pending, 1));
        // bystander
        assert!(!can_respond(&pending, 3));
    }

    #[test]
    fn resolved_requests_cannot_transition_again() {
        let accepted = friendship(1, 2, FriendshipStatus::Accepted);
        assert!(!can_respond(&accepted, 2));
        let rejected = friendship(1, 2, FriendshipStatus::Rejected);
        assert!(!can_respond(&rejected, 2));
    }
}

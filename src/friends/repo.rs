use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::friends::repo_types::{Friend, FriendInvite};

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Friend>> {
    let rows = sqlx::query_as::<_, Friend>(
        r#"
        SELECT f.friend_id AS user_id, u.username, f.created_at
        FROM friends f
        JOIN users u ON u.id = f.friend_id
        WHERE f.user_id = $1
        ORDER BY u.username
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn are_friends(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        SELECT 1 FROM friends WHERE user_id = $1 AND friend_id = $2
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_optional(db)
    .await?;
    Ok(row.is_some())
}

/// True when a pending invite exists in either direction.
pub async fn has_pending_invite(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        SELECT 1 FROM friend_invites
        WHERE status = 'pending'
          AND ((sender_id = $1 AND receiver_id = $2)
            OR (sender_id = $2 AND receiver_id = $1))
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_optional(db)
    .await?;
    Ok(row.is_some())
}

pub async fn create_invite(
    db: &PgPool,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> anyhow::Result<FriendInvite> {
    let invite = sqlx::query_as::<_, FriendInvite>(
        r#"
        WITH inserted AS (
            INSERT INTO friend_invites (sender_id, receiver_id)
            VALUES ($1, $2)
            RETURNING id, sender_id, receiver_id, status, created_at
        )
        SELECT i.id, i.sender_id, su.username AS sender_username,
               i.receiver_id, ru.username AS receiver_username,
               i.status, i.created_at
        FROM inserted i
        JOIN users su ON su.id = i.sender_id
        JOIN users ru ON ru.id = i.receiver_id
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .fetch_one(db)
    .await?;
    Ok(invite)
}

pub async fn pending_invites(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<FriendInvite>> {
    let rows = sqlx::query_as::<_, FriendInvite>(
        r#"
        SELECT i.id, i.sender_id, su.username AS sender_username,
               i.receiver_id, ru.username AS receiver_username,
               i.status, i.created_at
        FROM friend_invites i
        JOIN users su ON su.id = i.sender_id
        JOIN users ru ON ru.id = i.receiver_id
        WHERE (i.receiver_id = $1 OR i.sender_id = $1) AND i.status = 'pending'
        ORDER BY i.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[derive(Debug, sqlx::FromRow)]
pub struct FriendInviteRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
}

pub async fn find_invite(db: &PgPool, invite_id: Uuid) -> anyhow::Result<Option<FriendInviteRow>> {
    let row = sqlx::query_as::<_, FriendInviteRow>(
        r#"
        SELECT id, sender_id, receiver_id, status
        FROM friend_invites
        WHERE id = $1
        "#,
    )
    .bind(invite_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Accept an invite and write the two symmetric friendship rows in one
/// transaction. Returns false when the invite was no longer pending.
pub async fn accept_invite(
    db: &PgPool,
    invite_id: Uuid,
    receiver_id: Uuid,
) -> anyhow::Result<bool> {
    let mut tx = db.begin().await?;

    let updated: Option<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE friend_invites
        SET status = 'accepted', updated_at = now()
        WHERE id = $1 AND receiver_id = $2 AND status = 'pending'
        RETURNING sender_id
        "#,
    )
    .bind(invite_id)
    .bind(receiver_id)
    .fetch_optional(&mut *tx)
    .await
    .context("accept friend invite")?;

    let Some((sender_id,)) = updated else {
        tx.rollback().await?;
        return Ok(false);
    };

    sqlx::query(
        r#"
        INSERT INTO friends (user_id, friend_id)
        VALUES ($1, $2), ($2, $1)
        ON CONFLICT (user_id, friend_id) DO NOTHING
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .execute(&mut *tx)
    .await
    .context("insert friendship rows")?;

    tx.commit().await?;
    Ok(true)
}

pub async fn decline_invite(
    db: &PgPool,
    invite_id: Uuid,
    receiver_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE friend_invites
        SET status = 'declined', updated_at = now()
        WHERE id = $1 AND receiver_id = $2 AND status = 'pending'
        "#,
    )
    .bind(invite_id)
    .bind(receiver_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove both directions of a friendship. Returns false when there was no
/// such friendship.
pub async fn remove(db: &PgPool, user_id: Uuid, friend_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM friends
        WHERE (user_id = $1 AND friend_id = $2)
           OR (user_id = $2 AND friend_id = $1)
        "#,
    )
    .bind(user_id)
    .bind(friend_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

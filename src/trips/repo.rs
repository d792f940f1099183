use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::trips::repo_types::{Trip, TripInvite, TripMember};

pub async fn create_with_owner(
    db: &PgPool,
    name: &str,
    start_date: Option<Date>,
    end_date: Option<Date>,
    status: &str,
    owner_id: Uuid,
) -> anyhow::Result<Trip> {
    let mut tx = db.begin().await?;

    let trip = sqlx::query_as::<_, Trip>(
        r#"
        INSERT INTO trips (name, start_date, end_date, status)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, start_date, end_date, status, created_at
        "#,
    )
    .bind(name)
    .bind(start_date)
    .bind(end_date)
    .bind(status)
    .fetch_one(&mut *tx)
    .await
    .context("insert trip")?;

    sqlx::query(
        r#"
        INSERT INTO trip_members (trip_id, user_id, role)
        VALUES ($1, $2, 'owner')
        "#,
    )
    .bind(trip.id)
    .bind(owner_id)
    .execute(&mut *tx)
    .await
    .context("insert owner membership")?;

    tx.commit().await?;
    Ok(trip)
}

pub async fn find_by_id(db: &PgPool, trip_id: Uuid) -> anyhow::Result<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>(
        r#"
        SELECT id, name, start_date, end_date, status, created_at
        FROM trips
        WHERE id = $1
        "#,
    )
    .bind(trip_id)
    .fetch_optional(db)
    .await?;
    Ok(trip)
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>(
        r#"
        SELECT t.id, t.name, t.start_date, t.end_date, t.status, t.created_at
        FROM trips t
        JOIN trip_members tm ON tm.trip_id = t.id
        WHERE tm.user_id = $1
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(trips)
}

pub async fn update(
    db: &PgPool,
    trip_id: Uuid,
    name: Option<&str>,
    start_date: Option<Date>,
    end_date: Option<Date>,
    status: Option<&str>,
) -> anyhow::Result<Trip> {
    let trip = sqlx::query_as::<_, Trip>(
        r#"
        UPDATE trips
        SET name       = COALESCE($2, name),
            start_date = COALESCE($3, start_date),
            end_date   = COALESCE($4, end_date),
            status     = COALESCE($5, status)
        WHERE id = $1
        RETURNING id, name, start_date, end_date, status, created_at
        "#,
    )
    .bind(trip_id)
    .bind(name)
    .bind(start_date)
    .bind(end_date)
    .bind(status)
    .fetch_one(db)
    .await
    .context("update trip")?;
    Ok(trip)
}

/// Members with user info, in join order.
pub async fn members(db: &PgPool, trip_id: Uuid) -> anyhow::Result<Vec<TripMember>> {
    let rows = sqlx::query_as::<_, TripMember>(
        r#"
        SELECT tm.trip_id, tm.user_id, u.username, tm.role, tm.joined_at
        FROM trip_members tm
        JOIN users u ON u.id = tm.user_id
        WHERE tm.trip_id = $1
        ORDER BY tm.joined_at, u.username
        "#,
    )
    .bind(trip_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn is_member(db: &PgPool, trip_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        SELECT 1 FROM trip_members WHERE trip_id = $1 AND user_id = $2
        "#,
    )
    .bind(trip_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row.is_some())
}

/// Guard used by every trip-scoped endpoint: 404 if the trip does not exist,
/// 403 if the caller is not a member.
pub async fn ensure_member(db: &PgPool, trip_id: Uuid, user_id: Uuid) -> Result<Trip> {
    let trip = find_by_id(db, trip_id)
        .await?
        .ok_or(AppError::NotFound("trip not found".into()))?;
    if !is_member(db, trip_id, user_id).await? {
        return Err(AppError::Forbidden("not a member of this trip".into()));
    }
    Ok(trip)
}

/// Sum and count of a trip's expenses for the list aggregates.
pub async fn expense_aggregates(db: &PgPool, trip_id: Uuid) -> anyhow::Result<(Decimal, i64)> {
    let row: (Decimal, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(total), 0), COUNT(*)
        FROM expenses
        WHERE trip_id = $1
        "#,
    )
    .bind(trip_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}

// ── Trip invites ─────────────────────────────────────────────

pub async fn create_invite(
    db: &PgPool,
    trip_id: Uuid,
    inviter_id: Uuid,
    invitee_id: Uuid,
) -> anyhow::Result<TripInvite> {
    let invite = sqlx::query_as::<_, TripInvite>(
        r#"
        WITH inserted AS (
            INSERT INTO trip_invites (trip_id, inviter_id, invitee_id)
            VALUES ($1, $2, $3)
            RETURNING id, trip_id, inviter_id, invitee_id, status, created_at
        )
        SELECT i.id, i.trip_id, t.name AS trip_name, i.inviter_id,
               u.username AS inviter_username, i.invitee_id, i.status, i.created_at
        FROM inserted i
        JOIN trips t ON t.id = i.trip_id
        JOIN users u ON u.id = i.inviter_id
        "#,
    )
    .bind(trip_id)
    .bind(inviter_id)
    .bind(invitee_id)
    .fetch_one(db)
    .await?;
    Ok(invite)
}

pub async fn has_pending_invite(
    db: &PgPool,
    trip_id: Uuid,
    invitee_id: Uuid,
) -> anyhow::Result<bool> {
    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        SELECT 1 FROM trip_invites
        WHERE trip_id = $1 AND invitee_id = $2 AND status = 'pending'
        "#,
    )
    .bind(trip_id)
    .bind(invitee_id)
    .fetch_optional(db)
    .await?;
    Ok(row.is_some())
}

pub async fn pending_invites_for_user(
    db: &PgPool,
    invitee_id: Uuid,
) -> anyhow::Result<Vec<TripInvite>> {
    let rows = sqlx::query_as::<_, TripInvite>(
        r#"
        SELECT i.id, i.trip_id, t.name AS trip_name, i.inviter_id,
               u.username AS inviter_username, i.invitee_id, i.status, i.created_at
        FROM trip_invites i
        JOIN trips t ON t.id = i.trip_id
        JOIN users u ON u.id = i.inviter_id
        WHERE i.invitee_id = $1 AND i.status = 'pending'
        ORDER BY i.created_at DESC
        "#,
    )
    .bind(invitee_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Row as stored, without the joined projections.
#[derive(Debug, sqlx::FromRow)]
pub struct TripInviteRow {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_id: Uuid,
    pub status: String,
}

pub async fn find_invite(db: &PgPool, invite_id: Uuid) -> anyhow::Result<Option<TripInviteRow>> {
    let row = sqlx::query_as::<_, TripInviteRow>(
        r#"
        SELECT id, trip_id, inviter_id, invitee_id, status
        FROM trip_invites
        WHERE id = $1
        "#,
    )
    .bind(invite_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Accept an invite and insert the membership in one transaction. The status
/// precondition lives in the UPDATE itself, so a concurrent accept/decline
/// loses cleanly: returns false when the invite was no longer pending.
pub async fn accept_invite(db: &PgPool, invite_id: Uuid, invitee_id: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await?;

    let updated: Option<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE trip_invites
        SET status = 'accepted', updated_at = now()
        WHERE id = $1 AND invitee_id = $2 AND status = 'pending'
        RETURNING trip_id
        "#,
    )
    .bind(invite_id)
    .bind(invitee_id)
    .fetch_optional(&mut *tx)
    .await
    .context("accept invite")?;

    let Some((trip_id,)) = updated else {
        tx.rollback().await?;
        return Ok(false);
    };

    sqlx::query(
        r#"
        INSERT INTO trip_members (trip_id, user_id, role)
        VALUES ($1, $2, 'member')
        ON CONFLICT (trip_id, user_id) DO NOTHING
        "#,
    )
    .bind(trip_id)
    .bind(invitee_id)
    .execute(&mut *tx)
    .await
    .context("insert membership")?;

    tx.commit().await?;
    Ok(true)
}

pub async fn decline_invite(db: &PgPool, invite_id: Uuid, invitee_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE trip_invites
        SET status = 'declined', updated_at = now()
        WHERE id = $1 AND invitee_id = $2 AND status = 'pending'
        "#,
    )
    .bind(invite_id)
    .bind(invitee_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

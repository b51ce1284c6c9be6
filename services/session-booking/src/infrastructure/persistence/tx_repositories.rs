//! Transactional repositories for session-booking
//!
//! These repositories use a shared transaction instead of a connection pool.
//! 名额与积分的检查和写入都放在单条条件 UPDATE 中完成。

use async_trait::async_trait;
use learnhub_adapter_postgres::advisory_xact_lock;
use learnhub_common::UserId;
use learnhub_errors::{AppError, AppResult};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error_mapper::map_sqlx_error;
use super::rows::{to_i32, BookingRow, ProfileRow, SessionRow, BOOKING_COLUMNS, SESSION_COLUMNS};
use crate::domain::booking::{Booking, BookingId, BookingRepository, BookingStatus};
use crate::domain::session::{Session, SessionId, SessionRepository};
use crate::domain::wallet::{PointsRepository, Profile};

/// Shared transaction type
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 用户级咨询锁的命名空间
const USER_BOOKING_LOCK: &str = "session_booking.user";

/// Macro to define a TxRepository structure
macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxSessionRepository);
define_tx_repo!(TxBookingRepository);
define_tx_repo!(TxPointsRepository);

fn consumed() -> AppError {
    AppError::internal("Transaction consumed")
}

#[async_trait]
impl SessionRepository for TxSessionRepository {
    async fn find_by_id(&self, id: &SessionId) -> AppResult<Option<Session>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let sql = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(SessionRow::into_session).transpose()
    }

    async fn increment_participants_if_available(&self, id: &SessionId) -> AppResult<bool> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET current_participants = current_participants + 1, updated_at = NOW()
            WHERE id = $1 AND current_participants < max_participants
            "#,
        )
        .bind(id.0)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn decrement_participants(&self, id: &SessionId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET current_participants = GREATEST(current_participants - 1, 0), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Session {} not found", id)));
        }
        Ok(())
    }

    async fn create_many(&self, sessions: &[Session]) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        // 根场次在前，子场次的外键才能指向它
        for session in sessions {
            sqlx::query(
                r#"
                INSERT INTO sessions (
                    id, title, description, session_type, host_name, meeting_url, scheduled_at,
                    duration_minutes, max_participants, current_participants, points_required,
                    is_active, is_recurring, recurring_parent_id, recurring_weeks,
                    created_at, created_by, updated_at, updated_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
                "#,
            )
            .bind(session.id.0)
            .bind(&session.title)
            .bind(&session.description)
            .bind(session.session_type.as_str())
            .bind(&session.host_name)
            .bind(&session.meeting_url)
            .bind(session.scheduled_at)
            .bind(to_i32(session.duration_minutes, "duration_minutes")?)
            .bind(to_i32(session.max_participants, "max_participants")?)
            .bind(to_i32(session.current_participants, "current_participants")?)
            .bind(to_i32(session.points_required, "points_required")?)
            .bind(session.is_active)
            .bind(session.recurrence.is_recurring())
            .bind(session.recurrence.parent_id().map(|p| p.0))
            .bind(
                session
                    .recurrence
                    .recurring_weeks()
                    .map(|w| to_i32(w, "recurring_weeks"))
                    .transpose()?,
            )
            .bind(session.audit_info.created_at)
            .bind(session.audit_info.created_by.map(|u| u.0))
            .bind(session.audit_info.updated_at)
            .bind(session.audit_info.updated_by.map(|u| u.0))
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl BookingRepository for TxBookingRepository {
    async fn lock_user(&self, user_id: &UserId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        advisory_xact_lock(tx, USER_BOOKING_LOCK, &user_id.to_string()).await
    }

    async fn create(&self, booking: &Booking) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, session_id, status, points_spent, created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(booking.id.0)
        .bind(booking.user_id.0)
        .bind(booking.session_id.0)
        .bind(booking.status.as_str())
        .bind(to_i32(booking.points_spent, "points_spent")?)
        .bind(booking.audit_info.created_at)
        .bind(booking.audit_info.created_by.map(|u| u.0))
        .bind(booking.audit_info.updated_at)
        .bind(booking.audit_info.updated_by.map(|u| u.0))
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &BookingId) -> AppResult<Option<Booking>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let sql = format!(
            "SELECT {} FROM bookings WHERE id = $1 FOR UPDATE",
            BOOKING_COLUMNS
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn find_active_by_user(&self, user_id: &UserId) -> AppResult<Vec<Booking>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let sql = format!(
            "SELECT {} FROM bookings WHERE user_id = $1 AND status = $2 ORDER BY created_at ASC",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(user_id.0)
            .bind(BookingStatus::Confirmed.as_str())
            .fetch_all(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn update_status(&self, booking: &Booking, expected: BookingStatus) -> AppResult<bool> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $3, updated_at = $4, updated_by = $5
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(booking.id.0)
        .bind(expected.as_str())
        .bind(booking.status.as_str())
        .bind(booking.audit_info.updated_at)
        .bind(booking.audit_info.updated_by.map(|u| u.0))
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl PointsRepository for TxPointsRepository {
    async fn get_balance(&self, user_id: &UserId) -> AppResult<Option<i64>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query_scalar::<_, i64>("SELECT points FROM profiles WHERE user_id = $1")
            .bind(user_id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn apply_delta(&self, user_id: &UserId, delta: i64) -> AppResult<Option<Profile>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        // SET 右侧引用的是更新前的 points
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET points = points + $2,
                level = ((points + $2) / 100 + 1)::INTEGER,
                updated_at = NOW()
            WHERE user_id = $1 AND points + $2 >= 0
            RETURNING user_id, points, level
            "#,
        )
        .bind(user_id.0)
        .bind(delta)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(row) = row {
            return Ok(Some(row.into_profile()));
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE user_id = $1)")
                .bind(user_id.0)
                .fetch_one(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;

        if !exists {
            return Err(AppError::not_found(format!(
                "Profile for user {} not found",
                user_id
            )));
        }
        Ok(None)
    }
}

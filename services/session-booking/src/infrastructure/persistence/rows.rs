//! 数据库行映射

use chrono::{DateTime, Utc};
use learnhub_common::{AuditInfo, UserId};
use learnhub_errors::{AppError, AppResult};
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingId};
use crate::domain::session::{Recurrence, Session, SessionId};
use crate::domain::wallet::Profile;

pub(crate) const SESSION_COLUMNS: &str = r#"
    id, title, description, session_type, host_name, meeting_url, scheduled_at,
    duration_minutes, max_participants, current_participants, points_required, is_active,
    is_recurring, recurring_parent_id, recurring_weeks,
    created_at, created_by, updated_at, updated_by
"#;

pub(crate) const BOOKING_COLUMNS: &str = r#"
    id, user_id, session_id, status, points_spent,
    created_at, created_by, updated_at, updated_by
"#;

fn to_u32(value: i32, column: &str) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::internal(format!("Column {} holds negative value {}", column, value)))
}

/// 写入 INTEGER 列
pub(crate) fn to_i32(value: u32, column: &str) -> AppResult<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::validation(format!("Value {} is too large for {}", value, column)))
}

fn audit(
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
) -> AuditInfo {
    AuditInfo {
        created_at,
        created_by: created_by.map(UserId::from_uuid),
        updated_at,
        updated_by: updated_by.map(UserId::from_uuid),
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SessionRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    session_type: String,
    host_name: Option<String>,
    meeting_url: Option<String>,
    scheduled_at: DateTime<Utc>,
    duration_minutes: i32,
    max_participants: i32,
    current_participants: i32,
    points_required: i32,
    is_active: bool,
    is_recurring: bool,
    recurring_parent_id: Option<Uuid>,
    recurring_weeks: Option<i32>,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}

impl SessionRow {
    pub(crate) fn into_session(self) -> AppResult<Session> {
        let weeks = self
            .recurring_weeks
            .map(|w| to_u32(w, "recurring_weeks"))
            .transpose()?;
        let recurrence =
            Recurrence::from_columns(self.is_recurring, self.recurring_parent_id, weeks)
                .map_err(AppError::internal)?;

        Ok(Session {
            id: SessionId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            session_type: self.session_type.parse().map_err(AppError::internal)?,
            host_name: self.host_name,
            meeting_url: self.meeting_url,
            scheduled_at: self.scheduled_at,
            duration_minutes: to_u32(self.duration_minutes, "duration_minutes")?,
            max_participants: to_u32(self.max_participants, "max_participants")?,
            current_participants: to_u32(self.current_participants, "current_participants")?,
            points_required: to_u32(self.points_required, "points_required")?,
            is_active: self.is_active,
            recurrence,
            audit_info: audit(
                self.created_at,
                self.created_by,
                self.updated_at,
                self.updated_by,
            ),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    session_id: Uuid,
    status: String,
    points_spent: i32,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}

impl BookingRow {
    pub(crate) fn into_booking(self) -> AppResult<Booking> {
        Ok(Booking {
            id: BookingId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            session_id: SessionId::from_uuid(self.session_id),
            status: self.status.parse().map_err(AppError::internal)?,
            points_spent: to_u32(self.points_spent, "points_spent")?,
            audit_info: audit(
                self.created_at,
                self.created_by,
                self.updated_at,
                self.updated_by,
            ),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    pub(crate) user_id: Uuid,
    pub(crate) points: i64,
    pub(crate) level: i32,
}

impl ProfileRow {
    pub(crate) fn into_profile(self) -> Profile {
        Profile {
            user_id: UserId::from_uuid(self.user_id),
            points: self.points,
            level: self.level,
        }
    }
}

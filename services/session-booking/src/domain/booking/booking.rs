//! 预约实体

use learnhub_common::{AuditInfo, UserId};
use learnhub_domain_core::{AggregateRoot, Entity};
use learnhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::session::SessionId;

/// 每个用户同时持有的 CONFIRMED 预约上限
pub const MAX_ACTIVE_BOOKINGS_PER_USER: usize = 2;

/// 预约 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// 预约状态
///
/// 只允许 CONFIRMED -> CANCELLED 与 CONFIRMED -> COMPLETED。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Confirmed)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

/// 预约实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub status: BookingStatus,
    /// 预约时实际扣除的积分，取消时按此退还
    pub points_spent: u32,
    pub audit_info: AuditInfo,
}

impl Booking {
    /// 创建一条已确认的预约
    pub fn confirmed(user_id: UserId, session_id: SessionId, points_spent: u32) -> Self {
        Self {
            id: BookingId::new(),
            user_id,
            session_id,
            status: BookingStatus::Confirmed,
            points_spent,
            audit_info: AuditInfo::new(Some(user_id)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    fn transition_to(&mut self, next: BookingStatus, by: Option<UserId>) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::invalid_state(format!(
                "Booking {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.touch(by);
        Ok(())
    }

    /// 取消预约
    pub fn cancel(&mut self, by: Option<UserId>) -> AppResult<()> {
        self.transition_to(BookingStatus::Cancelled, by)
    }

    /// 标记为已完成
    pub fn complete(&mut self, by: Option<UserId>) -> AppResult<()> {
        self.transition_to(BookingStatus::Completed, by)
    }
}

impl Entity for Booking {
    type Id = BookingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Booking {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmed_booking() {
        let user = UserId::new();
        let booking = Booking::confirmed(user, SessionId::new(), 50);
        assert!(booking.is_active());
        assert!(booking.is_owned_by(&user));
        assert!(!booking.is_owned_by(&UserId::new()));
        assert_eq!(booking.points_spent, 50);
        assert_eq!(booking.audit_info.created_by, Some(user));
    }

    #[test]
    fn test_cancel_only_from_confirmed() {
        let user = UserId::new();
        let mut booking = Booking::confirmed(user, SessionId::new(), 0);

        booking.cancel(Some(user)).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert!(!booking.is_active());

        let err = booking.cancel(Some(user)).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert!(booking.complete(None).is_err());
    }

    #[test]
    fn test_complete() {
        let mut booking = Booking::confirmed(UserId::new(), SessionId::new(), 0);
        booking.complete(None).unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert!(booking.status.is_terminal());
        assert!(booking.cancel(None).is_err());
    }

    #[test]
    fn test_status_parse() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("PENDING".parse::<BookingStatus>().is_err());
    }
}

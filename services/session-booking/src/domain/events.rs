//! 预约领域事件
//!
//! 事件与业务数据在同一事务中写入 outbox，由外部投递。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking::Booking;
use super::session::Session;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    BookingCreated {
        booking_id: Uuid,
        user_id: Uuid,
        session_id: Uuid,
        points_spent: u32,
        at: DateTime<Utc>,
    },
    BookingCancelled {
        booking_id: Uuid,
        user_id: Uuid,
        session_id: Uuid,
        points_refunded: u32,
        at: DateTime<Utc>,
    },
    RecurringSeriesCreated {
        root_session_id: Uuid,
        occurrences: u32,
        created_by: Option<Uuid>,
        at: DateTime<Utc>,
    },
}

impl BookingEvent {
    pub fn booking_created(booking: &Booking) -> Self {
        BookingEvent::BookingCreated {
            booking_id: booking.id.0,
            user_id: booking.user_id.0,
            session_id: booking.session_id.0,
            points_spent: booking.points_spent,
            at: booking.audit_info.created_at,
        }
    }

    pub fn booking_cancelled(booking: &Booking, points_refunded: u32) -> Self {
        BookingEvent::BookingCancelled {
            booking_id: booking.id.0,
            user_id: booking.user_id.0,
            session_id: booking.session_id.0,
            points_refunded,
            at: booking.audit_info.updated_at,
        }
    }

    pub fn series_created(root: &Session, occurrences: u32) -> Self {
        BookingEvent::RecurringSeriesCreated {
            root_session_id: root.id.0,
            occurrences,
            created_by: root.audit_info.created_by.map(|u| u.0),
            at: root.audit_info.created_at,
        }
    }

    /// 聚合类型
    pub fn aggregate_type(&self) -> &'static str {
        match self {
            BookingEvent::BookingCreated { .. } | BookingEvent::BookingCancelled { .. } => "Booking",
            BookingEvent::RecurringSeriesCreated { .. } => "Session",
        }
    }

    /// 聚合 ID
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            BookingEvent::BookingCreated { booking_id, .. }
            | BookingEvent::BookingCancelled { booking_id, .. } => *booking_id,
            BookingEvent::RecurringSeriesCreated {
                root_session_id, ..
            } => *root_session_id,
        }
    }

    /// 事件类型
    pub fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::BookingCreated { .. } => "booking.created",
            BookingEvent::BookingCancelled { .. } => "booking.cancelled",
            BookingEvent::RecurringSeriesCreated { .. } => "session.series_created",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SessionId;
    use learnhub_common::UserId;

    #[test]
    fn test_event_metadata() {
        let booking = Booking::confirmed(UserId::new(), SessionId::new(), 30);
        let event = BookingEvent::booking_created(&booking);

        assert_eq!(event.aggregate_type(), "Booking");
        assert_eq!(event.aggregate_id(), booking.id.0);
        assert_eq!(event.event_type(), "booking.created");
    }

    #[test]
    fn test_event_payload_is_tagged() {
        let booking = Booking::confirmed(UserId::new(), SessionId::new(), 30);
        let json = serde_json::to_value(BookingEvent::booking_cancelled(&booking, 30)).unwrap();

        assert_eq!(json["type"], "booking_cancelled");
        assert_eq!(json["points_refunded"], 30);
    }
}

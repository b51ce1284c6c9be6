//! 集成测试公共夹具

#![allow(dead_code)]

use chrono::{Duration, Utc};
use learnhub_common::UserId;
use learnhub_errors::AppResult;
use session_booking::application::{CancelBookingCommand, CreateBookingCommand};
use session_booking::domain::booking::{Booking, BookingId};
use session_booking::domain::session::{Session, SessionDraft, SessionId, SessionType};
use session_booking::BookingModule;

pub fn draft(max_participants: u32, points_required: u32) -> SessionDraft {
    SessionDraft {
        title: "Conversation club".to_string(),
        description: Some("Practice speaking in small groups".to_string()),
        session_type: SessionType::Speaking,
        host_name: Some("Nora".to_string()),
        meeting_url: Some("https://meet.example.com/club".to_string()),
        duration_minutes: 60,
        max_participants,
        points_required,
        is_active: true,
    }
}

/// 明天开始的单次场次
pub fn upcoming_session(max_participants: u32, points_required: u32) -> Session {
    Session::single(
        &draft(max_participants, points_required),
        Utc::now() + Duration::days(1),
        None,
    )
}

pub async fn book(module: &BookingModule, user_id: UserId, session_id: SessionId) -> AppResult<Booking> {
    module
        .coordinator
        .create_booking(CreateBookingCommand {
            user_id,
            session_id,
        })
        .await
}

pub async fn cancel(module: &BookingModule, user_id: UserId, booking_id: BookingId) -> AppResult<()> {
    module
        .coordinator
        .cancel_booking(CancelBookingCommand {
            user_id,
            booking_id,
        })
        .await
}

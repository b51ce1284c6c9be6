//! 预约命令定义

use learnhub_common::UserId;

use crate::domain::booking::BookingId;
use crate::domain::session::SessionId;

/// 预约场次命令
#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub user_id: UserId,
    pub session_id: SessionId,
}

/// 取消预约命令
#[derive(Debug, Clone)]
pub struct CancelBookingCommand {
    pub user_id: UserId,
    pub booking_id: BookingId,
}

//! 预约台账

use learnhub_common::UserId;
use learnhub_errors::{AppError, AppResult};

use crate::domain::booking::{Booking, BookingId, BookingRepository, BookingStatus};
use crate::domain::session::SessionId;

pub struct BookingLedger<'a> {
    bookings: &'a dyn BookingRepository,
}

impl<'a> BookingLedger<'a> {
    pub fn new(bookings: &'a dyn BookingRepository) -> Self {
        Self { bookings }
    }

    /// 串行化同一用户的并发预约
    pub async fn lock_user(&self, user_id: &UserId) -> AppResult<()> {
        self.bookings.lock_user(user_id).await
    }

    /// 用户在该场次上是否已有 CONFIRMED 预约
    pub async fn has_active_booking(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> AppResult<bool> {
        let active = self.bookings.find_active_by_user(user_id).await?;
        Ok(active.iter().any(|b| &b.session_id == session_id))
    }

    /// 用户的 CONFIRMED 预约数
    pub async fn count_active(&self, user_id: &UserId) -> AppResult<usize> {
        Ok(self.bookings.find_active_by_user(user_id).await?.len())
    }

    /// 记录一条已确认的预约
    pub async fn create(
        &self,
        user_id: UserId,
        session_id: SessionId,
        points_spent: u32,
    ) -> AppResult<Booking> {
        let booking = Booking::confirmed(user_id, session_id, points_spent);
        self.bookings.create(&booking).await?;
        Ok(booking)
    }

    /// 加载属于该用户的预约
    pub async fn find_owned(&self, booking_id: &BookingId, user_id: &UserId) -> AppResult<Booking> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking {} not found", booking_id)))?;

        if !booking.is_owned_by(user_id) {
            return Err(AppError::unauthorized(format!(
                "Booking {} does not belong to user {}",
                booking_id, user_id
            )));
        }
        Ok(booking)
    }

    /// 将 CONFIRMED 预约改为 CANCELLED
    ///
    /// 并发取消中只有一方能命中条件更新，另一方得到 `InvalidState`。
    pub async fn cancel(&self, mut booking: Booking, by: Option<UserId>) -> AppResult<Booking> {
        booking.cancel(by)?;

        if !self
            .bookings
            .update_status(&booking, BookingStatus::Confirmed)
            .await?
        {
            return Err(AppError::invalid_state(format!(
                "Booking {} is no longer confirmed",
                booking.id
            )));
        }
        Ok(booking)
    }
}

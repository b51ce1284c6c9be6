//! 预约协调器
//!
//! 预约与取消的完整流程，每次调用在一个 Unit of Work 内完成。
//!
//! 预约步骤:
//! 1. 加载场次并确认可预约
//! 2. 锁定用户，串行化同一用户的并发预约
//! 3. 收费场次检查积分余额
//! 4. 检查有效预约上限与重复预约
//! 5. 条件占用名额，失败即放弃
//! 6. 写入预约并扣除积分

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use learnhub_errors::{AppError, AppResult};
use metrics::{counter, histogram};
use tracing::{info, instrument};

use super::commands::{CancelBookingCommand, CreateBookingCommand};
use crate::application::catalog::SessionCatalog;
use crate::application::ledger::BookingLedger;
use crate::application::wallet::PointsWallet;
use crate::domain::booking::{Booking, MAX_ACTIVE_BOOKINGS_PER_USER};
use crate::domain::events::BookingEvent;
use crate::domain::unit_of_work::{finish, UnitOfWork, UnitOfWorkFactory};

fn outcome_label<T>(result: &AppResult<T>, success: &'static str) -> &'static str {
    match result {
        Ok(_) => success,
        Err(e) => e.kind(),
    }
}

/// 预约协调器
pub struct BookingCoordinator {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl BookingCoordinator {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// 预约场次
    #[instrument(skip(self), fields(user_id = %cmd.user_id, session_id = %cmd.session_id))]
    pub async fn create_booking(&self, cmd: CreateBookingCommand) -> AppResult<Booking> {
        let start = Instant::now();

        let uow = self.uow_factory.begin().await?;
        let result = Self::reserve(uow.as_ref(), &cmd, Utc::now()).await;
        let result = finish(uow, result).await;

        counter!("booking_attempts_total", "outcome" => outcome_label(&result, "confirmed"))
            .increment(1);
        histogram!("booking_duration_ms", "operation" => "create")
            .record(start.elapsed().as_millis() as f64);

        match &result {
            Ok(booking) => info!(
                booking_id = %booking.id,
                points_spent = booking.points_spent,
                "Booking confirmed"
            ),
            Err(e) => info!(reason = e.kind(), error = %e, "Booking rejected"),
        }
        result
    }

    /// 取消预约
    #[instrument(skip(self), fields(user_id = %cmd.user_id, booking_id = %cmd.booking_id))]
    pub async fn cancel_booking(&self, cmd: CancelBookingCommand) -> AppResult<()> {
        let start = Instant::now();

        let uow = self.uow_factory.begin().await?;
        let result = Self::release(uow.as_ref(), &cmd).await;
        let result = finish(uow, result).await;

        counter!("booking_cancellations_total", "outcome" => outcome_label(&result, "cancelled"))
            .increment(1);
        histogram!("booking_duration_ms", "operation" => "cancel")
            .record(start.elapsed().as_millis() as f64);

        match &result {
            Ok(refunded) => info!(points_refunded = *refunded, "Booking cancelled"),
            Err(e) => info!(reason = e.kind(), error = %e, "Cancellation rejected"),
        }
        result.map(|_| ())
    }

    async fn reserve(
        uow: &dyn UnitOfWork,
        cmd: &CreateBookingCommand,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let catalog = SessionCatalog::new(uow.sessions());
        let ledger = BookingLedger::new(uow.bookings());
        let wallet = PointsWallet::new(uow.points());

        let session = catalog.find_bookable(&cmd.session_id, now).await?;

        // 之后的上限与重复检查都基于锁内的读取
        ledger.lock_user(&cmd.user_id).await?;

        let price = session.points_required;
        if session.requires_points() {
            let balance = wallet.balance(&cmd.user_id).await?;
            if balance < i64::from(price) {
                return Err(AppError::insufficient_balance(format!(
                    "Session requires {} points, balance is {}",
                    price, balance
                )));
            }
        }

        let active = ledger.count_active(&cmd.user_id).await?;
        if active >= MAX_ACTIVE_BOOKINGS_PER_USER {
            return Err(AppError::limit_exceeded(format!(
                "User already holds {} active bookings (max {})",
                active, MAX_ACTIVE_BOOKINGS_PER_USER
            )));
        }

        if ledger
            .has_active_booking(&cmd.user_id, &cmd.session_id)
            .await?
        {
            return Err(AppError::invalid_state(format!(
                "Session {} is already booked by this user",
                cmd.session_id
            )));
        }

        if !catalog.try_reserve_slot(&session.id).await? {
            return Err(AppError::resource_exhausted(format!(
                "No slots left for session {}",
                session.id
            )));
        }

        let booking = ledger.create(cmd.user_id, session.id, price).await?;

        if price > 0 {
            wallet.debit(&cmd.user_id, price).await?;
        }

        uow.save_event(&BookingEvent::booking_created(&booking)).await?;
        Ok(booking)
    }

    /// 返回退还的积分
    async fn release(uow: &dyn UnitOfWork, cmd: &CancelBookingCommand) -> AppResult<u32> {
        let catalog = SessionCatalog::new(uow.sessions());
        let ledger = BookingLedger::new(uow.bookings());
        let wallet = PointsWallet::new(uow.points());

        let booking = ledger.find_owned(&cmd.booking_id, &cmd.user_id).await?;
        if !booking.is_active() {
            return Err(AppError::invalid_state(format!(
                "Booking {} is {}, only CONFIRMED bookings can be cancelled",
                booking.id, booking.status
            )));
        }

        let cancelled = ledger.cancel(booking, Some(cmd.user_id)).await?;
        catalog.release_slot(&cancelled.session_id).await?;

        let refund = cancelled.points_spent;
        if refund > 0 {
            wallet.credit(&cmd.user_id, refund).await?;
        }

        uow.save_event(&BookingEvent::booking_cancelled(&cancelled, refund))
            .await?;
        Ok(refund)
    }
}

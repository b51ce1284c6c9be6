//! 内存 Unit of Work 实现
//!
//! 同一时刻只允许一个打开的 Unit of Work：`begin` 持有已提交状态的锁，在其副本上读写，
//! 提交时写回，回滚或丢弃时副本作废。用于本地运行与测试。

use async_trait::async_trait;
use learnhub_common::UserId;
use learnhub_errors::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingId, BookingRepository, BookingStatus};
use crate::domain::events::BookingEvent;
use crate::domain::session::{Session, SessionId, SessionRepository};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::wallet::{PointsRepository, Profile};

/// 存储内容
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    sessions: HashMap<SessionId, Session>,
    bookings: HashMap<BookingId, Booking>,
    profiles: HashMap<UserId, Profile>,
    outbox: Vec<BookingEvent>,
}

/// 当前 Unit of Work 的工作副本，提交或回滚后为 None
type SharedState = Arc<Mutex<Option<MemoryState>>>;

async fn with_state<R>(
    state: &SharedState,
    f: impl FnOnce(&mut MemoryState) -> AppResult<R>,
) -> AppResult<R> {
    let mut guard = state.lock().await;
    let state = guard
        .as_mut()
        .ok_or_else(|| AppError::internal("Unit of work consumed"))?;
    f(state)
}

/// 内存 Unit of Work 工厂
#[derive(Default)]
pub struct InMemoryUnitOfWorkFactory {
    committed: Arc<Mutex<MemoryState>>,
}

impl InMemoryUnitOfWorkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入场次
    pub async fn seed_session(&self, session: Session) {
        self.committed
            .lock()
            .await
            .sessions
            .insert(session.id, session);
    }

    /// 写入积分档案
    pub async fn seed_profile(&self, user_id: UserId, points: i64) {
        self.committed
            .lock()
            .await
            .profiles
            .insert(user_id, Profile::new(user_id, points));
    }

    pub async fn session(&self, id: &SessionId) -> Option<Session> {
        self.committed.lock().await.sessions.get(id).cloned()
    }

    /// 全部场次，按时间排序
    pub async fn sessions(&self) -> Vec<Session> {
        let mut sessions: Vec<_> = self.committed.lock().await.sessions.values().cloned().collect();
        sessions.sort_by_key(|s| s.scheduled_at);
        sessions
    }

    pub async fn booking(&self, id: &BookingId) -> Option<Booking> {
        self.committed.lock().await.bookings.get(id).cloned()
    }

    /// 用户的全部预约（含已取消），按创建时间排序
    pub async fn bookings_for(&self, user_id: &UserId) -> Vec<Booking> {
        let mut bookings: Vec<_> = self
            .committed
            .lock()
            .await
            .bookings
            .values()
            .filter(|b| &b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.audit_info.created_at);
        bookings
    }

    pub async fn profile(&self, user_id: &UserId) -> Option<Profile> {
        self.committed.lock().await.profiles.get(user_id).cloned()
    }

    /// 已提交的 outbox 事件
    pub async fn events(&self) -> Vec<BookingEvent> {
        self.committed.lock().await.outbox.clone()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let committed = self.committed.clone().lock_owned().await;
        let working = Arc::new(Mutex::new(Some(committed.clone())));
        Ok(Box::new(InMemoryUnitOfWork::new(committed, working)))
    }
}

/// 内存 Unit of Work 实现
pub struct InMemoryUnitOfWork {
    committed: OwnedMutexGuard<MemoryState>,
    working: SharedState,
    session_repo: MemorySessionRepository,
    booking_repo: MemoryBookingRepository,
    points_repo: MemoryPointsRepository,
}

impl InMemoryUnitOfWork {
    fn new(committed: OwnedMutexGuard<MemoryState>, working: SharedState) -> Self {
        Self {
            committed,
            session_repo: MemorySessionRepository {
                state: working.clone(),
            },
            booking_repo: MemoryBookingRepository {
                state: working.clone(),
            },
            points_repo: MemoryPointsRepository {
                state: working.clone(),
            },
            working,
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn sessions(&self) -> &dyn SessionRepository {
        &self.session_repo
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.booking_repo
    }

    fn points(&self) -> &dyn PointsRepository {
        &self.points_repo
    }

    async fn save_event(&self, event: &BookingEvent) -> AppResult<Uuid> {
        with_state(&self.working, |state| {
            state.outbox.push(event.clone());
            Ok(Uuid::now_v7())
        })
        .await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let InMemoryUnitOfWork {
            mut committed,
            working,
            ..
        } = *self;

        let state = working
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Unit of work already consumed"))?;
        *committed = state;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.working.lock().await.take();
        Ok(())
    }
}

pub struct MemorySessionRepository {
    state: SharedState,
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn find_by_id(&self, id: &SessionId) -> AppResult<Option<Session>> {
        with_state(&self.state, |state| Ok(state.sessions.get(id).cloned())).await
    }

    async fn increment_participants_if_available(&self, id: &SessionId) -> AppResult<bool> {
        with_state(&self.state, |state| {
            Ok(state
                .sessions
                .get_mut(id)
                .is_some_and(|session| session.reserve_slot()))
        })
        .await
    }

    async fn decrement_participants(&self, id: &SessionId) -> AppResult<()> {
        with_state(&self.state, |state| {
            let session = state
                .sessions
                .get_mut(id)
                .ok_or_else(|| AppError::not_found(format!("Session {} not found", id)))?;
            session.release_slot();
            Ok(())
        })
        .await
    }

    async fn create_many(&self, sessions: &[Session]) -> AppResult<()> {
        with_state(&self.state, |state| {
            for session in sessions {
                if state.sessions.contains_key(&session.id) {
                    return Err(AppError::conflict(format!(
                        "Session {} already exists",
                        session.id
                    )));
                }
                state.sessions.insert(session.id, session.clone());
            }
            Ok(())
        })
        .await
    }
}

pub struct MemoryBookingRepository {
    state: SharedState,
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    // 单写者，无需额外加锁
    async fn lock_user(&self, _user_id: &UserId) -> AppResult<()> {
        Ok(())
    }

    async fn create(&self, booking: &Booking) -> AppResult<()> {
        with_state(&self.state, |state| {
            let duplicate = booking.is_active()
                && state.bookings.values().any(|b| {
                    b.is_active()
                        && b.user_id == booking.user_id
                        && b.session_id == booking.session_id
                });
            if duplicate {
                return Err(AppError::invalid_state(
                    "Session is already booked by this user",
                ));
            }
            state.bookings.insert(booking.id, booking.clone());
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &BookingId) -> AppResult<Option<Booking>> {
        with_state(&self.state, |state| Ok(state.bookings.get(id).cloned())).await
    }

    async fn find_active_by_user(&self, user_id: &UserId) -> AppResult<Vec<Booking>> {
        with_state(&self.state, |state| {
            let mut active: Vec<_> = state
                .bookings
                .values()
                .filter(|b| &b.user_id == user_id && b.is_active())
                .cloned()
                .collect();
            active.sort_by_key(|b| b.audit_info.created_at);
            Ok(active)
        })
        .await
    }

    async fn update_status(&self, booking: &Booking, expected: BookingStatus) -> AppResult<bool> {
        with_state(&self.state, |state| match state.bookings.get_mut(&booking.id) {
            Some(stored) if stored.status == expected => {
                stored.status = booking.status;
                stored.audit_info = booking.audit_info.clone();
                Ok(true)
            }
            _ => Ok(false),
        })
        .await
    }
}

pub struct MemoryPointsRepository {
    state: SharedState,
}

#[async_trait]
impl PointsRepository for MemoryPointsRepository {
    async fn get_balance(&self, user_id: &UserId) -> AppResult<Option<i64>> {
        with_state(&self.state, |state| {
            Ok(state.profiles.get(user_id).map(|p| p.points))
        })
        .await
    }

    async fn apply_delta(&self, user_id: &UserId, delta: i64) -> AppResult<Option<Profile>> {
        with_state(&self.state, |state| {
            let profile = state.profiles.get_mut(user_id).ok_or_else(|| {
                AppError::not_found(format!("Profile for user {} not found", user_id))
            })?;

            if profile.points + delta < 0 {
                return Ok(None);
            }
            *profile = Profile::new(*user_id, profile.points + delta);
            Ok(Some(profile.clone()))
        })
        .await
    }
}

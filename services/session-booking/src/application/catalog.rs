//! 场次目录
//!
//! 负责场次的可预约性判断与名额增减。

use chrono::{DateTime, Utc};
use learnhub_errors::{AppError, AppResult};
use tracing::debug;

use crate::domain::session::{Session, SessionId, SessionRepository};

pub struct SessionCatalog<'a> {
    sessions: &'a dyn SessionRepository,
}

impl<'a> SessionCatalog<'a> {
    pub fn new(sessions: &'a dyn SessionRepository) -> Self {
        Self { sessions }
    }

    /// 加载场次并确认当前可预约
    pub async fn find_bookable(&self, id: &SessionId, now: DateTime<Utc>) -> AppResult<Session> {
        let session = self
            .sessions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {} not found", id)))?;

        session.ensure_bookable(now)?;
        Ok(session)
    }

    /// 尝试占用一个名额
    pub async fn try_reserve_slot(&self, id: &SessionId) -> AppResult<bool> {
        let reserved = self.sessions.increment_participants_if_available(id).await?;
        debug!(session_id = %id, reserved, "Slot reservation attempted");
        Ok(reserved)
    }

    /// 释放一个名额
    pub async fn release_slot(&self, id: &SessionId) -> AppResult<()> {
        self.sessions.decrement_participants(id).await
    }

    /// 发布一组场次
    pub async fn publish(&self, sessions: &[Session]) -> AppResult<()> {
        self.sessions.create_many(sessions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{SessionDraft, SessionType};
    use crate::domain::unit_of_work::UnitOfWorkFactory;
    use crate::infrastructure::persistence::memory::InMemoryUnitOfWorkFactory;
    use chrono::Duration;

    fn session(max: u32) -> Session {
        let draft = SessionDraft {
            title: "Evening event".to_string(),
            description: None,
            session_type: SessionType::Event,
            host_name: None,
            meeting_url: None,
            duration_minutes: 90,
            max_participants: max,
            points_required: 0,
            is_active: true,
        };
        Session::single(&draft, Utc::now() + Duration::days(2), None)
    }

    #[tokio::test]
    async fn test_find_bookable_missing_session() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let uow = factory.begin().await.unwrap();
        let catalog = SessionCatalog::new(uow.sessions());

        let err = catalog
            .find_bookable(&SessionId::new(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reserve_until_full_then_release() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let s = session(2);
        factory.seed_session(s.clone()).await;

        let uow = factory.begin().await.unwrap();
        let catalog = SessionCatalog::new(uow.sessions());

        assert!(catalog.try_reserve_slot(&s.id).await.unwrap());
        assert!(catalog.try_reserve_slot(&s.id).await.unwrap());
        assert!(!catalog.try_reserve_slot(&s.id).await.unwrap());

        let err = catalog.find_bookable(&s.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::ResourceExhausted(_)));

        catalog.release_slot(&s.id).await.unwrap();
        let reloaded = catalog.find_bookable(&s.id, Utc::now()).await.unwrap();
        assert_eq!(reloaded.current_participants, 1);
        uow.commit().await.unwrap();

        assert_eq!(factory.session(&s.id).await.unwrap().current_participants, 1);
    }

    #[tokio::test]
    async fn test_reserve_unknown_session_is_not_reserved() {
        let factory = InMemoryUnitOfWorkFactory::new();
        let uow = factory.begin().await.unwrap();
        let catalog = SessionCatalog::new(uow.sessions());

        assert!(!catalog.try_reserve_slot(&SessionId::new()).await.unwrap());
        assert!(catalog.release_slot(&SessionId::new()).await.is_err());
    }
}

//! 周期场次生成器
//!
//! 按周展开一个系列：第 0 周为根场次，其余各周为指向根场次的子场次，全部在同一事务中写入。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use learnhub_common::{add_weeks, AuditInfo, UserId};
use learnhub_errors::{AppError, AppResult};
use metrics::counter;
use tracing::{info, instrument};

use super::commands::CreateRecurringSessionsCommand;
use crate::application::catalog::SessionCatalog;
use crate::domain::events::BookingEvent;
use crate::domain::session::{Recurrence, Session, SessionDraft};
use crate::domain::unit_of_work::{finish, UnitOfWork, UnitOfWorkFactory};

/// 展开系列场次
///
/// 第 i 个场次的时间为 `first_at + 7*i 天`，所有场次共享同一创建时间。
pub fn build_series(
    draft: &SessionDraft,
    first_at: DateTime<Utc>,
    weeks: u32,
    created_by: UserId,
) -> Vec<Session> {
    let audit = AuditInfo::at(Utc::now(), Some(created_by));
    let root = Session::schedule(
        draft,
        first_at,
        Recurrence::Root { weeks },
        audit.clone(),
    );
    let parent_id = root.id;

    let mut series = Vec::with_capacity(weeks as usize);
    series.push(root);
    series.extend((1..weeks).map(|week| {
        Session::schedule(
            draft,
            add_weeks(first_at, week),
            Recurrence::Child { parent_id },
            audit.clone(),
        )
    }));
    series
}

/// 周期场次生成器
pub struct RecurringSessionGenerator {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl RecurringSessionGenerator {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// 创建周期场次，返回按时间排序的全部场次（根场次在前）
    #[instrument(
        skip(self, cmd),
        fields(title = %cmd.title, weeks = cmd.recurring_weeks, admin_id = %cmd.performed_by)
    )]
    pub async fn create_recurring_sessions(
        &self,
        cmd: CreateRecurringSessionsCommand,
    ) -> AppResult<Vec<Session>> {
        cmd.validate().map_err(AppError::validation)?;
        let draft = cmd.to_draft().map_err(AppError::validation)?;

        let series = build_series(
            &draft,
            cmd.scheduled_at,
            cmd.recurring_weeks,
            cmd.performed_by,
        );

        let uow = self.uow_factory.begin().await?;
        let result = Self::publish(uow.as_ref(), &series).await;
        finish(uow, result).await?;

        counter!("recurring_sessions_created_total").increment(series.len() as u64);
        info!(
            root_session_id = %series[0].id,
            occurrences = series.len(),
            "Recurring sessions created"
        );
        Ok(series)
    }

    async fn publish(uow: &dyn UnitOfWork, series: &[Session]) -> AppResult<()> {
        let root = series
            .first()
            .ok_or_else(|| AppError::internal("Empty session series"))?;

        SessionCatalog::new(uow.sessions()).publish(series).await?;
        uow.save_event(&BookingEvent::series_created(root, series.len() as u32))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SessionType;
    use chrono::TimeZone;

    fn draft() -> SessionDraft {
        SessionDraft {
            title: "Grammar clinic".to_string(),
            description: None,
            session_type: SessionType::Event,
            host_name: Some("Leo".to_string()),
            meeting_url: None,
            duration_minutes: 30,
            max_participants: 8,
            points_required: 5,
            is_active: true,
        }
    }

    #[test]
    fn test_build_series_dates_and_links() {
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let series = build_series(&draft(), first, 4, UserId::new());

        assert_eq!(series.len(), 4);
        assert_eq!(series[0].recurrence, Recurrence::Root { weeks: 4 });
        assert_eq!(series[0].scheduled_at, first);

        let expected = [(2024, 1, 8), (2024, 1, 15), (2024, 1, 22)];
        for (session, (y, m, d)) in series[1..].iter().zip(expected) {
            assert_eq!(
                session.scheduled_at,
                Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
            );
            assert_eq!(
                session.recurrence,
                Recurrence::Child {
                    parent_id: series[0].id
                }
            );
            assert_eq!(session.draft(), series[0].draft());
            assert_eq!(session.current_participants, 0);
        }
    }

    #[test]
    fn test_build_single_week_series() {
        let admin = UserId::new();
        let series = build_series(&draft(), Utc::now(), 1, admin);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].audit_info.created_by, Some(admin));
        assert_eq!(series[0].recurrence, Recurrence::Root { weeks: 1 });
    }
}

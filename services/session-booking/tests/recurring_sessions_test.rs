//! 周期场次测试

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::book;
use learnhub_common::UserId;
use learnhub_errors::AppError;
use session_booking::application::recurring::build_series;
use session_booking::application::{CreateRecurringSessionsCommand, SessionCatalog};
use session_booking::domain::events::BookingEvent;
use session_booking::domain::session::{Recurrence, SessionType};
use session_booking::domain::unit_of_work::{finish, UnitOfWorkFactory};
use session_booking::BookingModule;

fn command(first: chrono::DateTime<Utc>, weeks: u32) -> CreateRecurringSessionsCommand {
    CreateRecurringSessionsCommand {
        title: "Weekly debate".to_string(),
        description: Some("Structured debate practice".to_string()),
        session_type: SessionType::Event,
        host_name: Some("Omar".to_string()),
        meeting_url: None,
        scheduled_at: first,
        duration_minutes: 90,
        max_participants: 12,
        points_required: 15,
        is_active: true,
        recurring_weeks: weeks,
        performed_by: UserId::new(),
    }
}

#[tokio::test]
async fn test_four_week_series() {
    let (module, store) = BookingModule::in_memory();
    let first = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();

    let created = module
        .generator
        .create_recurring_sessions(command(first, 4))
        .await
        .unwrap();

    assert_eq!(created.len(), 4);
    let stored = store.sessions().await;
    assert_eq!(stored.len(), 4);

    let root = &stored[0];
    assert_eq!(root.id, created[0].id);
    assert_eq!(root.scheduled_at, first);
    assert_eq!(root.recurrence, Recurrence::Root { weeks: 4 });

    let expected_days = [8, 15, 22];
    for (child, day) in stored[1..].iter().zip(expected_days) {
        assert_eq!(
            child.scheduled_at,
            Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap()
        );
        assert_eq!(child.recurrence, Recurrence::Child { parent_id: root.id });
        assert_eq!(child.title, root.title);
        assert_eq!(child.points_required, 15);
        assert_eq!(child.max_participants, 12);
        assert_eq!(child.current_participants, 0);
    }
}

#[tokio::test]
async fn test_series_event_is_recorded() {
    let (module, store) = BookingModule::in_memory();
    let created = module
        .generator
        .create_recurring_sessions(command(Utc::now() + Duration::days(1), 3))
        .await
        .unwrap();

    let events = store.events().await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        BookingEvent::RecurringSeriesCreated {
            root_session_id,
            occurrences,
            ..
        } => {
            assert_eq!(*root_session_id, created[0].id.0);
            assert_eq!(*occurrences, 3);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_single_week_series() {
    let (module, store) = BookingModule::in_memory();
    let created = module
        .generator
        .create_recurring_sessions(command(Utc::now() + Duration::days(1), 1))
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(
        store.sessions().await[0].recurrence,
        Recurrence::Root { weeks: 1 }
    );
}

#[tokio::test]
async fn test_invalid_series_creates_nothing() {
    let (module, store) = BookingModule::in_memory();
    let first = Utc::now() + Duration::days(1);

    for cmd in [
        command(first, 0),
        command(first, 53),
        CreateRecurringSessionsCommand {
            title: String::new(),
            ..command(first, 4)
        },
        CreateRecurringSessionsCommand {
            max_participants: 0,
            ..command(first, 4)
        },
        CreateRecurringSessionsCommand {
            points_required: -5,
            ..command(first, 4)
        },
    ] {
        let err = module
            .generator
            .create_recurring_sessions(cmd)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    assert!(store.sessions().await.is_empty());
    assert!(store.events().await.is_empty());
}

#[tokio::test]
async fn test_series_is_written_all_or_nothing() {
    let (_module, store) = BookingModule::in_memory();
    let cmd = command(Utc::now() + Duration::days(1), 4);
    let series = build_series(
        &cmd.to_draft().unwrap(),
        cmd.scheduled_at,
        cmd.recurring_weeks,
        cmd.performed_by,
    );

    // 第三个场次已存在，写入在根场次与第二个场次之后失败
    store.seed_session(series[2].clone()).await;

    let uow = store.begin().await.unwrap();
    let published = SessionCatalog::new(uow.sessions()).publish(&series).await;
    let err = finish(uow, published).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert!(store.session(&series[0].id).await.is_none());
    assert!(store.session(&series[1].id).await.is_none());
    assert!(store.session(&series[3].id).await.is_none());
    assert_eq!(store.sessions().await.len(), 1);
    assert!(store.events().await.is_empty());
}

#[tokio::test]
async fn test_occurrences_are_booked_independently() {
    let (module, store) = BookingModule::in_memory();
    let user = UserId::new();
    store.seed_profile(user, 100).await;

    let created = module
        .generator
        .create_recurring_sessions(command(Utc::now() + Duration::days(1), 2))
        .await
        .unwrap();

    book(&module, user, created[1].id).await.unwrap();

    assert_eq!(store.session(&created[0].id).await.unwrap().current_participants, 0);
    assert_eq!(store.session(&created[1].id).await.unwrap().current_participants, 1);
    assert_eq!(store.profile(&user).await.unwrap().points, 85);
}

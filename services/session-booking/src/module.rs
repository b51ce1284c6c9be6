//! 预约模块装配

use std::sync::Arc;

use sqlx::PgPool;

use crate::application::{BookingCoordinator, RecurringSessionGenerator};
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::infrastructure::persistence::{InMemoryUnitOfWorkFactory, PostgresUnitOfWorkFactory};

/// 预约模块
///
/// 协调器与生成器共享同一个 Unit of Work 工厂。
#[derive(Clone)]
pub struct BookingModule {
    pub coordinator: Arc<BookingCoordinator>,
    pub generator: Arc<RecurringSessionGenerator>,
}

impl BookingModule {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            coordinator: Arc::new(BookingCoordinator::new(uow_factory.clone())),
            generator: Arc::new(RecurringSessionGenerator::new(uow_factory)),
        }
    }

    /// 基于 PostgreSQL 装配
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Arc::new(PostgresUnitOfWorkFactory::new(pool)))
    }

    /// 基于内存存储装配，同时返回存储以便写入种子数据与检查状态
    pub fn in_memory() -> (Self, Arc<InMemoryUnitOfWorkFactory>) {
        let store = Arc::new(InMemoryUnitOfWorkFactory::new());
        (Self::new(store.clone()), store)
    }
}

//! 场次仓储接口

use async_trait::async_trait;
use learnhub_errors::AppResult;

use super::session::{Session, SessionId};

/// 场次仓储接口
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 根据 ID 查找场次
    async fn find_by_id(&self, id: &SessionId) -> AppResult<Option<Session>>;

    /// 条件自增已报名人数
    ///
    /// 仅当 `current_participants < max_participants` 时生效，返回是否成功占用名额。
    /// 场次不存在时同样返回 false。
    async fn increment_participants_if_available(&self, id: &SessionId) -> AppResult<bool>;

    /// 已报名人数减一，不低于 0
    async fn decrement_participants(&self, id: &SessionId) -> AppResult<()>;

    /// 批量创建场次，按给定顺序写入
    async fn create_many(&self, sessions: &[Session]) -> AppResult<()>;
}

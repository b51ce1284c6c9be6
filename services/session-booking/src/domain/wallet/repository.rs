//! 积分仓储接口

use async_trait::async_trait;
use learnhub_common::UserId;
use learnhub_errors::AppResult;

use super::profile::Profile;

/// 积分仓储接口
#[async_trait]
pub trait PointsRepository: Send + Sync {
    /// 读取积分余额，档案不存在时返回 None
    async fn get_balance(&self, user_id: &UserId) -> AppResult<Option<i64>>;

    /// 原子地调整积分并重算等级
    ///
    /// 调整后余额为负时不写入并返回 `Ok(None)`；档案不存在时返回 `NotFound`。
    async fn apply_delta(&self, user_id: &UserId, delta: i64) -> AppResult<Option<Profile>>;
}

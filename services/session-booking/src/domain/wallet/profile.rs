//! 用户积分档案

use learnhub_common::UserId;
use learnhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 每升一级所需积分
pub const POINTS_PER_LEVEL: i64 = 100;

/// 由积分推导等级：`points / 100 + 1`
pub fn level_for(points: i64) -> i32 {
    let level = points.max(0) / POINTS_PER_LEVEL + 1;
    i32::try_from(level).unwrap_or(i32::MAX)
}

/// 积分档案
///
/// 余额永不为负，等级始终由余额推导。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub points: i64,
    pub level: i32,
}

impl Profile {
    pub fn new(user_id: UserId, points: i64) -> Self {
        let points = points.max(0);
        Self {
            user_id,
            points,
            level: level_for(points),
        }
    }

    pub fn can_afford(&self, amount: u32) -> bool {
        self.points >= i64::from(amount)
    }

    /// 扣除积分，余额不足时拒绝
    pub fn debit(&mut self, amount: u32) -> AppResult<()> {
        if !self.can_afford(amount) {
            return Err(AppError::insufficient_balance(format!(
                "Requires {} points, balance is {}",
                amount, self.points
            )));
        }
        self.apply_delta(-i64::from(amount));
        Ok(())
    }

    /// 增加积分
    pub fn credit(&mut self, amount: u32) {
        self.apply_delta(i64::from(amount));
    }

    // 结果在 0 处截断
    fn apply_delta(&mut self, delta: i64) {
        self.points = (self.points + delta).max(0);
        self.level = level_for(self.points);
    }
}

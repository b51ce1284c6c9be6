//! 积分钱包

use learnhub_common::UserId;
use learnhub_errors::{AppError, AppResult};

use crate::domain::wallet::{PointsRepository, Profile};

pub struct PointsWallet<'a> {
    points: &'a dyn PointsRepository,
}

impl<'a> PointsWallet<'a> {
    pub fn new(points: &'a dyn PointsRepository) -> Self {
        Self { points }
    }

    /// 查询积分余额
    pub async fn balance(&self, user_id: &UserId) -> AppResult<i64> {
        self.points
            .get_balance(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile for user {} not found", user_id)))
    }

    /// 扣除积分
    ///
    /// 余额检查与扣减在同一条原子更新中完成，不足时返回 `InsufficientBalance`。
    pub async fn debit(&self, user_id: &UserId, amount: u32) -> AppResult<Profile> {
        if amount == 0 {
            return Ok(Profile::new(*user_id, self.balance(user_id).await?));
        }

        self.points
            .apply_delta(user_id, -i64::from(amount))
            .await?
            .ok_or_else(|| {
                AppError::insufficient_balance(format!(
                    "User {} cannot afford {} points",
                    user_id, amount
                ))
            })
    }

    /// 退还或奖励积分
    pub async fn credit(&self, user_id: &UserId, amount: u32) -> AppResult<Profile> {
        if amount == 0 {
            return Ok(Profile::new(*user_id, self.balance(user_id).await?));
        }

        self.points
            .apply_delta(user_id, i64::from(amount))
            .await?
            .ok_or_else(|| AppError::internal("Credit produced a negative balance"))
    }
}

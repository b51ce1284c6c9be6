//! 周期场次命令定义

use chrono::{DateTime, Utc};
use learnhub_common::UserId;

use crate::domain::session::{SessionDraft, SessionType};

/// 系列最多覆盖的周数
pub const MAX_RECURRING_WEEKS: u32 = 52;

/// 创建周期场次命令
#[derive(Debug, Clone)]
pub struct CreateRecurringSessionsCommand {
    pub title: String,
    pub description: Option<String>,
    pub session_type: SessionType,
    pub host_name: Option<String>,
    pub meeting_url: Option<String>,
    /// 第一次场次的时间
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub max_participants: i32,
    pub points_required: i32,
    pub is_active: bool,
    pub recurring_weeks: u32,
    /// 执行操作的管理员 (用于审计)
    pub performed_by: UserId,
}

impl CreateRecurringSessionsCommand {
    /// 验证命令参数
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Session title cannot be empty".to_string());
        }
        if self.title.trim().chars().count() > 200 {
            return Err("Session title cannot exceed 200 characters".to_string());
        }
        if self.recurring_weeks < 1 || self.recurring_weeks > MAX_RECURRING_WEEKS {
            return Err(format!(
                "Recurring weeks must be between 1 and {}",
                MAX_RECURRING_WEEKS
            ));
        }
        if self.duration_minutes < 1 {
            return Err("Duration must be at least 1 minute".to_string());
        }
        if self.max_participants < 1 {
            return Err("Max participants must be at least 1".to_string());
        }
        if self.points_required < 0 {
            return Err("Points required cannot be negative".to_string());
        }
        Ok(())
    }

    /// 取出系列共享的场次内容，调用前应先通过 `validate`
    pub fn to_draft(&self) -> Result<SessionDraft, String> {
        let non_negative = |value: i32, field: &str| {
            u32::try_from(value).map_err(|_| format!("{} cannot be negative", field))
        };

        Ok(SessionDraft {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            session_type: self.session_type,
            host_name: self.host_name.clone(),
            meeting_url: self.meeting_url.clone(),
            duration_minutes: non_negative(self.duration_minutes, "Duration")?,
            max_participants: non_negative(self.max_participants, "Max participants")?,
            points_required: non_negative(self.points_required, "Points required")?,
            is_active: self.is_active,
        })
    }
}

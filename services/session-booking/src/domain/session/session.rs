//! 课程场次实体

use chrono::{DateTime, Utc};
use learnhub_common::{AuditInfo, UserId};
use learnhub_domain_core::{AggregateRoot, Entity};
use learnhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 场次 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// 场次类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    /// 口语练习
    Speaking,
    /// 活动
    Event,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Speaking => "SPEAKING",
            SessionType::Event => "EVENT",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SPEAKING" => Ok(SessionType::Speaking),
            "EVENT" => Ok(SessionType::Event),
            other => Err(format!("Unknown session type: {}", other)),
        }
    }
}

/// 周期关系
///
/// 系列的根场次记录周数，子场次只指向根场次，二者互斥。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    /// 单次场次
    Single,
    /// 系列根场次
    Root { weeks: u32 },
    /// 系列中的后续场次
    Child { parent_id: SessionId },
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::Single)
    }

    pub fn parent_id(&self) -> Option<SessionId> {
        match self {
            Recurrence::Child { parent_id } => Some(*parent_id),
            _ => None,
        }
    }

    pub fn recurring_weeks(&self) -> Option<u32> {
        match self {
            Recurrence::Root { weeks } => Some(*weeks),
            _ => None,
        }
    }

    /// 由持久化列还原
    pub fn from_columns(
        is_recurring: bool,
        parent_id: Option<Uuid>,
        weeks: Option<u32>,
    ) -> Result<Self, String> {
        match (is_recurring, parent_id, weeks) {
            (false, None, None) => Ok(Recurrence::Single),
            (true, None, Some(weeks)) => Ok(Recurrence::Root { weeks }),
            (true, Some(parent), None) => Ok(Recurrence::Child {
                parent_id: SessionId(parent),
            }),
            _ => Err(format!(
                "Inconsistent recurrence columns: is_recurring={}, parent={:?}, weeks={:?}",
                is_recurring, parent_id, weeks
            )),
        }
    }
}

/// 场次内容
///
/// 同一系列的所有场次共享这些字段，只有时间与周期关系不同。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub title: String,
    pub description: Option<String>,
    pub session_type: SessionType,
    pub host_name: Option<String>,
    pub meeting_url: Option<String>,
    pub duration_minutes: u32,
    pub max_participants: u32,
    pub points_required: u32,
    pub is_active: bool,
}

/// 场次实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub description: Option<String>,
    pub session_type: SessionType,
    pub host_name: Option<String>,
    pub meeting_url: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub max_participants: u32,
    pub current_participants: u32,
    pub points_required: u32,
    pub is_active: bool,
    pub recurrence: Recurrence,
    pub audit_info: AuditInfo,
}

impl Session {
    /// 按内容安排一个新场次，已报名人数从 0 开始
    pub fn schedule(
        draft: &SessionDraft,
        scheduled_at: DateTime<Utc>,
        recurrence: Recurrence,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id: SessionId::new(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            session_type: draft.session_type,
            host_name: draft.host_name.clone(),
            meeting_url: draft.meeting_url.clone(),
            scheduled_at,
            duration_minutes: draft.duration_minutes,
            max_participants: draft.max_participants,
            current_participants: 0,
            points_required: draft.points_required,
            is_active: draft.is_active,
            recurrence,
            audit_info,
        }
    }

    /// 取出共享内容
    pub fn draft(&self) -> SessionDraft {
        SessionDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            session_type: self.session_type,
            host_name: self.host_name.clone(),
            meeting_url: self.meeting_url.clone(),
            duration_minutes: self.duration_minutes,
            max_participants: self.max_participants,
            points_required: self.points_required,
            is_active: self.is_active,
        }
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at <= now
    }

    pub fn available_slots(&self) -> u32 {
        self.max_participants.saturating_sub(self.current_participants)
    }

    pub fn requires_points(&self) -> bool {
        self.points_required > 0
    }

    /// 是否可预约：已启用、未满、尚未开始
    pub fn can_book_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_full() && !self.has_started(now)
    }

    pub fn can_book(&self) -> bool {
        self.can_book_at(Utc::now())
    }

    /// 校验可预约性
    ///
    /// 已满的场次返回 `ResourceExhausted`，与并发抢占失败同类，其余不可预约情形返回 `InvalidState`。
    pub fn ensure_bookable(&self, now: DateTime<Utc>) -> AppResult<()> {
        if !self.is_active {
            return Err(AppError::invalid_state(format!(
                "Session {} is not active",
                self.id
            )));
        }
        if self.has_started(now) {
            return Err(AppError::invalid_state(format!(
                "Session {} has already started",
                self.id
            )));
        }
        if self.is_full() {
            return Err(AppError::resource_exhausted(format!(
                "Session {} is full",
                self.id
            )));
        }
        Ok(())
    }

    /// 占用一个名额，已满时返回 false
    pub fn reserve_slot(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.current_participants += 1;
        true
    }

    /// 释放一个名额，不低于 0
    pub fn release_slot(&mut self) {
        self.current_participants = self.current_participants.saturating_sub(1);
    }
}

impl Entity for Session {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Session {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

/// 供测试与种子数据使用的便捷构造
impl Session {
    pub fn single(draft: &SessionDraft, scheduled_at: DateTime<Utc>, by: Option<UserId>) -> Self {
        Self::schedule(draft, scheduled_at, Recurrence::Single, AuditInfo::new(by))
    }
}

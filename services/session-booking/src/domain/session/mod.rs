//! 场次领域模块

#![allow(clippy::module_inception)]

pub mod repository;
pub mod session;

pub use repository::SessionRepository;
pub use session::{Recurrence, Session, SessionDraft, SessionId, SessionType};

//! 积分领域模块

pub mod profile;
pub mod repository;

pub use profile::{level_for, Profile, POINTS_PER_LEVEL};
pub use repository::PointsRepository;

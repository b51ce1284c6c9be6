//! Session Booking - 场次预约与积分子系统
//!
//! 场次容量、用户预约上限与积分扣退在单个事务中协调完成。

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod module;

pub use module::BookingModule;

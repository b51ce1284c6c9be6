//! 领域层

pub mod booking;
pub mod events;
pub mod session;
pub mod unit_of_work;
pub mod wallet;

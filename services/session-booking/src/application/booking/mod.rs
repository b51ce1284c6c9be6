//! 预约用例

pub mod commands;
pub mod coordinator;

pub use commands::{CancelBookingCommand, CreateBookingCommand};
pub use coordinator::BookingCoordinator;

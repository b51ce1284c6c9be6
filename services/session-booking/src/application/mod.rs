//! 应用层

pub mod booking;
pub mod catalog;
pub mod ledger;
pub mod recurring;
pub mod wallet;

pub use booking::{BookingCoordinator, CancelBookingCommand, CreateBookingCommand};
pub use catalog::SessionCatalog;
pub use ledger::BookingLedger;
pub use recurring::{CreateRecurringSessionsCommand, RecurringSessionGenerator};
pub use wallet::PointsWallet;

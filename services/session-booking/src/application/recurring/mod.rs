//! 周期场次用例

pub mod commands;
pub mod generator;

pub use commands::{CreateRecurringSessionsCommand, MAX_RECURRING_WEEKS};
pub use generator::{build_series, RecurringSessionGenerator};

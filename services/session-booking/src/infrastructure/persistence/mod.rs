//! 持久化层

pub mod booking_unit_of_work;
pub mod error_mapper;
pub mod memory;
pub mod migrations;
mod rows;
pub mod tx_repositories;

pub use booking_unit_of_work::PostgresUnitOfWorkFactory;
pub use memory::InMemoryUnitOfWorkFactory;
pub use migrations::run_migrations;

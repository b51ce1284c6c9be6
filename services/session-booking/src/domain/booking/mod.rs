//! 预约领域模块

#![allow(clippy::module_inception)]

pub mod booking;
pub mod repository;

pub use booking::{Booking, BookingId, BookingStatus, MAX_ACTIVE_BOOKINGS_PER_USER};
pub use repository::BookingRepository;

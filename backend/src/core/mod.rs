//! Core simulation infrastructure

pub mod time;

pub use time::DayClock;

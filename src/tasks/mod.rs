//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is open.
//!
//! # Tasks
//! - Maintenance: removes expired entries and flushes the index at a fixed interval

mod maintenance;

pub use maintenance::spawn_maintenance_task;

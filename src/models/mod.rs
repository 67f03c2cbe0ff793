//! Request and Response models for the cache frame
//!
//! This module defines the documents exchanged between a pipeline stage and
//! [`run_frame`](crate::frame::run_frame).

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{FrameAction, FrameParameters, FrameRequest};
pub use responses::{FrameOutcome, FrameReport};

//! Data models for assistant replies and backend catalog entries

mod payload;
mod service;

pub use payload::*;
pub use service::*;

//! Data models for the resource subsystem

mod resource;
mod storage;

pub use resource::*;
pub use storage::*;

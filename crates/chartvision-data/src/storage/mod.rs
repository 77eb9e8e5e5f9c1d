//! 저장소 구현.

pub mod filesystem;
pub mod memory;
pub mod postgres;
pub mod redis;

// utils/mod.rs

pub mod debug;
pub mod health;
pub mod log;

// server/mod.rs
//! The upload server

pub mod assets;
pub mod core;
pub mod decode;
pub mod endpoints;

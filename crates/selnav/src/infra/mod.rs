//! Infrastructure adapters for config, logging, and the reference host.

pub mod config;
pub mod logging;
pub mod scene;

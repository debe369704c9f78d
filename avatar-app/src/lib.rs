//! Avatar session operator tooling.

pub mod commands;
pub mod config;
pub mod http_engine;
pub mod logging;

//! HTTP and WebSocket front end for Meksikaner game sessions.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

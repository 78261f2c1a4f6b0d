// Public API for integration tests and potential library usage

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod questions;
pub mod state;
pub mod types;
pub mod ws;

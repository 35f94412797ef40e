//! Configuration: server endpoint, display toggles, and paging behavior.

pub mod config;

pub use config::Config;

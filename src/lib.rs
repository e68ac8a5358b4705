//! Concert database export library - shared modules for the exporter binary.

pub mod concerts;
pub mod config;
pub mod details;
pub mod directory;
pub mod export;
pub mod loader;
pub mod models;
pub mod output;
pub mod progress;
pub mod safety;
pub mod songs;
pub mod stats;
pub mod store;

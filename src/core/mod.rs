//! Core module for recording data, playback synchronization and log filtering.

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod loader;
pub mod parser;
pub mod playback;
pub mod recording;
pub mod search;
pub mod sync;
pub mod timeline;

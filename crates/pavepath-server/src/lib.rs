//! Shared library surface for the PavePath server and its tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod state;

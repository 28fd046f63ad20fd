//! marksync — personal bookmark saving with near-real-time sync.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod backend;
pub mod managers;
pub mod services;
pub mod rpc_handler;
pub mod types;

//! n8n node type registry and credentials API - Library
//!
//! Re-exports modules for integration testing and external use.

pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod nodes;

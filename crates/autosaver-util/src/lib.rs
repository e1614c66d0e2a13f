//! Shared utilities for autosaver.
//!
//! This crate provides common utilities used across the autosaver workspace:
//! - Logging setup with tracing
//! - Project path resolution
//! - RAII-based timing for snapshot and prune passes

pub mod log;
pub mod path;
pub mod timing;

pub use timing::TimingGuard;

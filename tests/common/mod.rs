//! Shared test utilities for webapp-bundler
//!
//! This module provides common helpers for integration tests:
//! - Temporary work roots with leftover inspection
//! - Renderers that sabotage the workspace mid-pipeline
//! - Router and archive helpers

pub mod fixtures;

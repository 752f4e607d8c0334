//! HTTP request handlers for the webapp-bundler API.

pub mod generate;
pub mod health;

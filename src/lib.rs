//! Markdown notebook: file-backed documents rendered into an idempotent SQLite store.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

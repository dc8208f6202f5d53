//! Application services layer.

pub mod content;
pub mod error;
pub mod reload;
pub mod render;
pub mod repos;

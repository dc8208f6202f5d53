//! Domain layer types and invariants.

pub mod dates;
pub mod entities;
pub mod slug;

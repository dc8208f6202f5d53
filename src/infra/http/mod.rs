//! HTTP surface: the reload trigger, the style sheet, and a health probe.

mod middleware;
mod public;
mod reload;

pub use public::{HttpState, build_router};
pub use reload::{RELOAD_TOKEN_HEADER, ReloadAuthorizer};

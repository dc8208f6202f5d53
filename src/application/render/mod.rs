//! Rendering pipeline for document bodies.
//!
//! The pipeline is pure: markdown goes in, deterministic markup comes out, and
//! failures surface as [`RenderError`]. Stages run in a fixed order: parse,
//! colorize fenced code, format HTML, harden external links.

mod service;
mod types;

pub use service::{
    ComrakRenderService, DEFAULT_THEME, RenderConfigError, RenderPipelineConfig,
    harden_external_links,
};
pub use types::{RenderError, RenderOutput, RenderRequest, RenderService, SiteOrigin, SiteOriginError};

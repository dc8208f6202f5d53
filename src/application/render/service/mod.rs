mod config;
mod highlight;
mod links;
mod rewrite;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use once_cell::sync::OnceCell;
use syntect::{dumps::from_uncompressed_data, html::ClassStyle, parsing::SyntaxSet};
use thiserror::Error;
use tracing::debug;

use crate::application::render::types::{
    RenderError, RenderOutput, RenderRequest, RenderService,
};

pub use links::harden_external_links;

use config::{build_stylesheet, default_options};
use rewrite::{RewriteOutcome, rewrite_ast};

/// Theme used when no theme is configured.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "syntax-" };

static SYNTAX_SET: OnceCell<SyntaxSet> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPipelineConfig {
    pub theme: String,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            theme: settings.theme.clone(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderConfigError {
    #[error("unknown syntax theme `{name}` (available: {available})")]
    UnknownTheme { name: String, available: String },
    #[error("bundled syntax pack is unreadable: {message}")]
    SyntaxPack { message: String },
    #[error("failed to build theme stylesheet: {message}")]
    Stylesheet { message: String },
}

/// Comrak-based pipeline: parse, colorize fenced code, format, harden links.
pub struct ComrakRenderService {
    options: comrak::Options<'static>,
    syntax_set: &'static SyntaxSet,
    stylesheet: String,
    theme: String,
}

impl ComrakRenderService {
    pub fn new(config: RenderPipelineConfig) -> Result<Self, RenderConfigError> {
        let syntax_set = bundled_syntax_set()?;
        let stylesheet = build_stylesheet(&config.theme, CLASS_STYLE)?;

        Ok(Self {
            options: default_options(),
            syntax_set,
            stylesheet,
            theme: config.theme,
        })
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }
}

/// Syntax definitions generated at build time, decoded once per process.
pub(crate) fn bundled_syntax_set() -> Result<&'static SyntaxSet, RenderConfigError> {
    SYNTAX_SET.get_or_try_init(|| {
        let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
        from_uncompressed_data::<SyntaxSet>(syntax_bytes).map_err(|err| {
            RenderConfigError::SyntaxPack {
                message: err.to_string(),
            }
        })
    })
}

impl RenderService for ComrakRenderService {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, &request.markdown, &self.options);

        let outcome = rewrite_stage(root, self.syntax_set)?;
        let rendered = render_html_stage(root, &self.options)?;
        let html = match &request.site_origin {
            Some(origin) => harden_external_links(&rendered, origin),
            None => rendered,
        };

        if html.trim().is_empty() && !request.markdown.trim().is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        debug!(
            target = "application::render",
            slug = %request.slug,
            highlighted_blocks = outcome.highlighted_blocks,
            "document rendered"
        );

        Ok(RenderOutput {
            html,
            highlighted_blocks: outcome.highlighted_blocks,
        })
    }

    fn stylesheet(&self) -> &str {
        &self.stylesheet
    }
}

fn rewrite_stage<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
) -> Result<RewriteOutcome, RenderError> {
    rewrite_ast(root, syntax_set, &CLASS_STYLE)
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::types::SiteOrigin;

    fn service() -> ComrakRenderService {
        ComrakRenderService::new(RenderPipelineConfig::default()).expect("default theme")
    }

    fn render(markdown: &str) -> RenderOutput {
        service()
            .render(&RenderRequest::new("test", markdown))
            .expect("render")
    }

    #[test]
    fn renders_extended_dialect() {
        let html = render(
            "# Title\n\n*em* ~~gone~~ `code`\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\nnote[^1]\n\n[^1]: footnote\n",
        )
        .html;
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>em</em>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("<code>code</code>"));
        assert!(html.contains("<table>"));
        assert!(html.contains("footnote"));
    }

    #[test]
    fn raw_html_passes_through() {
        let html = render("<div class=\"note\">raw</div>\n").html;
        assert!(html.contains("<div class=\"note\">raw</div>"));
    }

    #[test]
    fn source_line_breaks_are_kept() {
        let html = render("first\nsecond\n").html;
        assert!(html.contains("first<br />"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let body = "## Code\n\n```rust\nfn main() { println!(\"hi\"); }\n```\n";
        let first = render(body);
        let second = render(body);
        assert_eq!(first, second);
        assert_eq!(first.highlighted_blocks, 1);
    }

    #[test]
    fn links_are_hardened_when_origin_is_known() {
        let origin = SiteOrigin::parse("https://example.com").expect("origin");
        let request = RenderRequest::new("links", "[out](https://other.org) [in](/about)\n")
            .with_site_origin(origin);
        let html = service().render(&request).expect("render").html;
        assert!(html.contains(
            r#"<a href="https://other.org" target="_blank" rel="noopener noreferrer">out</a>"#
        ));
        assert!(html.contains(r#"<a href="/about">in</a>"#));
    }

    #[test]
    fn empty_body_renders_to_empty_markup() {
        let output = render("");
        assert!(output.html.is_empty());
    }

    #[test]
    fn stylesheet_is_independent_of_documents() {
        let service = service();
        assert_eq!(service.theme(), DEFAULT_THEME);
        assert!(service.stylesheet().contains(".syntax-gutter"));
    }

    #[test]
    fn unknown_theme_fails_construction() {
        let result = ComrakRenderService::new(RenderPipelineConfig {
            theme: "nope".to_string(),
        });
        assert!(matches!(result, Err(RenderConfigError::UnknownTheme { .. })));
    }
}

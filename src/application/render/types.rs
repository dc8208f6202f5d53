use thiserror::Error;
use url::Url;

/// Scheme and authority of the public site, lower-cased, used to tell
/// same-site links from external ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOrigin {
    prefix: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SiteOriginError {
    #[error("invalid site url `{url}`: {reason}")]
    Invalid { url: String, reason: String },
}

impl SiteOrigin {
    /// Parse a base URL such as `https://example.com/blog/`. Only the scheme
    /// and authority are kept.
    pub fn parse(base_url: &str) -> Result<Self, SiteOriginError> {
        let invalid = |reason: String| SiteOriginError::Invalid {
            url: base_url.to_string(),
            reason,
        };

        let parsed = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", parsed.scheme())));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;

        let mut prefix = format!("{}://{}", parsed.scheme(), host.to_ascii_lowercase());
        if let Some(port) = parsed.port() {
            prefix.push(':');
            prefix.push_str(&port.to_string());
        }

        Ok(Self { prefix })
    }

    /// `scheme://authority` form of the origin.
    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Whether `href` points off-site.
    ///
    /// Anything that is not an absolute `http(s)` URL is treated as internal:
    /// root-relative paths, fragments, protocol-relative URLs, `mailto:`,
    /// `tel:`, script schemes and bare relative paths. Absolute URLs are
    /// internal only when they start with this origin, compared
    /// case-insensitively. Subdomains and a differing scheme are external.
    pub fn is_external(&self, href: &str) -> bool {
        let lower = href.trim().to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return false;
        }
        !lower.starts_with(&self.prefix)
    }
}

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Slug of the document being rendered; used for diagnostics only.
    pub slug: String,
    pub markdown: String,
    /// When present, external links in the output are hardened against it.
    pub site_origin: Option<SiteOrigin>,
}

impl RenderRequest {
    pub fn new(slug: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            markdown: markdown.into(),
            site_origin: None,
        }
    }

    pub fn with_site_origin(mut self, origin: SiteOrigin) -> Self {
        self.site_origin = Some(origin);
        self
    }
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub html: String,
    /// Number of fenced blocks that went through the colorizer.
    pub highlighted_blocks: u32,
}

/// Structured errors surfaced by the rendering pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("rendering produced no markup for a non-empty body")]
    EmptyOutput,
}

/// Implementations must be pure and deterministic: given the same input they
/// return identical outputs or errors.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;

    /// Style sheet for the colorization classes emitted by [`Self::render`].
    fn stylesheet(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> SiteOrigin {
        SiteOrigin::parse("https://example.com").expect("valid origin")
    }

    #[test]
    fn origin_keeps_scheme_and_authority_only() {
        let origin = SiteOrigin::parse("https://Example.com/blog/").unwrap();
        assert_eq!(origin.as_str(), "https://example.com");

        let with_port = SiteOrigin::parse("http://localhost:8080").unwrap();
        assert_eq!(with_port.as_str(), "http://localhost:8080");
    }

    #[test]
    fn origin_rejects_non_http_urls() {
        assert!(SiteOrigin::parse("ftp://example.com").is_err());
        assert!(SiteOrigin::parse("not a url").is_err());
    }

    #[test]
    fn internal_targets() {
        let origin = origin();
        for href in [
            "https://example.com/page",
            "HTTPS://EXAMPLE.COM/Page",
            "https://example.com/path/to/page",
            "/relative/path",
            "#anchor",
            "//cdn.example.com",
            "mailto:test@example.com",
            "tel:+1234567890",
            "javascript:alert('test')",
            "relative-file.html",
            "",
        ] {
            assert!(!origin.is_external(href), "{href} should be internal");
        }
    }

    #[test]
    fn external_targets() {
        let origin = origin();
        for href in [
            "https://external.com",
            "http://external.com",
            "https://subdomain.external.com",
            "https://blog.example.com/post",
            "https://www.example.com/page",
            "http://example.com/page",
            "https://",
        ] {
            assert!(origin.is_external(href), "{href} should be external");
        }
    }
}

use lol_html::{RewriteStrSettings, element, rewrite_str};
use tracing::warn;

use crate::application::render::types::SiteOrigin;

const EXTERNAL_TARGET: &str = "_blank";
const EXTERNAL_REL: &str = "noopener noreferrer";

/// Mark anchors pointing off-site so they open in a new context without an opener.
///
/// Attributes the author already set are kept verbatim. Running the pass twice
/// yields the same markup. If the rewriter rejects the input, it is returned
/// unchanged.
pub fn harden_external_links(html: &str, origin: &SiteOrigin) -> String {
    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("a[href]", |el| {
                let Some(href) = el.get_attribute("href") else {
                    return Ok(());
                };
                if !origin.is_external(&href) {
                    return Ok(());
                }
                if !el.has_attribute("target") {
                    el.set_attribute("target", EXTERNAL_TARGET)?;
                }
                if !el.has_attribute("rel") {
                    el.set_attribute("rel", EXTERNAL_REL)?;
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );

    match result {
        Ok(rewritten) => rewritten,
        Err(err) => {
            warn!(
                target = "application::render::links",
                error = %err,
                "link hardening skipped"
            );
            html.to_string()
        }
    }
}

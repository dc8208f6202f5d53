use comrak::options::Options;
use syntect::{
    highlighting::ThemeSet,
    html::{ClassStyle, css_for_theme_with_class_style},
};

use super::RenderConfigError;

/// Gutter and block layout rules shipped alongside the theme colours.
const LAYOUT_CSS: &str = "\
.syntax-block { display: flex; overflow-x: auto; }
.syntax-block pre { margin: 0; }
.syntax-gutter { user-select: none; text-align: right; padding-right: 0.75em; opacity: 0.6; }
.syntax-ln { display: inline-block; min-width: 2ch; }
.syntax-highlight { flex: 1; }
";

pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options);
    options
}

fn configure_extensions(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = false;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.superscript = true;
    ext.footnotes = true;

    let render = &mut options.render;
    render.hardbreaks = true;
    render.r#unsafe = true;
    render.github_pre_lang = false;
    render.sourcepos = false;
}

pub(crate) fn build_stylesheet(
    theme_name: &str,
    class_style: ClassStyle,
) -> Result<String, RenderConfigError> {
    let theme_set = ThemeSet::load_defaults();
    let theme = theme_set
        .themes
        .get(theme_name)
        .ok_or_else(|| RenderConfigError::UnknownTheme {
            name: theme_name.to_string(),
            available: theme_set.themes.keys().cloned().collect::<Vec<_>>().join(", "),
        })?;

    let theme_css = css_for_theme_with_class_style(theme, class_style).map_err(|err| {
        RenderConfigError::Stylesheet {
            message: err.to_string(),
        }
    })?;

    let mut combined = String::with_capacity(theme_css.len() + LAYOUT_CSS.len() + 64);
    combined.push_str(&format!("/* syntax theme: {theme_name} */\n"));
    combined.push_str(theme_css.trim_end());
    combined.push_str("\n\n");
    combined.push_str(LAYOUT_CSS);
    Ok(combined)
}

use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

/// Colorize `code` and wrap it with a line-number gutter.
pub(crate) fn highlight_code(
    language: &str,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, RenderError> {
    let syntax =
        find_syntax(syntax_set, language).unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, *class_style);

    let mut line_count = 0usize;
    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| RenderError::Highlighting {
                language: language.to_string(),
                message: err.to_string(),
            })?;
        line_count += 1;
    }

    let highlighted = generator.finalize();
    let class_token = class_token(language);
    let lang_attr = ammonia::clean_text(language);

    let mut gutter = String::with_capacity(line_count * 32);
    for number in 1..=line_count {
        gutter.push_str(&format!("<span class=\"syntax-ln\">{number}</span>\n"));
    }

    Ok(format!(
        "<div class=\"syntax-block\" data-language=\"{lang_attr}\">\
<pre class=\"syntax-gutter\" aria-hidden=\"true\">{gutter}</pre>\
<pre class=\"syntax-highlight syntax-lang-{class_token}\">\
<code class=\"language-{class_token} syntax-code\">{highlighted}</code></pre></div>\n"
    ))
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

/// Language tag reduced to characters that are safe inside a class name.
fn class_token(language: &str) -> String {
    language
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

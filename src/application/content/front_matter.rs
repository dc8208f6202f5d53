use crate::domain::entities::FrontMatter;

use super::DocumentError;

const DELIMITER: &str = "---";

/// Split raw document text into decoded metadata and body.
///
/// Text that does not open with a `---` line has default metadata and is all
/// body. An opening delimiter without a closing `---` line is malformed.
pub fn split_front_matter(raw: &str) -> Result<(FrontMatter, &str), DocumentError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some(after_open) = strip_delimiter_line(text) else {
        return Ok((FrontMatter::default(), text));
    };

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == DELIMITER {
            let block = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Ok((decode(block)?, body));
        }
        offset += line.len();
    }

    Err(DocumentError::MalformedMetadata {
        reason: "metadata block is not terminated by a `---` line".to_string(),
    })
}

fn strip_delimiter_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(DELIMITER)?;
    rest.strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))
}

fn decode(block: &str) -> Result<FrontMatter, DocumentError> {
    if block.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(block).map_err(|err| DocumentError::MalformedMetadata {
        reason: err.to_string(),
    })
}

//! Header block detection.
//!
//! The header is the leading run of `Key: value` paragraphs (plus their
//! continuation lines and blank padding). It may also be fenced:
//!
//! ```text
//! ---
//! To: a@example.com
//! Subject: Report
//! ---
//! Body starts here.
//! ```
//!
//! Locating is a pure function over paragraph text; removing the header from
//! the live document is a separate step done once the header has been parsed.

use tracing::debug;

/// Result of splitting a document into header and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    /// Header lines joined with `\n`, without fence or separator lines.
    pub header: String,
    /// Paragraphs after the header region.
    pub body: Vec<String>,
    /// Number of leading paragraphs that make up the header region.
    pub consumed: usize,
}

impl HeaderBlock {
    /// A block with no header: every paragraph is body.
    fn body_only(paragraphs: &[String]) -> Self {
        Self {
            header: String::new(),
            body: paragraphs.to_vec(),
            consumed: 0,
        }
    }
}

/// Split `paragraphs` into the header region and the body.
///
/// Never fails: a document without a recognizable header is all body.
pub fn locate(paragraphs: &[String]) -> HeaderBlock {
    let Some(first) = paragraphs.iter().position(|p| !p.trim().is_empty()) else {
        return HeaderBlock::body_only(paragraphs);
    };

    if paragraphs[first].trim() == "---" {
        if let Some(close) = paragraphs[first + 1..]
            .iter()
            .position(|p| is_separator(p))
            .map(|i| first + 1 + i)
        {
            let fenced = &paragraphs[first + 1..close];
            if !fenced.iter().any(|p| is_key_line(p)) {
                debug!("Fenced block has no key/value lines, treating document as body");
                return HeaderBlock::body_only(paragraphs);
            }
            let header = fenced.join("\n");
            let consumed = skip_blank(paragraphs, close + 1);
            debug!(lines = close - first - 1, "Found fenced header block");
            return HeaderBlock {
                header,
                body: paragraphs[consumed..].to_vec(),
                consumed,
            };
        }
        debug!("Unterminated header fence, scanning key/value lines instead");
        return scan(paragraphs, first + 1);
    }

    scan(paragraphs, first)
}

/// Consume key/value shaped paragraphs starting at `start`.
fn scan(paragraphs: &[String], start: usize) -> HeaderBlock {
    let mut lines: Vec<&str> = Vec::new();
    let mut seen_key = false;
    let mut end = 0;

    for (idx, paragraph) in paragraphs.iter().enumerate().skip(start) {
        if paragraph.trim().is_empty() {
            if seen_key {
                lines.push("");
            }
            continue;
        }
        if seen_key && is_separator(paragraph) {
            end = idx + 1;
            break;
        }
        if is_key_line(paragraph) {
            seen_key = true;
        } else if !(seen_key && is_continuation(paragraph)) {
            break;
        }
        lines.push(paragraph.trim_end());
        end = idx + 1;
    }

    if !seen_key {
        return HeaderBlock::body_only(paragraphs);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let consumed = skip_blank(paragraphs, end);
    debug!(lines = lines.len(), consumed, "Found header block");

    HeaderBlock {
        header: lines.join("\n"),
        body: paragraphs[consumed..].to_vec(),
        consumed,
    }
}

/// Advance `from` past blank paragraphs.
fn skip_blank(paragraphs: &[String], from: usize) -> usize {
    let mut idx = from.min(paragraphs.len());
    while idx < paragraphs.len() && paragraphs[idx].trim().is_empty() {
        idx += 1;
    }
    idx
}

fn is_separator(line: &str) -> bool {
    matches!(line.trim(), "---" | "...")
}

/// `Key: value` or `Key:` where the key is an identifier.
fn is_key_line(line: &str) -> bool {
    let Some(colon) = line.find(':') else {
        return false;
    };
    let key = &line[..colon];
    let rest = &line[colon + 1..];

    let mut chars = key.chars();
    let valid_key = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        }
        _ => false,
    };

    valid_key && (rest.is_empty() || rest.starts_with([' ', '\t']))
}

/// Indented lines, sequence entries and comments following a key line.
fn is_continuation(line: &str) -> bool {
    let trimmed = line.trim_start();
    line.starts_with([' ', '\t'])
        || trimmed == "-"
        || trimmed.starts_with("- ")
        || trimmed.starts_with('#')
}

//! Message body built from the document paragraphs left after the header.

/// Body handed to the mail host.
///
/// Both renderings are produced from the same paragraphs; the host decides
/// which one it stores (a rich-text client takes `html`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MessageBody {
    /// Paragraphs joined with newlines.
    pub text: String,
    /// One `<p>` element per paragraph, blank paragraphs as `<p>&nbsp;</p>`.
    pub html: String,
}

impl MessageBody {
    pub fn from_paragraphs(paragraphs: &[String]) -> Self {
        let text = paragraphs.join("\n");

        let mut html = String::from("<html><body>\n");
        for p in paragraphs {
            if p.trim().is_empty() {
                html.push_str("<p>&nbsp;</p>\n");
            } else {
                html.push_str("<p>");
                html.push_str(&escape_html(p));
                html.push_str("</p>\n");
            }
        }
        html.push_str("</body></html>\n");

        Self { text, html }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Escape the characters that are significant in HTML text content.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

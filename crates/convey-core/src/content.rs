use std::sync::LazyLock;

use regex::Regex;

use convey_types::models::{MediaType, MessageRecord};

use crate::error::{Error, Result};

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(file|ftp|https?)://\S+[/\w]").unwrap());
static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n\r?\n").unwrap());

/// Turns a message body into markup for presentation.
///
/// A formatting failure aborts the whole conversation build.
pub trait ContentFormatter {
    fn format(&self, message: &MessageRecord) -> Result<String>;
}

/// Renders `text/plain` bodies as escaped HTML paragraphs with linked URLs.
/// Every other media type is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormatter;

impl ContentFormatter for PlainTextFormatter {
    fn format(&self, message: &MessageRecord) -> Result<String> {
        match message.media_type {
            MediaType::TextPlain => {
                let text = std::str::from_utf8(&message.content).map_err(|e| {
                    Error::MalformedContent(format!("message {} is not UTF-8: {}", message.hash, e))
                })?;
                Ok(plain_text_to_html(text))
            }
            other => Err(Error::MalformedContent(format!(
                "unrecognized media type: {}",
                other
            ))),
        }
    }
}

fn plain_text_to_html(text: &str) -> String {
    let safe = escape_html(text);
    let safe = ANCHOR_RE.replace_all(&safe, r#"<a href="$0">$0</a>"#);
    let safe = PARAGRAPH_RE.replace_all(&safe, "</p><p>");
    format!("<p>{}</p>", safe)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&#34;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    out
}

//! Rendering contract: turns conversation entries into display blocks.
//!
//! Message text and product prices come from the assistant and may contain HTML.
//! [`MarkupPolicy::Sanitize`] keeps a small set of inline formatting tags as
//! styles and drops everything else, including terminal control characters.
//! [`MarkupPolicy::Trust`] passes server text through untouched and must be an
//! explicit operator choice.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::domain::{ChatMessage, MessageId, Product, Sender};
use tracing::debug;

pub const PRICE_UNAVAILABLE: &str = "Price not available";
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/400x400/374151/F9FAFB?text=No+Image";
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupPolicy {
    #[default]
    Sanitize,
    Trust,
}

impl FromStr for MarkupPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sanitize" => Ok(Self::Sanitize),
            "trust" => Ok(Self::Trust),
            other => Err(format!(
                "unknown markup policy '{other}' (expected 'sanitize' or 'trust')"
            )),
        }
    }
}

impl fmt::Display for MarkupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sanitize => "sanitize",
            Self::Trust => "trust",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub strike: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichText(pub Vec<Span>);

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self(vec![Span {
            text: text.into(),
            ..Span::default()
        }])
    }

    pub fn spans(&self) -> &[Span] {
        &self.0
    }

    /// Text with all styling dropped.
    pub fn to_plain(&self) -> String {
        self.0.iter().map(|span| span.text.as_str()).collect()
    }

    fn push(&mut self, text: &str, bold: bool, strike: bool) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.0.last_mut() {
            if last.bold == bold && last.strike == strike {
                last.text.push_str(text);
                return;
            }
        }
        self.0.push(Span {
            text: text.to_string(),
            bold,
            strike,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub key: Option<String>,
    pub name: String,
    pub price: RichText,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub body: RichText,
    pub products: Vec<ProductCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogView {
    /// Nothing to show yet and nothing pending.
    Welcome,
    Conversation {
        messages: Vec<RenderedMessage>,
        thinking: bool,
    },
}

pub fn render_log(messages: &[ChatMessage], pending: bool, policy: MarkupPolicy) -> LogView {
    if messages.is_empty() && !pending {
        return LogView::Welcome;
    }
    LogView::Conversation {
        messages: messages
            .iter()
            .map(|message| render_message(message, policy))
            .collect(),
        thinking: pending,
    }
}

pub fn render_message(message: &ChatMessage, policy: MarkupPolicy) -> RenderedMessage {
    RenderedMessage {
        id: message.id,
        sender: message.sender,
        body: render_text(&message.text, policy),
        products: product_grid(message)
            .into_iter()
            .map(|product| product_card(&product, policy))
            .collect(),
    }
}

/// Products to show as a grid under `message`, empty unless it is a product search reply.
pub fn product_grid(message: &ChatMessage) -> Vec<Product> {
    if !message.is_product_search() {
        return Vec::new();
    }
    let Some(Value::Array(items)) = message.data.as_ref() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<Product>(item.clone()) {
            Ok(product) => Some(product),
            Err(err) => {
                debug!(error = %err, "skipping malformed product entry");
                None
            }
        })
        .collect()
}

pub fn product_card(product: &Product, policy: MarkupPolicy) -> ProductCard {
    let price = match product.price.as_deref() {
        Some(price) if !price.trim().is_empty() => render_markup(price, false, policy),
        _ => RichText::plain(PRICE_UNAVAILABLE),
    };
    let image_url = match product.image_url.as_deref() {
        Some(url) if !url.trim().is_empty() => strip_control(url),
        _ => PLACEHOLDER_IMAGE_URL.to_string(),
    };
    ProductCard {
        key: product.key().map(str::to_string),
        name: strip_control(product.name.as_deref().unwrap_or_default()),
        price,
        description: preview(&strip_control(
            product.description.as_deref().unwrap_or_default(),
        )),
        image_url,
    }
}

/// Renders `**bold**` spans, then applies `policy` to whatever markup remains.
pub fn render_text(text: &str, policy: MarkupPolicy) -> RichText {
    let mut out = RichText::default();
    for (segment, bold) in split_bold(text) {
        match policy {
            MarkupPolicy::Sanitize => {
                for span in render_markup(segment, bold, policy).0 {
                    out.push(&span.text, span.bold, span.strike);
                }
            }
            MarkupPolicy::Trust => out.push(segment, bold, false),
        }
    }
    out
}

fn preview(description: &str) -> String {
    let mut chars = description.chars();
    let head: String = chars.by_ref().take(DESCRIPTION_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

// Pairs of `**` on one line delimit bold text; an unpaired marker stays literal.
fn split_bold(text: &str) -> Vec<(&str, bool)> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        let inner = &after_open[..close];
        if inner.contains('\n') {
            segments.push((&rest[..open + 2], false));
            rest = after_open;
            continue;
        }
        segments.push((&rest[..open], false));
        segments.push((inner, true));
        rest = &after_open[close + 2..];
    }
    segments.push((rest, false));
    segments.retain(|(segment, _)| !segment.is_empty());
    segments
}

fn render_markup(raw: &str, bold: bool, policy: MarkupPolicy) -> RichText {
    if policy == MarkupPolicy::Trust {
        let mut out = RichText::default();
        out.push(raw, bold, false);
        return out;
    }

    let mut out = RichText::default();
    let mut bold_depth = usize::from(bold);
    let mut strike_depth = 0usize;
    let mut text = String::new();
    let mut rest = raw;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => {
                let Some(end) = tag_end(rest) else {
                    text.push('<');
                    rest = &rest[1..];
                    continue;
                };
                let (name, closing) = tag_name(&rest[1..end]);
                match name.as_str() {
                    "strong" | "b" => {
                        flush(&mut text, &mut out, bold_depth, strike_depth);
                        bold_depth = adjust(bold_depth, closing);
                    }
                    "del" | "s" | "strike" => {
                        flush(&mut text, &mut out, bold_depth, strike_depth);
                        strike_depth = adjust(strike_depth, closing);
                    }
                    "br" => text.push('\n'),
                    _ => {}
                }
                rest = &rest[end + 1..];
            }
            '&' => {
                let (decoded, consumed) = decode_entity(rest);
                text.push_str(&decoded);
                rest = &rest[consumed..];
            }
            _ => {
                text.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out.push(&strip_control(&text), bold_depth > 0, strike_depth > 0);
    out
}

fn flush(text: &mut String, out: &mut RichText, bold_depth: usize, strike_depth: usize) {
    out.push(&strip_control(text), bold_depth > 0, strike_depth > 0);
    text.clear();
}

fn adjust(depth: usize, closing: bool) -> usize {
    if closing {
        depth.saturating_sub(1)
    } else {
        depth + 1
    }
}

// A tag opens with a letter, `/` or `!` and closes at the first `>` with no `<` in between.
// Anything else is a literal `<`.
fn tag_end(rest: &str) -> Option<usize> {
    let opens_tag = rest[1..]
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '/' || ch == '!');
    if !opens_tag {
        return None;
    }
    let end = rest.find('>')?;
    (!rest[1..end].contains('<')).then_some(end)
}

fn tag_name(inner: &str) -> (String, bool) {
    let inner = inner.trim();
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(stripped) => (true, stripped.trim_start()),
        None => (false, inner),
    };
    let name = inner
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    (name, closing)
}

fn decode_entity(rest: &str) -> (String, usize) {
    let Some(end) = rest.find(';').filter(|end| *end <= 10) else {
        return ("&".to_string(), 1);
    };
    let entity = &rest[1..end];
    let decoded = match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        _ => entity
            .strip_prefix("#x")
            .or_else(|| entity.strip_prefix("#X"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    };
    match decoded {
        Some(ch) => (ch.to_string(), end + 1),
        None => ("&".to_string(), 1),
    }
}

// Server text must not be able to drive the terminal.
fn strip_control(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_control() || *ch == '\n' || *ch == '\t')
        .collect()
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;

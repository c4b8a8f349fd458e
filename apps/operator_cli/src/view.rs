//! Terminal rendering of the session. Read-only over the controller's snapshot.

use client_core::{
    render::{LogView, ProductCard, RenderedMessage, RichText},
    SessionSnapshot, StatusKind, StatusMessage,
};
use colored::Colorize;
use shared::domain::{ConnectionState, Sender};

pub const CONNECTED_PLACEHOLDER: &str = "Search for products by keyword, brand, or SKU...";
pub const DISCONNECTED_PLACEHOLDER: &str = "Please connect to a store first.";

pub fn welcome() -> String {
    format!(
        "{}\n{}",
        "Store Operator".bold(),
        "Your intelligent assistant for managing your e-commerce store.".dimmed()
    )
}

pub fn thinking() -> String {
    format!("{} {}", "bot ›".green(), "...".dimmed())
}

pub fn log(view: &LogView) -> String {
    match view {
        LogView::Welcome => welcome(),
        LogView::Conversation { messages, thinking: pending } => {
            let mut blocks: Vec<String> = messages.iter().map(message).collect();
            if *pending {
                blocks.push(thinking());
            }
            blocks.join("\n")
        }
    }
}

pub fn message(message: &RenderedMessage) -> String {
    let label = match message.sender {
        Sender::User => "you ›".cyan(),
        Sender::Bot => "bot ›".green(),
    };
    let body = rich(&message.body).replace('\n', "\n      ");
    let mut out = format!("{label} {body}");
    for card in &message.products {
        out.push('\n');
        out.push_str(&product_card(card));
    }
    out
}

pub fn product_card(card: &ProductCard) -> String {
    let title = match card.key.as_deref() {
        Some(key) => format!("{} {}", card.name.bold(), format!("[{key}]").dimmed()),
        None => card.name.bold().to_string(),
    };
    let mut lines = vec![format!("  ┌ {title}"), format!("  │ {}", rich(&card.price))];
    if !card.description.is_empty() {
        lines.push(format!("  │ {}", card.description.replace('\n', " ")));
    }
    lines.push(format!("  └ {}", card.image_url.dimmed()));
    lines.join("\n")
}

pub fn rich(text: &RichText) -> String {
    text.spans()
        .iter()
        .map(|span| {
            let mut styled = span.text.normal();
            if span.bold {
                styled = styled.bold();
            }
            if span.strike {
                styled = styled.strikethrough();
            }
            styled.to_string()
        })
        .collect()
}

pub fn status(status: &StatusMessage) -> String {
    match status.kind {
        StatusKind::Success => status.text.green().to_string(),
        StatusKind::Error => status.text.red().to_string(),
    }
}

pub fn connection_panel(snapshot: &SessionSnapshot) -> String {
    let mut out = match snapshot.connection {
        ConnectionState::Connected => format!(
            "Status: {}\nStore: {}",
            "Connected".green(),
            snapshot.store_name.bold()
        ),
        ConnectionState::Connecting => format!("Status: {}", "Connecting...".yellow()),
        ConnectionState::Disconnected => format!("Status: {}", "Disconnected".red()),
    };
    if let Some(current) = &snapshot.status {
        out.push('\n');
        out.push_str(&status(current));
    }
    out
}

pub fn input_placeholder(snapshot: &SessionSnapshot) -> &'static str {
    if snapshot.is_connected() {
        CONNECTED_PLACEHOLDER
    } else {
        DISCONNECTED_PLACEHOLDER
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;

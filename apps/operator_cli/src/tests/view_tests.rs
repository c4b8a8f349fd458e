use super::*;
use client_core::render::{render_log, render_message, MarkupPolicy};
use serde_json::json;
use shared::domain::{ChatMessage, PRODUCT_SEARCH_INTENT};

fn plain_output() {
    colored::control::set_override(false);
}

#[test]
fn product_reply_prints_a_card_per_product() {
    plain_output();
    let reply = ChatMessage::bot_reply(
        "Here are the top 1 of 1 results:",
        Some(PRODUCT_SEARCH_INTENT.to_string()),
        Some(json!([{
            "sku": "A1",
            "name": "Red Shoe",
            "price": "<del>$10.00</del> <strong>$8.00</strong>",
            "image_url": "https://acme.example/media/catalog/product/r/s.jpg",
            "description": "Bright red."
        }])),
    );

    let printed = message(&render_message(&reply, MarkupPolicy::Sanitize));

    assert_eq!(
        printed,
        "bot › Here are the top 1 of 1 results:\n\
         \x20 ┌ Red Shoe [A1]\n\
         \x20 │ $10.00 $8.00\n\
         \x20 │ Bright red.\n\
         \x20 └ https://acme.example/media/catalog/product/r/s.jpg"
    );
}

#[test]
fn multi_line_messages_are_indented_under_the_label() {
    plain_output();
    let printed = message(&render_message(
        &ChatMessage::user("line one\nline two"),
        MarkupPolicy::Sanitize,
    ));
    assert_eq!(printed, "you › line one\n      line two");
}

#[test]
fn empty_log_prints_welcome_and_pending_prints_thinking() {
    plain_output();
    assert!(log(&render_log(&[], false, MarkupPolicy::Sanitize)).starts_with("Store Operator"));

    let pending = log(&render_log(
        &[ChatMessage::user("hi")],
        true,
        MarkupPolicy::Sanitize,
    ));
    assert_eq!(pending, "you › hi\nbot › ...");
}

#[test]
fn connection_panel_reflects_snapshot() {
    plain_output();
    let mut snapshot = SessionSnapshot::default();
    snapshot.status = Some(StatusMessage::error("Invalid token"));
    assert_eq!(
        connection_panel(&snapshot),
        "Status: Disconnected\nInvalid token"
    );
    assert_eq!(input_placeholder(&snapshot), DISCONNECTED_PLACEHOLDER);

    snapshot.connection = ConnectionState::Connected;
    snapshot.store_name = "Acme Shop".to_string();
    snapshot.status = None;
    assert_eq!(
        connection_panel(&snapshot),
        "Status: Connected\nStore: Acme Shop"
    );
    assert_eq!(input_placeholder(&snapshot), CONNECTED_PLACEHOLDER);
}

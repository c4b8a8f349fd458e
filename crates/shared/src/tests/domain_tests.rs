use super::*;
use serde_json::json;

#[test]
fn product_accepts_numeric_ids_and_prices() {
    let product: Product = serde_json::from_value(json!({
        "id": 42,
        "sku": "A1",
        "name": "Red Shoe",
        "price": 19.5,
        "image_url": null
    }))
    .expect("product");

    assert_eq!(product.id.as_deref(), Some("42"));
    assert_eq!(product.price.as_deref(), Some("19.5"));
    assert_eq!(product.image_url, None);
    assert_eq!(product.description, None);
    assert_eq!(product.key(), Some("42"));
}

#[test]
fn product_key_falls_back_to_sku() {
    let product: Product =
        serde_json::from_value(json!({ "sku": "A1", "name": "Red Shoe" })).expect("product");
    assert_eq!(product.key(), Some("A1"));
}

#[test]
fn credentials_debug_output_redacts_secrets() {
    let credentials = StoreCredentials {
        store_url: "https://shop.example".to_string(),
        consumer_key: "ck-live".to_string(),
        consumer_secret: "cs-live".to_string(),
        access_token: "at-live".to_string(),
        access_token_secret: "ats-live".to_string(),
    };

    let rendered = format!("{credentials:?}");
    assert!(rendered.contains("https://shop.example"));
    for secret in ["ck-live", "cs-live", "at-live", "ats-live"] {
        assert!(!rendered.contains(secret), "leaked {secret} in {rendered}");
    }
}

#[test]
fn only_bot_messages_carry_the_product_search_marker() {
    let reply = ChatMessage::bot_reply(
        "Here are some options",
        Some(PRODUCT_SEARCH_INTENT.to_string()),
        Some(json!([])),
    );
    assert!(reply.is_product_search());
    assert!(!ChatMessage::user("search_products_result").is_product_search());
    assert!(!ChatMessage::bot("plain").is_product_search());
}

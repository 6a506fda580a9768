//! Checkout over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use noscope_core::Price;
use noscope_integration_tests::TestApp;

fn price(value: &serde_json::Value) -> Price {
    Price::parse(value.as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let app = TestApp::new().await;

    let res = app.post_form("/checkout", "cep=&street=").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(!res.cart_updated());

    let body = res.json();
    assert_eq!(body["kind"], "error");
    assert_eq!(body["message"], "Carrinho vazio.");
}

#[tokio::test]
async fn test_checkout_clears_cart() {
    let app = TestApp::new().await;
    app.post_form("/cart/add", "product_id=p2").await;

    let res = app
        .post_form(
            "/checkout",
            "cep=01310-100&street=Avenida+Paulista&number=1000&neighborhood=Bela+Vista&city=S%C3%A3o+Paulo&uf=SP",
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.cart_updated());

    let body = res.json();
    assert_eq!(body["kind"], "success");
    assert_eq!(body["message"], "Pedido finalizado com sucesso!");
    assert_eq!(price(&body["totals"]["shipping"]), Price::from_cents(2_000));
    assert_eq!(price(&body["totals"]["total"]), Price::from_cents(21_990));

    assert_eq!(app.get("/api/cart").await.json()["count"], 0);

    let again = app.post_form("/checkout", "").await;
    assert_eq!(again.json()["message"], "Carrinho vazio.");
}

#[tokio::test]
async fn test_checkout_above_threshold_ships_free() {
    let app = TestApp::new().await;
    app.post_form("/cart/add", "product_id=p1").await;

    let body = app.post_form("/checkout", "cep=01310100").await.json();
    assert_eq!(price(&body["totals"]["shipping"]), Price::ZERO);
}

#[tokio::test]
async fn test_checkout_uses_configured_shipping() {
    let low_threshold = TestApp::with_vars(&[("NOSCOPE_FREE_SHIPPING_THRESHOLD", "100")]).await;
    low_threshold.post_form("/cart/add", "product_id=p5").await;
    let body = low_threshold.post_form("/checkout", "cep=01310100").await.json();
    assert_eq!(price(&body["totals"]["shipping"]), Price::ZERO);

    let custom_fee = TestApp::with_vars(&[("NOSCOPE_SHIPPING_FEE", "9.90")]).await;
    custom_fee.post_form("/cart/add", "product_id=p2").await;
    let body = custom_fee.post_form("/checkout", "cep=01310100").await.json();
    assert_eq!(price(&body["totals"]["shipping"]), Price::from_cents(990));
}

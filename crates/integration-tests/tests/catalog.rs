//! Catalog page, product fragments and the catalog JSON API.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use noscope_integration_tests::TestApp;

fn ids(json: &serde_json::Value) -> Vec<&str> {
    json.as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_catalog_page_lists_every_product() {
    let app = TestApp::new().await;
    let res = app.get("/").await;

    assert_eq!(res.status, StatusCode::OK);
    let html = res.text();
    for name in ["Combo Gamer", "Smartband 4", "Placa de Video", "Controle PS5", "Cadeira Gamer"] {
        assert!(html.contains(name), "missing {name}");
    }
    assert!(html.contains("R$ 4.000,00"));
    assert!(res.headers.contains_key("x-request-id"));
    assert_eq!(res.headers.get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_catalog_page_filters_by_term() {
    let app = TestApp::new().await;
    let html = app.get("/?q=combo").await.text();

    assert!(html.contains("Combo Gamer"));
    assert!(!html.contains("Smartband 4"));
    assert!(html.contains(r#"value="combo""#));
}

#[tokio::test]
async fn test_catalog_page_empty_state() {
    let app = TestApp::new().await;
    let html = app.get("/?q=geladeira").await.text();
    assert!(html.contains("Nenhum produto encontrado."));
}

#[tokio::test]
async fn test_api_products_filter_and_sort() {
    let app = TestApp::new().await;

    let all = app.get("/api/products").await.json();
    assert_eq!(ids(&all), vec!["p1", "p2", "p3", "p4", "p5"]);

    let asc = app.get("/api/products?sort=price-asc").await.json();
    assert_eq!(ids(&asc), vec!["p2", "p5", "p3", "p4", "p1"]);

    let category = app
        .get("/api/products?category=Perif%C3%A9ricos&sort=name-asc")
        .await
        .json();
    assert_eq!(ids(&category), vec!["p5", "p1", "p3"]);

    let term = app.get("/api/products?q=GAMER&sort=price-desc").await.json();
    assert_eq!(ids(&term), vec!["p1", "p5"]);
}

#[tokio::test]
async fn test_api_categories() {
    let app = TestApp::new().await;
    let json = app.get("/api/categories").await.json();
    assert_eq!(json, serde_json::json!(["Periféricos", "Wearables", "Móveis"]));
}

#[tokio::test]
async fn test_product_detail_fragment() {
    let app = TestApp::new().await;

    let res = app.get("/products/p4").await;
    assert_eq!(res.status, StatusCode::OK);
    let html = res.text();
    assert!(html.contains("Controle PS5"));
    assert!(html.contains("R$ 899,00"));
    assert!(html.contains(r#"name="product_id" value="p4""#));

    assert_eq!(app.get("/products/p99").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_cache_is_seeded_on_startup() {
    let app = TestApp::new().await;

    let raw = std::fs::read_to_string(app.data_dir().join("products.json")).unwrap();
    let cache: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(cache.as_object().unwrap().len(), 5);
    assert_eq!(cache["p1"]["name"], "Combo Gamer");
}

#[tokio::test]
async fn test_cached_catalog_is_served_after_restart() {
    let app = TestApp::new().await;
    let path = app.data_dir().join("products.json");

    let mut cache: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    cache["p1"]["name"] = serde_json::json!("Combo Gamer Pro");
    std::fs::write(&path, cache.to_string()).unwrap();

    let app = app.restart().await;
    let html = app.get("/").await.text();
    assert!(html.contains("Combo Gamer Pro"));
}

#[tokio::test]
async fn test_always_refresh_policy_overwrites_cache() {
    let app = TestApp::with_vars(&[("NOSCOPE_CATALOG_POLICY", "always-refresh")]).await;
    let json = app.get("/api/products").await.json();
    assert_eq!(json[0]["name"], "Combo Gamer");
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new().await;

    let live = app.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.text(), "ok");

    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let app = TestApp::new().await;
    let res = app.get("/static/css/main.css").await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(!res.headers.contains_key("cache-control"));
}

#[tokio::test]
async fn test_page_script_filters_through_product_api() {
    let app = TestApp::new().await;
    let script = app.get("/static/js/app.js").await;
    assert_eq!(script.status, StatusCode::OK);
    assert!(script.text().contains("/api/products?"));

    let res = app.get("/api/products?q=gamer&category=&sort=price-desc").await;
    let names: Vec<String> = res
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(names, vec!["Combo Gamer", "Cadeira Gamer"]);
}

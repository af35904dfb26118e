use std::{collections::HashMap, sync::Arc};

use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    requests: Arc<Mutex<Vec<String>>>,
}

impl ServerState {
    async fn record(&self, entry: String) {
        self.requests.lock().await.push(entry);
    }
}

fn product_json(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "price": 9.5,
        "rating": 4.1,
        "thumbnail": format!("https://cdn.example/{id}/thumbnail.webp"),
        "brand": "Acme"
    })
}

async fn list_products(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let limit: u64 = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(30);
    let skip: u64 = query.get("skip").and_then(|v| v.parse().ok()).unwrap_or(0);
    state.record(format!("list limit={limit} skip={skip}")).await;
    let products: Vec<Value> = (skip + 1..=skip + limit).map(product_json).collect();
    Json(json!({ "products": products, "total": 194, "skip": skip, "limit": limit }))
}

async fn search_products(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let q = query.get("q").cloned().unwrap_or_default();
    state.record(format!("search q={q}")).await;
    Json(json!({ "products": [product_json(1), product_json(2)], "total": 2, "skip": 0, "limit": 2 }))
}

async fn category_products(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> Json<Value> {
    state.record(format!("category {slug}")).await;
    Json(json!({ "products": [product_json(121)], "total": 1, "skip": 0, "limit": 1 }))
}

async fn categories(State(state): State<ServerState>) -> Json<Value> {
    state.record("categories".to_string()).await;
    Json(json!([
        { "slug": "beauty", "name": "Beauty", "url": "https://dummyjson.com/products/category/beauty" },
        { "slug": "smartphones", "name": "Smartphones", "url": "https://dummyjson.com/products/category/smartphones" }
    ]))
}

async fn single_product(Path(id): Path<String>) -> impl IntoResponse {
    match id.parse::<u64>() {
        Ok(id) if id < 200 => Json(product_json(id)).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))).into_response(),
    }
}

async fn spawn_catalog_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let products = Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/categories", get(categories))
        .route("/products/category/:slug", get(category_products))
        .route("/products/:id", get(single_product))
        .with_state(state.clone());
    let app = Router::new()
        .merge(products.clone())
        .nest("/api", products)
        .route(
            "/broken/products",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/garbage/products", get(|| async { "<html>nope</html>" }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn listing_sends_limit_and_skip() {
    let (base_url, state) = spawn_catalog_server().await;
    let client = HttpCatalogClient::new(&base_url).expect("client");

    let page = client.list_products(10, 20).await.expect("listing");

    assert_eq!(page.products.len(), 10);
    assert_eq!(page.products[0].id, ProductId(21));
    assert_eq!(page.skip, 20);
    assert_eq!(page.total, 194);
    assert_eq!(
        page.products[0].extra.get("brand"),
        Some(&json!("Acme"))
    );
    assert_eq!(
        state.requests.lock().await.clone(),
        vec!["list limit=10 skip=20".to_string()]
    );
}

#[tokio::test]
async fn search_sends_query_text_without_pagination() {
    let (base_url, state) = spawn_catalog_server().await;
    let client = HttpCatalogClient::new(&base_url).expect("client");

    let results = client
        .search_products("green & gold")
        .await
        .expect("search");

    assert_eq!(results.products.len(), 2);
    assert_eq!(
        state.requests.lock().await.clone(),
        vec!["search q=green & gold".to_string()]
    );
}

#[tokio::test]
async fn category_slug_is_a_path_segment() {
    let (base_url, state) = spawn_catalog_server().await;
    let client = HttpCatalogClient::new(&base_url).expect("client");
    let slug = CategorySlug::parse("home decoration").expect("slug");

    let results = client.products_by_category(&slug).await.expect("category");

    assert_eq!(results.products[0].id, ProductId(121));
    assert_eq!(
        state.requests.lock().await.clone(),
        vec!["category home decoration".to_string()]
    );
}

#[tokio::test]
async fn categories_decode_plain_array() {
    let (base_url, _state) = spawn_catalog_server().await;
    let client = HttpCatalogClient::new(&base_url).expect("client");

    let categories = client.categories().await.expect("categories");

    let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Beauty", "Smartphones"]);
    assert_eq!(categories[1].slug.as_str(), "smartphones");
}

#[tokio::test]
async fn single_product_and_not_found() {
    let (base_url, _state) = spawn_catalog_server().await;
    let client = HttpCatalogClient::new(&base_url).expect("client");

    let product = client.product(ProductId(5)).await.expect("product");
    assert_eq!(product.title, "Product 5");

    let err = client
        .product(ProductId(999))
        .await
        .expect_err("must be missing");
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn base_url_with_path_prefix_is_kept() {
    let (base_url, state) = spawn_catalog_server().await;
    let client = HttpCatalogClient::new(&format!("{base_url}/api/")).expect("client");

    client.list_products(5, 0).await.expect("listing");

    assert_eq!(
        state.requests.lock().await.clone(),
        vec!["list limit=5 skip=0".to_string()]
    );
}

#[tokio::test]
async fn error_status_is_reported() {
    let (base_url, _state) = spawn_catalog_server().await;
    let client = HttpCatalogClient::new(&format!("{base_url}/broken")).expect("client");

    let err = client.list_products(10, 0).await.expect_err("must fail");
    assert!(matches!(err, CatalogError::Status { status: 500, .. }));
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let (base_url, _state) = spawn_catalog_server().await;
    let client = HttpCatalogClient::new(&format!("{base_url}/garbage")).expect("client");

    let err = client.list_products(10, 0).await.expect_err("must fail");
    assert!(matches!(err, CatalogError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = HttpCatalogClient::with_timeout(&format!("http://{addr}"), Duration::from_secs(2))
        .expect("client");

    let err = client.list_products(10, 0).await.expect_err("must fail");
    assert!(matches!(err, CatalogError::Transport { .. }));
}

#[test]
fn rejects_non_http_base_urls() {
    assert!(matches!(
        HttpCatalogClient::new("not a url"),
        Err(CatalogError::InvalidBaseUrl(_))
    ));
    assert!(matches!(
        HttpCatalogClient::new("mailto:someone@example.com"),
        Err(CatalogError::InvalidBaseUrl(_))
    ));
}

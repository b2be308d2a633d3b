//! `WooCommerceClient` against a local stand-in for the WooCommerce REST API.
//!
//! The fake records each request it receives so tests can assert on the
//! exact path, query, auth header and body that went over the wire.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use woo_bridge_core::{ProductInput, RemoteProductId};
use woo_bridge_server::config::WooCommerceConfig;
use woo_bridge_server::woocommerce::{
    ListParams, ProductGateway, ProductPayload, WooCommerceClient, WooCommerceError,
};

const EXPECTED_AUTH: &str = "Basic Y2tfdGVzdDpjc190ZXN0";

#[derive(Debug, Clone)]
struct Recorded {
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    authorization: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct FakeStore {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeStore {
    fn record(
        &self,
        method: &'static str,
        path: String,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) -> bool {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let authorized = authorization.as_deref() == Some(EXPECTED_AUTH);
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            query,
            authorization,
            body,
        });
        authorized
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn product(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "price": "9.99",
        "regular_price": "9.99",
        "status": "publish",
        "sku": format!("SKU-{id}"),
        "images": [{"id": 7, "src": "https://cdn.example.com/p.jpg", "alt": ""}]
    })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "code": "woocommerce_rest_cannot_view",
            "message": "Sorry, you cannot list resources.",
            "data": {"status": 401}
        })),
    )
        .into_response()
}

async fn list_products(
    State(store): State<FakeStore>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !store.record("GET", "/products".into(), query, &headers, None) {
        return unauthorized();
    }
    let mut response = Json(json!([product(1, "Mug"), product(2, "Cap")])).into_response();
    response
        .headers_mut()
        .insert("X-WP-Total", HeaderValue::from_static("62"));
    response
        .headers_mut()
        .insert("X-WP-TotalPages", HeaderValue::from_static("2"));
    response
}

async fn create_product(
    State(store): State<FakeStore>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let name = body["name"].as_str().unwrap_or_default().to_owned();
    if !store.record("POST", "/products".into(), HashMap::new(), &headers, Some(body)) {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(product(101, &name))).into_response()
}

async fn show_product(
    State(store): State<FakeStore>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    store.record("GET", format!("/products/{id}"), HashMap::new(), &headers, None);
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "code": "woocommerce_rest_product_invalid_id",
                "message": "Invalid ID.",
                "data": {"status": 404}
            })),
        )
            .into_response();
    }
    if id == 500 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "<html>Fatal error</html>").into_response();
    }
    Json(product(id, "Mug")).into_response()
}

async fn update_product(
    State(store): State<FakeStore>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let name = body["name"].as_str().unwrap_or_default().to_owned();
    store.record(
        "PUT",
        format!("/products/{id}"),
        HashMap::new(),
        &headers,
        Some(body),
    );
    Json(product(id, &name)).into_response()
}

async fn delete_product(
    State(store): State<FakeStore>,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    store.record("DELETE", format!("/products/{id}"), query, &headers, None);
    Json(product(id, "Mug")).into_response()
}

/// Start the fake store and return a client pointed at it.
async fn spawn_store(consumer_key: &str) -> (WooCommerceClient, FakeStore) {
    let store = FakeStore::default();
    let app = Router::new()
        .route(
            "/wp-json/wc/v3/products",
            get(list_products).post(create_product),
        )
        .route(
            "/wp-json/wc/v3/products/{id}",
            get(show_product).put(update_product).delete(delete_product),
        )
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = WooCommerceClient::new(&WooCommerceConfig {
        store_url: Url::parse(&format!("http://{addr}")).unwrap(),
        consumer_key: SecretString::from(consumer_key),
        consumer_secret: SecretString::from("cs_test"),
        api_version: "wc/v3".to_owned(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    (client, store)
}

fn draft(body: Value) -> woo_bridge_core::ProductDraft {
    serde_json::from_value::<ProductInput>(body)
        .unwrap()
        .validate()
        .unwrap()
}

#[tokio::test]
async fn list_applies_defaults_and_reads_pagination_headers() {
    let (client, store) = spawn_store("ck_test").await;

    let page = client.list(&ListParams::default()).await.unwrap();

    assert_eq!(page.products.len(), 2);
    assert_eq!(page.total, Some(62));
    assert_eq!(page.total_pages, Some(2));
    // Fields outside the typed subset survive
    assert_eq!(page.products[0].extra["sku"], "SKU-1");

    let requests = store.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query["per_page"], "50");
    assert_eq!(requests[0].query["status"], "publish");
    assert!(!requests[0].query.contains_key("page"));
    assert_eq!(requests[0].authorization.as_deref(), Some(EXPECTED_AUTH));
}

#[tokio::test]
async fn list_merges_caller_filters() {
    let (client, store) = spawn_store("ck_test").await;

    client
        .list(&ListParams {
            page: Some(2),
            per_page: Some(10),
            search: Some("mug".to_owned()),
        })
        .await
        .unwrap();

    let query = &store.requests()[0].query;
    assert_eq!(query["page"], "2");
    assert_eq!(query["per_page"], "10");
    assert_eq!(query["search"], "mug");
    assert_eq!(query["status"], "publish");
}

#[tokio::test]
async fn create_sends_simple_product_payload() {
    let (client, store) = spawn_store("ck_test").await;
    let draft = draft(json!({"name": "Widget", "price": 9.99, "status": "draft"}));

    let created = client
        .create(&ProductPayload::for_create(&draft))
        .await
        .unwrap();

    assert_eq!(created.id, RemoteProductId::new(101));
    assert_eq!(created.name, "Widget");

    let requests = store.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(
        requests[0].body,
        Some(json!({
            "name": "Widget",
            "regular_price": "9.99",
            "status": "draft",
            "type": "simple"
        }))
    );
}

#[tokio::test]
async fn update_omits_product_type() {
    let (client, store) = spawn_store("ck_test").await;
    let draft = draft(json!({
        "name": "Widget v2",
        "description": "Now blue",
        "price": "12",
        "image_url": "https://cdn.example.com/w.jpg",
        "status": "publish"
    }));

    let updated = client
        .update(RemoteProductId::new(55), &ProductPayload::for_update(&draft))
        .await
        .unwrap();

    assert_eq!(updated.id, RemoteProductId::new(55));
    let requests = store.requests();
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].path, "/products/55");
    assert_eq!(
        requests[0].body,
        Some(json!({
            "name": "Widget v2",
            "description": "Now blue",
            "regular_price": "12",
            "status": "publish",
            "images": [{"src": "https://cdn.example.com/w.jpg"}]
        }))
    );
}

#[tokio::test]
async fn delete_forces_permanent_removal() {
    let (client, store) = spawn_store("ck_test").await;

    let deleted = client.delete(RemoteProductId::new(9)).await.unwrap();

    assert_eq!(deleted.id, RemoteProductId::new(9));
    let requests = store.requests();
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].query["force"], "true");
}

#[tokio::test]
async fn missing_product_maps_to_not_found() {
    let (client, _store) = spawn_store("ck_test").await;

    let err = client.get(RemoteProductId::new(404)).await.unwrap_err();

    assert!(matches!(err, WooCommerceError::NotFound(ref m) if m == "Invalid ID."));
}

#[tokio::test]
async fn non_json_error_body_keeps_status() {
    let (client, _store) = spawn_store("ck_test").await;

    let err = client.get(RemoteProductId::new(500)).await.unwrap_err();

    assert!(matches!(err, WooCommerceError::Api { status: 500, code: None, .. }));
}

#[tokio::test]
async fn wrong_credentials_map_to_unauthorized() {
    let (client, _store) = spawn_store("ck_wrong").await;

    let err = client.list(&ListParams::default()).await.unwrap_err();

    assert!(matches!(err, WooCommerceError::Unauthorized(_)));
    assert!(err.to_string().contains("Sorry, you cannot list resources."));
}

#[tokio::test]
async fn unreachable_store_is_an_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = WooCommerceClient::new(&WooCommerceConfig {
        store_url: Url::parse(&format!("http://{addr}")).unwrap(),
        consumer_key: SecretString::from("ck_test"),
        consumer_secret: SecretString::from("cs_test"),
        api_version: "wc/v3".to_owned(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let err = client.get(RemoteProductId::new(1)).await.unwrap_err();
    assert!(matches!(err, WooCommerceError::Http(_)));
}

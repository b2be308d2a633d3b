//! Integration test harness for woo-bridge.
//!
//! Runs the real router against in-memory stand-ins for its three
//! dependencies, so no WooCommerce store or database is needed:
//!
//! - [`FakeGateway`] - an in-memory WooCommerce that counts calls per
//!   operation, records every payload and can be told to fail
//! - [`MemoryMirror`] - the product mirror table
//! - [`MemoryUsers`] - accounts and access tokens
//!
//! [`TestApp`] wires them into an `AppState` and drives requests through
//! `tower::ServiceExt::oneshot`.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::{Map, Value, json};
use tower::ServiceExt;

use woo_bridge_core::{Email, MirrorId, RemoteProductId, TokenId, UserId};
use woo_bridge_server::db::{MirrorStore, RepositoryError, UserStore};
use woo_bridge_server::models::{MirrorFields, NewMirror, NewUser, ProductMirror, User};
use woo_bridge_server::state::AppState;
use woo_bridge_server::woocommerce::{
    ListParams, ProductGateway, ProductPage, ProductPayload, RemoteImage, RemoteProduct,
    WooCommerceError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("test state lock poisoned")
}

// =============================================================================
// Fake WooCommerce
// =============================================================================

/// Which gateway operation a call or payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GatewayCall {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct FakeStore {
    products: BTreeMap<RemoteProductId, RemoteProduct>,
    next_id: i64,
    calls: BTreeMap<GatewayCall, usize>,
    payloads: Vec<(GatewayCall, ProductPayload)>,
    list_params: Vec<ListParams>,
    failure: Option<String>,
}

/// In-memory WooCommerce product API.
#[derive(Default)]
pub struct FakeGateway {
    store: Mutex<FakeStore>,
}

impl FakeGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with a 500 carrying `message`.
    pub fn fail_with(&self, message: &str) {
        lock(&self.store).failure = Some(message.to_owned());
    }

    /// Number of calls made for `call`, failed ones included.
    #[must_use]
    pub fn calls(&self, call: GatewayCall) -> usize {
        lock(&self.store).calls.get(&call).copied().unwrap_or(0)
    }

    /// Total calls across all operations.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        lock(&self.store).calls.values().sum()
    }

    /// Payloads sent to create and update, in order.
    #[must_use]
    pub fn payloads(&self) -> Vec<(GatewayCall, ProductPayload)> {
        lock(&self.store).payloads.clone()
    }

    /// Filters passed to each list call, in order.
    #[must_use]
    pub fn list_params(&self) -> Vec<ListParams> {
        lock(&self.store).list_params.clone()
    }

    /// Seed a product that exists remotely before the test starts.
    pub fn insert(&self, id: i64, name: &str, status: &str) -> RemoteProduct {
        let product: RemoteProduct = serde_json::from_value(json!({
            "id": id,
            "name": name,
            "description": "",
            "price": "5.00",
            "regular_price": "5.00",
            "status": status,
            "type": "simple",
            "images": []
        }))
        .expect("valid seed product");
        let mut store = lock(&self.store);
        store.next_id = store.next_id.max(id);
        store.products.insert(product.id, product.clone());
        product
    }

    #[must_use]
    pub fn product(&self, id: i64) -> Option<RemoteProduct> {
        lock(&self.store)
            .products
            .get(&RemoteProductId::new(id))
            .cloned()
    }

    /// Count the call and return the configured failure, if any.
    fn enter(&self, call: GatewayCall) -> Result<MutexGuard<'_, FakeStore>, WooCommerceError> {
        let mut store = lock(&self.store);
        *store.calls.entry(call).or_default() += 1;
        if let Some(message) = &store.failure {
            return Err(WooCommerceError::Api {
                status: 500,
                code: Some("internal_server_error".to_owned()),
                message: message.clone(),
            });
        }
        Ok(store)
    }
}

fn not_found() -> WooCommerceError {
    WooCommerceError::NotFound("Invalid ID.".to_owned())
}

fn apply_payload(product: &mut RemoteProduct, payload: &ProductPayload) {
    product.name.clone_from(&payload.name);
    if let Some(description) = &payload.description {
        product.description.clone_from(description);
    }
    product.regular_price.clone_from(&payload.regular_price);
    product.price.clone_from(&payload.regular_price);
    product.status = payload.status.as_str().to_owned();
    if !payload.images.is_empty() {
        product.images = payload
            .images
            .iter()
            .map(|image| RemoteImage {
                id: None,
                src: image.src.clone(),
                extra: Map::new(),
            })
            .collect();
    }
}

#[async_trait]
impl ProductGateway for FakeGateway {
    async fn list(&self, params: &ListParams) -> Result<ProductPage, WooCommerceError> {
        let mut store = self.enter(GatewayCall::List)?;
        store.list_params.push(params.clone());

        let products: Vec<RemoteProduct> = store
            .products
            .values()
            .filter(|p| p.status == "publish")
            .cloned()
            .collect();
        let total = products.len() as u64;

        Ok(ProductPage {
            products,
            total: Some(total),
            total_pages: Some(1),
        })
    }

    async fn get(&self, id: RemoteProductId) -> Result<RemoteProduct, WooCommerceError> {
        let store = self.enter(GatewayCall::Get)?;
        store.products.get(&id).cloned().ok_or_else(not_found)
    }

    async fn create(&self, payload: &ProductPayload) -> Result<RemoteProduct, WooCommerceError> {
        let mut store = self.enter(GatewayCall::Create)?;
        store.payloads.push((GatewayCall::Create, payload.clone()));

        store.next_id += 1;
        let id = RemoteProductId::new(store.next_id);
        let mut product = RemoteProduct {
            id,
            name: String::new(),
            description: String::new(),
            price: String::new(),
            regular_price: String::new(),
            status: String::new(),
            images: Vec::new(),
            extra: Map::new(),
        };
        product.extra.insert("type".to_owned(), json!("simple"));
        apply_payload(&mut product, payload);

        store.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: RemoteProductId,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, WooCommerceError> {
        let mut store = self.enter(GatewayCall::Update)?;
        store.payloads.push((GatewayCall::Update, payload.clone()));

        let product = store.products.get_mut(&id).ok_or_else(not_found)?;
        apply_payload(product, payload);
        Ok(product.clone())
    }

    async fn delete(&self, id: RemoteProductId) -> Result<RemoteProduct, WooCommerceError> {
        let mut store = self.enter(GatewayCall::Delete)?;
        store.products.remove(&id).ok_or_else(not_found)
    }
}

// =============================================================================
// In-memory mirror
// =============================================================================

#[derive(Default)]
struct MirrorRows {
    rows: Vec<ProductMirror>,
    next_id: i64,
    fail_writes: bool,
}

/// In-memory product mirror table.
#[derive(Default)]
pub struct MemoryMirror {
    inner: Mutex<MirrorRows>,
}

impl MemoryMirror {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail, as if the database were down.
    pub fn fail_writes(&self) {
        lock(&self.inner).fail_writes = true;
    }

    #[must_use]
    pub fn rows(&self) -> Vec<ProductMirror> {
        lock(&self.inner).rows.clone()
    }

    /// Rows pointing at `remote_id`.
    #[must_use]
    pub fn rows_for(&self, remote_id: i64) -> Vec<ProductMirror> {
        let remote_id = RemoteProductId::new(remote_id);
        lock(&self.inner)
            .rows
            .iter()
            .filter(|row| row.remote_id == Some(remote_id))
            .cloned()
            .collect()
    }

    /// Insert a row directly, bypassing the remote store.
    pub fn seed(
        &self,
        user_id: UserId,
        fields: MirrorFields,
        remote_id: Option<i64>,
    ) -> ProductMirror {
        let mut inner = lock(&self.inner);
        let row = new_row(&mut inner, user_id, fields, remote_id.map(RemoteProductId::new));
        inner.rows.push(row.clone());
        row
    }
}

fn new_row(
    inner: &mut MirrorRows,
    user_id: UserId,
    fields: MirrorFields,
    remote_id: Option<RemoteProductId>,
) -> ProductMirror {
    inner.next_id += 1;
    let now = Utc::now();
    ProductMirror {
        id: MirrorId::new(inner.next_id),
        user_id,
        name: fields.name,
        description: fields.description,
        price: fields.price,
        image_url: fields.image_url,
        status: fields.status,
        remote_id,
        created_at: now,
        updated_at: now,
    }
}

fn write_failure() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolClosed)
}

#[async_trait]
impl MirrorStore for MemoryMirror {
    async fn insert(&self, mirror: &NewMirror) -> Result<ProductMirror, RepositoryError> {
        let mut inner = lock(&self.inner);
        if inner.fail_writes {
            return Err(write_failure());
        }
        if inner
            .rows
            .iter()
            .any(|row| row.remote_id == Some(mirror.remote_id))
        {
            return Err(RepositoryError::Conflict(
                "remote product already mirrored".to_owned(),
            ));
        }
        let row = new_row(
            &mut inner,
            mirror.user_id,
            mirror.fields.clone(),
            Some(mirror.remote_id),
        );
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn update_by_remote_id(
        &self,
        remote_id: RemoteProductId,
        fields: &MirrorFields,
    ) -> Result<Option<ProductMirror>, RepositoryError> {
        let mut inner = lock(&self.inner);
        if inner.fail_writes {
            return Err(write_failure());
        }
        let Some(row) = inner
            .rows
            .iter_mut()
            .find(|row| row.remote_id == Some(remote_id))
        else {
            return Ok(None);
        };
        row.name.clone_from(&fields.name);
        row.description.clone_from(&fields.description);
        row.price = fields.price;
        row.image_url.clone_from(&fields.image_url);
        row.status = fields.status;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_by_remote_id(
        &self,
        remote_id: RemoteProductId,
    ) -> Result<u64, RepositoryError> {
        let mut inner = lock(&self.inner);
        if inner.fail_writes {
            return Err(write_failure());
        }
        let before = inner.rows.len();
        inner.rows.retain(|row| row.remote_id != Some(remote_id));
        Ok((before - inner.rows.len()) as u64)
    }

    async fn set_remote_id(
        &self,
        id: MirrorId,
        remote_id: RemoteProductId,
    ) -> Result<(), RepositoryError> {
        let mut inner = lock(&self.inner);
        if inner.fail_writes {
            return Err(write_failure());
        }
        let row = inner
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.remote_id = Some(remote_id);
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, id: MirrorId) -> Result<Option<ProductMirror>, RepositoryError> {
        Ok(lock(&self.inner).rows.iter().find(|row| row.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<ProductMirror>, RepositoryError> {
        Ok(self.rows())
    }
}

// =============================================================================
// In-memory users
// =============================================================================

#[derive(Debug, Clone)]
pub struct StoredToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub name: String,
    pub token_hash: String,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct UserTables {
    users: Vec<(User, String)>,
    tokens: Vec<StoredToken>,
    next_user_id: i64,
    next_token_id: i64,
}

/// In-memory accounts and access tokens.
#[derive(Default)]
pub struct MemoryUsers {
    inner: Mutex<UserTables>,
}

impl MemoryUsers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        lock(&self.inner).users.len()
    }

    /// Stored password hash for `email`.
    #[must_use]
    pub fn password_hash(&self, email: &str) -> Option<String> {
        lock(&self.inner)
            .users
            .iter()
            .find(|(user, _)| user.email.as_str() == email)
            .map(|(_, hash)| hash.clone())
    }

    #[must_use]
    pub fn tokens(&self) -> Vec<StoredToken> {
        lock(&self.inner).tokens.clone()
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut inner = lock(&self.inner);
        if inner
            .users
            .iter()
            .any(|(user, _)| user.email == new_user.email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        inner.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(inner.next_user_id),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            created_at: now,
            updated_at: now,
        };
        inner
            .users
            .push((user.clone(), new_user.password_hash.clone()));
        Ok(user)
    }

    async fn find_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(lock(&self.inner)
            .users
            .iter()
            .find(|(user, _)| &user.email == email)
            .cloned())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.inner)
            .users
            .iter()
            .find(|(user, _)| user.id == id)
            .map(|(user, _)| user.clone()))
    }

    async fn create_token(
        &self,
        user_id: UserId,
        name: &str,
        token_hash: &str,
    ) -> Result<TokenId, RepositoryError> {
        let mut inner = lock(&self.inner);
        inner.next_token_id += 1;
        let id = TokenId::new(inner.next_token_id);
        inner.tokens.push(StoredToken {
            id,
            user_id,
            name: name.to_owned(),
            token_hash: token_hash.to_owned(),
            last_used_at: None,
        });
        Ok(id)
    }

    async fn find_by_token(
        &self,
        id: TokenId,
        token_hash: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let mut inner = lock(&self.inner);
        let Some(token) = inner
            .tokens
            .iter_mut()
            .find(|t| t.id == id && t.token_hash == token_hash)
        else {
            return Ok(None);
        };
        token.last_used_at = Some(Utc::now());
        let user_id = token.user_id;
        Ok(inner
            .users
            .iter()
            .find(|(user, _)| user.id == user_id)
            .map(|(user, _)| user.clone()))
    }

    async fn revoke_token(&self, id: TokenId) -> Result<(), RepositoryError> {
        lock(&self.inner).tokens.retain(|t| t.id != id);
        Ok(())
    }
}

// =============================================================================
// Test application
// =============================================================================

/// A response with its body parsed as JSON (or as a JSON string for text).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// The router wired to fresh in-memory dependencies.
pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<FakeGateway>,
    pub mirror: Arc<MemoryMirror>,
    pub users: Arc<MemoryUsers>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let gateway = Arc::new(FakeGateway::new());
        let mirror = Arc::new(MemoryMirror::new());
        let users = Arc::new(MemoryUsers::new());

        let state = AppState::new(gateway.clone(), mirror.clone(), users.clone());

        Self {
            router: woo_bridge_server::app(state),
            gateway,
            mirror,
            users,
        }
    }

    /// Send a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("valid request")).await
    }

    /// Send a prepared request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse { status, body }
    }

    /// Register an account and return its bearer token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/register",
                None,
                Some(json!({
                    "name": "Test User",
                    "email": email,
                    "password": "correct horse battery",
                    "password_confirmation": "correct horse battery"
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in register response")
            .to_owned()
    }
}

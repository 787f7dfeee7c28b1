//! # Shopfront API
//!
//! HTTP server for the Shopfront back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Pipeline                                │
//! │                                                                         │
//! │  TraceLayer ─► CorsLayer ─► TimeoutLayer ─► Router                      │
//! │                                               │                         │
//! │                 ┌─────────────────────────────┼──────────────────┐      │
//! │                 │ public                      │ /api (bearer JWT)│      │
//! │                 │  GET  /health               ▼                  │      │
//! │                 │  POST /api/auth/login   require_auth ─► handlers      │
//! │                 └────────────────────────────────────────────────┘      │
//! │                                                                         │
//! │  handlers ─► shopfront-db repositories ─► SQLite (WAL)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Every field can be set in `shopfront.toml` or
//! through a `SHOPFRONT_*` environment variable.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod session;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use shopfront_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::{Claims, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use session::SessionStore;

/// Shared application state. Cheap to clone: every field is a handle.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub sessions: SessionStore,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Wires the state from an open database and the loaded configuration.
    pub async fn new(db: Database, config: ApiConfig) -> Result<Self, session::SessionError> {
        let sessions = SessionStore::open(&config.session_file).await?;
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);

        Ok(AppState {
            db,
            jwt,
            sessions,
            config: Arc::new(config),
        })
    }
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    use handlers::{
        auth as auth_h, catalog, code_formats, invoices, parties, purchase_orders, reports, users,
    };

    let protected = Router::new()
        // Auth
        .route("/auth/register", post(auth_h::register))
        .route("/auth/role", get(auth_h::role))
        .route("/auth/logout", post(auth_h::logout))
        // Users
        .route("/users", get(users::list))
        .route("/users/{id}", axum::routing::delete(users::delete))
        .route("/users/{id}/role", put(users::set_role))
        .route("/users/{id}/active", put(users::set_active))
        .route("/roles", get(users::roles))
        // Catalog
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route(
            "/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/products/{sku}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/products/{sku}/restock", post(catalog::restock))
        .route("/inventory/deduct", post(catalog::deduct_stock))
        // Parties
        .route("/suppliers", get(parties::list_suppliers).post(parties::create_supplier))
        .route(
            "/suppliers/{code}",
            get(parties::get_supplier)
                .put(parties::update_supplier)
                .delete(parties::delete_supplier),
        )
        .route("/customers", get(parties::list_customers).post(parties::create_customer))
        .route(
            "/customers/{code}",
            get(parties::get_customer)
                .put(parties::update_customer)
                .delete(parties::delete_customer),
        )
        // Documents
        .route("/purchase-orders", get(purchase_orders::list).post(purchase_orders::create))
        .route(
            "/purchase-orders/{code}",
            get(purchase_orders::get).delete(purchase_orders::delete),
        )
        .route("/purchase-orders/{code}/receive", post(purchase_orders::receive))
        .route("/invoices", get(invoices::list).post(invoices::create))
        .route("/invoices/{code}", get(invoices::get))
        // Reports
        .route("/reports/sales", get(reports::sales_summary))
        .route("/reports/top-products", get(reports::top_products))
        .route("/reports/low-stock", get(reports::low_stock))
        .route("/reports/inventory-value", get(reports::inventory_value))
        .route("/reports/purchases", get(reports::purchase_summary))
        // Code formats
        .route("/code-formats", get(code_formats::list))
        .route(
            "/code-formats/{code_type}",
            get(code_formats::get).put(code_formats::update),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    let api = Router::new()
        .route("/auth/login", post(auth_h::login))
        .merge(protected);

    let timeout = state.config.request_timeout();

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use shopfront_core::ADMIN_ROLE;
    use shopfront_db::{DbConfig, NewUser};

    pub const ADMIN_PASSWORD: &str = "admin-password";

    /// State over an in-memory database with an `admin` user. The temp dir
    /// holds the session file and must outlive the state.
    pub async fn state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ApiConfig {
            http_port: 0,
            database_url: "sqlite::memory:".to_string(),
            fallback_database_url: None,
            connect_attempts: 1,
            connect_retry_delay_ms: 0,
            max_connections: 1,
            request_timeout_secs: 5,
            jwt_secret: "test-secret".to_string(),
            jwt_lifetime_secs: 600,
            session_file: dir.path().join("sessions.json").display().to_string(),
            bootstrap_admin_password: Some(ADMIN_PASSWORD.to_string()),
        };

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, config).await.unwrap();
        handlers::auth::bootstrap_admin(&state.db, ADMIN_PASSWORD)
            .await
            .unwrap();
        (state, dir)
    }

    /// Creates a user with the given role and returns claims as if they
    /// had logged in.
    pub async fn claims_for(state: &AppState, username: &str, role: &str) -> Claims {
        let role = state.db.users().role_by_name(role).await.unwrap();
        let user = state
            .db
            .users()
            .create(&NewUser {
                username: username.to_string(),
                full_name: format!("{} Example", username),
                password_hash: auth::hash_password("password123").unwrap(),
                role_id: role.id,
            })
            .await
            .unwrap();
        let token = state.jwt.issue(&user).unwrap();
        state.jwt.validate(&token).unwrap()
    }

    pub async fn admin_claims(state: &AppState) -> Claims {
        let admin = state
            .db
            .users()
            .find_by_username("admin")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role_name, ADMIN_ROLE);
        let token = state.jwt.issue(&admin).unwrap();
        state.jwt.validate(&token).unwrap()
    }
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (state, _dir) = test_support::state().await;
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_bearer_token() {
        let (state, _dir) = test_support::state().await;
        let app = build_router(state);

        let (status, body) = send(&app, Method::GET, "/api/products", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) =
            send(&app, Method::GET, "/api/products", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_then_sell() {
        let (state, _dir) = test_support::state().await;
        let app = build_router(state);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": test_support::ADMIN_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        let token = Some(token.as_str());

        let (status, product) = send(
            &app,
            Method::POST,
            "/api/products",
            token,
            Some(json!({ "name": "House Blend", "quantity": 10, "costCents": 600, "priceCents": 1000 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product["discountAllowed"], false);
        let sku = product["sku"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/inventory/deduct",
            token,
            Some(json!([{ "sku": sku, "quantity": 4 }])),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/invoices",
            token,
            Some(json!({
                "paymentMethod": "cash",
                "totalCents": 4000,
                "netCents": 4000,
                "items": [{ "sku": sku, "name": "House Blend", "quantity": 4, "priceCents": 1000 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let code = created["invoiceCode"].as_str().unwrap().to_string();

        let (status, invoice) =
            send(&app, Method::GET, &format!("/api/invoices/{}", code), token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(invoice["items"].as_array().unwrap().len(), 1);

        // 6 left, asking for 7 conflicts
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/inventory/deduct",
            token,
            Some(json!([{ "sku": sku, "quantity": 7 }])),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, product) =
            send(&app, Method::GET, &format!("/api/products/{}", sku), token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(product["quantity"], 6);
    }

    #[tokio::test]
    async fn test_bad_bodies_get_json_errors() {
        let (state, _dir) = test_support::state().await;
        let admin = state.db.users().find_by_username("admin").await.unwrap().unwrap();
        let token = state.jwt.issue(&admin).unwrap();
        let app = build_router(state);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/products")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "VALIDATION");

        // Well-formed JSON missing a required field
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "No Price" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Gift Card", "costCents": 0, "priceCents": 5000, "maxDiscount": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["discountAllowed"], false);
        assert_eq!(body["maxDiscount"], 100);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(json!({
                "paymentMethod": "cash",
                "totalCents": 0,
                "netCents": 0,
                "items": [{ "sku": "PRD00001", "name": "Huge", "quantity": 4, "priceCents": i64::MAX / 2 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION");
    }
}

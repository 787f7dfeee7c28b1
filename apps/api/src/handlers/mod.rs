//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: extract, check the caller's role where needed, call
//! a repository, wrap the result in JSON. Validation and every write rule
//! live in shopfront-core and shopfront-db.

pub mod auth;
pub mod catalog;
pub mod code_formats;
pub mod invoices;
pub mod parties;
pub mod purchase_orders;
pub mod reports;
pub mod users;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::AppState;

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "DATABASE UNAVAILABLE")
    }
}

//! Suppliers and customers. Codes are generated on create and address the
//! row afterwards.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use shopfront_core::{Customer, PartyDetails, Supplier};

use crate::error::ApiResult;
use crate::extract::Json;
use crate::AppState;

// =============================================================================
// Suppliers
// =============================================================================

pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db.suppliers().list().await?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Json(details): Json<PartyDetails>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let supplier = state.db.suppliers().create(&details).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(state.db.suppliers().get(&code).await?))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(details): Json<PartyDetails>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(state.db.suppliers().update(&code, &details).await?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.suppliers().delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Customers
// =============================================================================

pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list().await?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(details): Json<PartyDetails>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(&details).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get(&code).await?))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(details): Json<PartyDetails>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().update(&code, &details).await?))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.customers().delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

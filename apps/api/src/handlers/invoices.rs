//! Sales invoice handlers.
//!
//! Saving an invoice does not touch stock. The till deducts through
//! `POST /api/inventory/deduct` first, then saves the invoice.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use shopfront_core::{InvoiceWithItems, SalesInvoice};
use shopfront_db::NewInvoice;

use crate::error::ApiResult;
use crate::extract::Json;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedInvoice {
    pub invoice_code: String,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<SalesInvoice>>> {
    Ok(Json(state.db.invoices().list().await?))
}

/// `POST /api/invoices`: header and cart items in one transaction.
pub async fn create(
    State(state): State<AppState>,
    Json(invoice): Json<NewInvoice>,
) -> ApiResult<(StatusCode, Json<SavedInvoice>)> {
    let invoice_code = state.db.invoices().save(&invoice).await?;
    Ok((StatusCode::CREATED, Json(SavedInvoice { invoice_code })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<InvoiceWithItems>> {
    Ok(Json(state.db.invoices().get(&code).await?))
}

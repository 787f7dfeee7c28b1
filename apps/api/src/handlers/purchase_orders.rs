//! Purchase order handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use shopfront_core::{PurchaseOrder, PurchaseOrderWithLines};
use shopfront_db::{CreatedPurchaseOrder, NewPurchaseOrder};

use crate::error::ApiResult;
use crate::extract::Json;
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PurchaseOrder>>> {
    Ok(Json(state.db.purchase_orders().list().await?))
}

/// `POST /api/purchase-orders`: header and lines in one transaction.
pub async fn create(
    State(state): State<AppState>,
    Json(order): Json<NewPurchaseOrder>,
) -> ApiResult<(StatusCode, Json<CreatedPurchaseOrder>)> {
    let created = state.db.purchase_orders().create(&order).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<PurchaseOrderWithLines>> {
    Ok(Json(state.db.purchase_orders().get(&code).await?))
}

/// Removes an open order and all of its lines.
pub async fn delete(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.purchase_orders().delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/purchase-orders/{code}/receive`: books every line into stock.
pub async fn receive(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<PurchaseOrderWithLines>> {
    Ok(Json(state.db.purchase_orders().receive(&code).await?))
}

//! Dashboard reports. Date ranges are inclusive; `from` after `to` is
//! rejected.

use axum::extract::{Query, State};
use chrono::NaiveDate;
use serde::Deserialize;
use shopfront_db::repository::report::{InventoryValue, PurchaseSummary, SalesSummary, TopProduct};

use super::catalog::{views, ProductView};
use crate::error::{ApiError, ApiResult};
use crate::extract::Json;
use crate::AppState;

const DEFAULT_TOP_LIMIT: u32 = 10;
const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// `?from=2026-03-01&to=2026-03-31`
#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    fn checked(self) -> ApiResult<(NaiveDate, NaiveDate)> {
        if self.from > self.to {
            return Err(ApiError::Validation(format!(
                "from ({}) is after to ({})",
                self.from, self.to
            )));
        }
        Ok((self.from, self.to))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<i64>,
}

pub async fn sales_summary(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<SalesSummary>> {
    let (from, to) = range.checked()?;
    Ok(Json(state.db.reports().sales_summary(from, to).await?))
}

pub async fn top_products(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<TopProduct>>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    Ok(Json(state.db.reports().top_products(limit).await?))
}

pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<ThresholdQuery>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    Ok(Json(views(state.db.reports().low_stock(threshold).await?)))
}

pub async fn inventory_value(State(state): State<AppState>) -> ApiResult<Json<InventoryValue>> {
    Ok(Json(state.db.reports().inventory_value().await?))
}

pub async fn purchase_summary(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<PurchaseSummary>> {
    let (from, to) = range.checked()?;
    Ok(Json(state.db.reports().purchase_summary(from, to).await?))
}

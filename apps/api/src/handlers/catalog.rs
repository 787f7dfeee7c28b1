//! Categories, products and stock movements.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shopfront_core::{Category, Product, StockDeduction};
use shopfront_db::NewProduct;
use tracing::info;

use crate::error::ApiResult;
use crate::extract::Json;
use crate::AppState;

const DEFAULT_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `?q=beans&limit=20`. Without `q` every product is listed.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

/// A product as clients see it, with the derived `discountAllowed` flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub discount_allowed: bool,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let discount_allowed = product.discount_allowed();
        ProductView {
            product,
            discount_allowed,
        }
    }
}

pub(crate) fn views(products: Vec<Product>) -> Vec<ProductView> {
    products.into_iter().map(ProductView::from).collect()
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

// =============================================================================
// Categories
// =============================================================================

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state
        .db
        .categories()
        .create(&request.name, request.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.db.categories().get(id).await?))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    let category = state
        .db
        .categories()
        .update(id, &request.name, request.description.as_deref())
        .await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let products = match query.q.as_deref() {
        Some(q) => {
            let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
            state.db.products().search(q, limit).await?
        }
        None => state.db.products().list().await?,
    };
    Ok(Json(views(products)))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(product): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductView>)> {
    let product = state.db.products().create(&product).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> ApiResult<Json<ProductView>> {
    Ok(Json(state.db.products().get_by_sku(&sku).await?.into()))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(product): Json<NewProduct>,
) -> ApiResult<Json<ProductView>> {
    Ok(Json(state.db.products().update(&sku, &product).await?.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().delete(&sku).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/products/{sku}/restock`
pub async fn restock(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(request): Json<RestockRequest>,
) -> ApiResult<Json<ProductView>> {
    let product = state.db.products().restock(&sku, request.quantity).await?;
    info!(sku = %product.sku, added = request.quantity, quantity = product.quantity, "Restocked");
    Ok(Json(product.into()))
}

/// `POST /api/inventory/deduct`: all entries apply or none do.
pub async fn deduct_stock(
    State(state): State<AppState>,
    Json(entries): Json<Vec<StockDeduction>>,
) -> ApiResult<StatusCode> {
    state.db.products().deduct_stock(&entries).await?;
    info!(entries = entries.len(), "Stock deducted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support::state;

    fn beans(quantity: i64) -> NewProduct {
        NewProduct {
            sku: None,
            name: "Espresso Beans".to_string(),
            category_id: None,
            quantity,
            cost_cents: 900,
            price_cents: 1500,
            max_discount: 10,
        }
    }

    fn deduct(sku: &str, quantity: i64) -> Json<Vec<StockDeduction>> {
        Json(vec![StockDeduction {
            sku: sku.to_string(),
            quantity,
        }])
    }

    #[tokio::test]
    async fn test_category_crud() {
        let (state, _dir) = state().await;

        let (status, Json(category)) = create_category(
            State(state.clone()),
            Json(CategoryRequest {
                name: "Coffee".to_string(),
                description: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(updated) = update_category(
            State(state.clone()),
            Path(category.id),
            Json(CategoryRequest {
                name: "Coffee Beans".to_string(),
                description: Some("Whole and ground".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Coffee Beans");

        let Json(ProductView { product, .. }) = create_product(
            State(state.clone()),
            Json(NewProduct {
                category_id: Some(category.id),
                ..beans(1)
            }),
        )
        .await
        .unwrap()
        .1;

        // Still referenced by a product
        let in_use = delete_category(State(state.clone()), Path(category.id)).await;
        assert!(matches!(in_use, Err(ApiError::Conflict(_))));

        delete_product(State(state.clone()), Path(product.sku)).await.unwrap();
        let status = delete_category(State(state.clone()), Path(category.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let missing = get_category(State(state), Path(category.id)).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deduct_four_three_times() {
        let (state, _dir) = state().await;
        let (_, Json(ProductView { product, .. })) =
            create_product(State(state.clone()), Json(beans(10))).await.unwrap();

        for _ in 0..2 {
            let status = deduct_stock(State(state.clone()), deduct(&product.sku, 4))
                .await
                .unwrap();
            assert_eq!(status, StatusCode::NO_CONTENT);
        }
        let third = deduct_stock(State(state.clone()), deduct(&product.sku, 4)).await;
        assert!(matches!(third, Err(ApiError::Conflict(_))));

        let Json(view) = get_product(State(state), Path(product.sku)).await.unwrap();
        assert_eq!(view.product.quantity, 2);
    }

    #[tokio::test]
    async fn test_search_restock_and_validation() {
        let (state, _dir) = state().await;
        let (_, Json(ProductView { product, .. })) =
            create_product(State(state.clone()), Json(beans(0))).await.unwrap();

        let Json(found) = list_products(
            State(state.clone()),
            Query(ProductQuery {
                q: Some("espresso".to_string()),
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);

        let Json(restocked) = restock(
            State(state.clone()),
            Path(product.sku.clone()),
            Json(RestockRequest { quantity: 12 }),
        )
        .await
        .unwrap();
        assert_eq!(restocked.product.quantity, 12);

        let negative = restock(
            State(state.clone()),
            Path(product.sku),
            Json(RestockRequest { quantity: -1 }),
        )
        .await;
        assert!(matches!(negative, Err(ApiError::Validation(_))));

        let unknown = deduct_stock(State(state), deduct("PRD99999", 1)).await;
        assert!(matches!(unknown, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_discount_allowed_in_json() {
        let (state, _dir) = state().await;

        for (max_discount, allowed) in [(0, false), (1, true), (99, true), (100, false)] {
            let (_, Json(view)) = create_product(
                State(state.clone()),
                Json(NewProduct {
                    max_discount,
                    ..beans(1)
                }),
            )
            .await
            .unwrap();

            let json = serde_json::to_value(&view).unwrap();
            assert_eq!(json["discountAllowed"], allowed, "max_discount {max_discount}");
            assert_eq!(json["maxDiscount"], max_discount);
            assert_eq!(json["sku"], view.product.sku.as_str());
        }

        let Json(listed) = list_products(State(state), Query(ProductQuery::default()))
            .await
            .unwrap();
        let flags: Vec<bool> = listed.iter().map(|v| v.discount_allowed).collect();
        assert_eq!(flags.iter().filter(|allowed| **allowed).count(), 2);
        assert_eq!(flags.len(), 4);
    }
}

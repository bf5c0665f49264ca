use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::models::{EventKind, Product, ProductPatch};
use crate::state::AppState;

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    MAX_PAGE_SIZE
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    if params.limit > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "limit must be at most {MAX_PAGE_SIZE}"
        )));
    }
    let products = state.store.list(params.offset, params.limit).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(product): Json<Product>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    if state.store.get(product.id).await?.is_some() {
        return Err(AppError::Conflict("Product already exists".into()));
    }
    state.store.insert(product.clone()).await?;
    state
        .notifier
        .notify(EventKind::Create, Some(product.clone()), None)
        .await;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, AppError> {
    let mut product = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    patch.apply(&mut product);
    state.store.update(product.clone()).await?;
    state
        .notifier
        .notify(EventKind::Update, Some(product.clone()), None)
        .await;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.store.delete(id).await? {
        return Err(AppError::NotFound("Product not found".into()));
    }
    state
        .notifier
        .notify(EventKind::Delete, None, Some(json!({ "product_id": id })))
        .await;
    Ok(Json(json!({ "status": "ok" })))
}

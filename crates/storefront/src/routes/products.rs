//! Product API handlers (JSON).
//!
//! Every mutation goes through the catalog, which persists it and pushes the
//! new product list to real-time observers before the response is sent.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use catalog_core::{NewProduct, Product, ProductId, ProductPatch};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Maximum number of products; ignored unless a positive integer.
    pub limit: Option<String>,
}

impl ListQuery {
    /// The requested limit, if it is a positive integer.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
    }
}

/// Parse a product ID path segment. Anything unparseable cannot name a
/// product, so it is reported as not found.
pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.parse::<ProductId>()
        .map_err(|_| AppError::NotFound("Product not found".to_string()))
}

/// Unwrap a JSON body, turning malformed input into a 400 with a JSON body.
pub(crate) fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// List products, optionally capped by `?limit=N`.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Product>> {
    Json(state.catalog().list(query.limit()).await)
}

/// Show a single product.
pub async fn show(State(state): State<AppState>, Path(pid): Path<String>) -> Result<Json<Product>> {
    let id = parse_product_id(&pid)?;
    Ok(Json(state.catalog().get(id).await?))
}

/// Create a product.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = json_body(body)?;
    let product = state.catalog().add(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update some fields of a product.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    body: std::result::Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>> {
    let id = parse_product_id(&pid)?;
    let patch = json_body(body)?;
    Ok(Json(state.catalog().update(id, patch).await?))
}

/// Delete a product, returning it.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> Result<Json<Product>> {
    let id = parse_product_id(&pid)?;
    Ok(Json(state.catalog().delete(id).await?))
}

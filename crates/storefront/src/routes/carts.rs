//! Cart API handlers (JSON).
//!
//! Carts live in memory only and are identified by short random IDs.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use catalog_core::{Cart, CartId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cart wrapped with a human-readable message.
#[derive(Debug, Serialize)]
pub struct CartMessage {
    pub message: &'static str,
    pub cart: Cart,
}

/// Cart lookup response.
#[derive(Debug, Serialize)]
pub struct CartEnvelope {
    pub cart: Cart,
}

/// Add-to-cart request body. The body itself is optional.
#[derive(Debug, Default, Deserialize)]
pub struct AddToCartBody {
    pub quantity: Option<u32>,
}

impl AddToCartBody {
    /// Parse a JSON body, treating an empty one as "no options".
    fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

/// Create an empty cart.
#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<CartMessage>)> {
    let cart = state.carts().create().await?;
    Ok((
        StatusCode::CREATED,
        Json(CartMessage {
            message: "Cart created",
            cart,
        }),
    ))
}

/// Show a cart.
pub async fn show(State(state): State<AppState>, Path(cid): Path<String>) -> Result<Json<CartEnvelope>> {
    let cart = state.carts().get(&CartId::new(cid)).await?;
    Ok(Json(CartEnvelope { cart }))
}

/// Add a product to a cart, one unit unless `quantity` is given.
#[instrument(skip(state, body))]
pub async fn add_product(
    State(state): State<AppState>,
    Path((cid, pid)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<CartMessage>> {
    let product = pid
        .parse()
        .map_err(|_| AppError::NotFound("Product not found".to_string()))?;
    let quantity = AddToCartBody::parse(&body)?.quantity.unwrap_or(1);

    let cart = state
        .carts()
        .add_product(&CartId::new(cid), product, quantity, state.catalog())
        .await?;

    Ok(Json(CartMessage {
        message: "Product added to cart",
        cart,
    }))
}

//! HTTP route handlers for the catalog server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Product listing page (?limit=N)
//! GET  /products/{pid}                - Product detail page
//! GET  /realtimeproducts              - Live product list page
//! GET  /ws                            - Live product feed (WebSocket)
//! GET  /health                        - Health check
//! GET  /health/stats                  - Product and live observer counts
//! GET  /static/*                      - Static assets
//!
//! # Products API (JSON)
//! GET    /api/products                - List products (?limit=N)
//! POST   /api/products                - Create product
//! GET    /api/products/{pid}          - Show product
//! PUT    /api/products/{pid}          - Update product fields
//! DELETE /api/products/{pid}          - Delete product
//!
//! # Carts API (JSON)
//! POST /api/carts                     - Create cart
//! GET  /api/carts/{cid}               - Show cart
//! POST /api/carts/{cid}/product/{pid} - Add product to cart
//! ```

pub mod carts;
pub mod products;
pub mod views;

use axum::{
    Router, middleware as axum_middleware,
    Json,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::realtime;
use crate::state::AppState;

/// Create the product API router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{pid}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart API router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(carts::create))
        .route("/{cid}", get(carts::show))
        .route("/{cid}/product/{pid}", post(carts::add_product))
}

/// Create all routes for the catalog server.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(views::index))
        .route("/products/{pid}", get(views::show))
        .route("/realtimeproducts", get(views::realtime))
        // Live feed
        .route("/ws", get(realtime::ws_handler))
        // JSON API
        .nest("/api/products", product_routes())
        .nest("/api/carts", cart_routes())
}

/// Build the complete application with health check, static assets and the
/// middleware stack. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config().static_dir);

    Router::new()
        .route("/health", get(health))
        .route("/health/stats", get(stats))
        .merge(routes())
        .nest_service("/static", static_dir)
        .fallback(views::fallback)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Live counters reported by `/health/stats`.
#[derive(Debug, Serialize)]
struct Stats {
    products: usize,
    observers: usize,
}

/// Catalog size and number of connected live-feed clients.
async fn stats(State(state): State<AppState>) -> Json<Stats> {
    Json(Stats {
        products: state.catalog().snapshot().await.len(),
        observers: state.broadcaster().observer_count(),
    })
}

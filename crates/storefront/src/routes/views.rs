//! Server-rendered pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog_core::Product;

use crate::filters;
use crate::routes::products::{ListQuery, parse_product_id};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: String,
    pub thumbnail: String,
    pub code: String,
    pub stock: u32,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            thumbnail: product.thumbnail.clone(),
            code: product.code.clone(),
            stock: product.stock,
        }
    }
}

fn views(products: &[Product]) -> Vec<ProductView> {
    products.iter().map(ProductView::from).collect()
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub limit: Option<usize>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// Live product list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/realtime.html")]
pub struct RealtimeProductsTemplate {
    pub products: Vec<ProductView>,
}

/// Not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub message: String,
}

/// Display the product listing, optionally capped by `?limit=N`.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let limit = query.limit();
    let products = state.catalog().list(limit).await;

    ProductsIndexTemplate {
        products: views(&products),
        limit,
    }
}

/// Display a product detail page.
pub async fn show(State(state): State<AppState>, Path(pid): Path<String>) -> Response {
    let product = match parse_product_id(&pid) {
        Ok(id) => state.catalog().get(id).await.ok(),
        Err(_) => None,
    };

    match product {
        Some(product) => ProductShowTemplate {
            product: ProductView::from(&product),
        }
        .into_response(),
        None => not_found("Product not found"),
    }
}

/// Display the live product list.
///
/// Renders the current list; the page script then keeps it in sync over
/// the `/ws` channel.
pub async fn realtime(State(state): State<AppState>) -> impl IntoResponse {
    let products = state.catalog().list(None).await;
    RealtimeProductsTemplate {
        products: views(&products),
    }
}

/// Fallback for unknown pages.
pub async fn fallback() -> Response {
    not_found("Page not found")
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            message: message.to_string(),
        },
    )
        .into_response()
}

//! Real-time product list channel over WebSocket.
//!
//! Frames are JSON text of the form `{"event": <name>, "data": <payload>}`.
//! Each socket is an observer of the catalog: it gets the full list on
//! connect and again after every successful mutation, from any client.
//! A rejected client request is answered with an `error` event sent to that
//! client only.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use catalog_core::{NewProduct, Product, ProductId};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;
use crate::error::add_breadcrumb;
use crate::state::AppState;

/// Events a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Add a product; validated like any other add.
    NewProduct(NewProduct),
    /// Delete the product with this ID.
    DeleteProduct(ProductId),
}

/// Events the server sends.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent<'a> {
    /// The full, current product list.
    UpdateProductList(&'a [Product]),
    /// A request from this client failed.
    Error { kind: ErrorKind, message: String },
}

/// Category of a failed client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The frame was not a recognised event.
    BadRequest,
    /// Missing or empty fields, or a duplicate code.
    Validation,
    /// The product does not exist.
    NotFound,
    /// The product file could not be written.
    Io,
}

impl ServerEvent<'_> {
    fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
        }
    }
}

impl From<&CatalogError> for ServerEvent<'_> {
    fn from(err: &CatalogError) -> Self {
        match err {
            CatalogError::Validation(_) | CatalogError::DuplicateCode(_) => {
                Self::error(ErrorKind::Validation, err.to_string())
            }
            CatalogError::NotFound(_) => Self::error(ErrorKind::NotFound, err.to_string()),
            CatalogError::Store(_) => Self::error(ErrorKind::Io, "Could not save the product list"),
            CatalogError::IdsExhausted => Self::error(ErrorKind::Io, "No product IDs left"),
        }
    }
}

/// Upgrade `GET /ws` to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    // Subscribe before reading the list so no mutation falls in between.
    let mut observer = state.broadcaster().subscribe();
    let observer_id = observer.id();

    let initial = state.catalog().snapshot().await;
    if send_event(&mut socket, &ServerEvent::UpdateProductList(&initial))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(Ok(message)) = incoming else {
                    break;
                };
                let reply = match message {
                    Message::Text(text) => handle_frame(&state, observer_id, text.as_str()).await,
                    Message::Binary(_) => {
                        tracing::debug!(observer_id, "Binary client frame");
                        Some(ServerEvent::error(
                            ErrorKind::BadRequest,
                            "Binary frames are not supported; send JSON text",
                        ))
                    }
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => None,
                };
                if let Some(reply) = reply
                    && send_event(&mut socket, &reply).await.is_err()
                {
                    break;
                }
            }
            snapshot = observer.recv() => {
                let Some(snapshot) = snapshot else {
                    break;
                };
                if send_event(&mut socket, &ServerEvent::UpdateProductList(&snapshot))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    }
}

/// Apply one client frame. Returns the reply owed to this client alone, if
/// any; successful mutations reach it through the broadcast instead.
async fn handle_frame(state: &AppState, observer_id: u64, text: &str) -> Option<ServerEvent<'static>> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(observer_id, error = %e, "Unreadable client frame");
            return Some(ServerEvent::error(
                ErrorKind::BadRequest,
                format!("Unrecognised event: {e}"),
            ));
        }
    };

    let result = match event {
        ClientEvent::NewProduct(input) => {
            add_breadcrumb("realtime", "newProduct", None);
            state.catalog().add(input).await.map(|product| {
                tracing::info!(observer_id, product_id = %product.id, "Product added over WebSocket");
            })
        }
        ClientEvent::DeleteProduct(id) => {
            let id_str = id.to_string();
            add_breadcrumb("realtime", "deleteProduct", Some(&[("product_id", id_str.as_str())]));
            state.catalog().delete(id).await.map(|product| {
                tracing::info!(observer_id, product_id = %product.id, "Product deleted over WebSocket");
            })
        }
    };

    match result {
        Ok(()) => None,
        Err(err) => {
            tracing::warn!(observer_id, error = %err, "WebSocket request rejected");
            Some(ServerEvent::from(&err))
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent<'_>) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode WebSocket event");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

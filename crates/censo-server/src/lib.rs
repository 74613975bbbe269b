// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod handlers;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use censo_query::QueryLimits;
use censo_store::{Store, StoreError};
use tokio::sync::Mutex;

pub const CRATE_NAME: &str = "censo-server";

#[derive(Debug)]
pub struct ServerError(pub String);

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "server error: {}", self.0)
    }
}
impl std::error::Error for ServerError {}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        Self(e.to_string())
    }
}

struct StateInner {
    store: Mutex<Store>,
    limits: QueryLimits,
    cursor_secret: Vec<u8>,
}

/// Shared handler state. The SQLite connection is single-writer, so the
/// store sits behind an async mutex and handlers hold it only for the
/// duration of one statement batch.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

impl AppState {
    pub fn open(db_path: &Path, cursor_secret: Vec<u8>) -> Result<Self, ServerError> {
        let store = Store::open(db_path)?;
        Ok(Self::from_store(store, cursor_secret))
    }

    #[must_use]
    pub fn from_store(store: Store, cursor_secret: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(StateInner {
                store: Mutex::new(store),
                limits: QueryLimits::default(),
                cursor_secret,
            }),
        }
    }

    pub(crate) async fn store(&self) -> tokio::sync::MutexGuard<'_, Store> {
        self.inner.store.lock().await
    }

    pub(crate) fn limits(&self) -> &QueryLimits {
        &self.inner.limits
    }

    pub(crate) fn cursor_secret(&self) -> &[u8] {
        &self.inner.cursor_secret
    }
}

#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/v1/instituicoes/ranking/:ano", get(handlers::ranking))
        .route(
            "/v1/microdados",
            get(handlers::list_microdados).post(handlers::create_microdado),
        )
        .route(
            "/v1/microdados/:id",
            get(handlers::get_microdado)
                .put(handlers::update_microdado)
                .delete(handlers::delete_microdado),
        )
        .with_state(state)
}

pub async fn run(addr: SocketAddr, state: AppState) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError(format!("bind {addr}: {e}")))?;
    tracing::info!(%addr, "http server listening");
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| ServerError(e.to_string()))
}

pub use handlers::{
    create_microdado, delete_microdado, get_microdado, healthz, list_microdados, ranking, root,
    update_microdado,
};

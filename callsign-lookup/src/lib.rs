//! callsign-lookup library - member directory service
//!
//! Serves callsign lookups as HTML or JSON(P) and replaces the whole
//! directory from an uploaded CSV roster.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use callsign_common::MemberStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod import;
pub mod render;

pub use crate::error::{ApiError, ApiResult};
pub use crate::import::{ImportConfig, ImportSummary, Importer};

/// Default cap on the `/update` request body
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Member store (shared by lookups and uploads)
    pub store: Arc<dyn MemberStore>,
    /// Upload authentication
    pub auth: Arc<dyn api::Authenticator>,
    /// Write pool sizing for uploads
    pub import: ImportConfig,
    /// Multipart body limit for uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(
        store: Arc<dyn MemberStore>,
        auth: Arc<dyn api::Authenticator>,
        import: ImportConfig,
    ) -> Self {
        Self {
            store,
            auth,
            import,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build application router
///
/// `/`, `/lookup` and `/health` are public; `/update` checks the caller itself
/// so it can redirect to the login page instead of answering 401.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let upload = Router::new()
        .route("/update", get(api::update).post(api::update))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/lookup", get(api::lookup))
        .merge(api::health_routes());

    Router::new()
        .merge(upload)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Search page

use axum::response::Html;

use crate::render;

/// GET /
///
/// Static callsign search form
pub async fn serve_index() -> Html<&'static str> {
    Html(render::ROOT_PAGE)
}

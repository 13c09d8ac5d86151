//! Static viewer page.

use axum::response::Html;

const VIEWER_HTML: &str = include_str!("../../static/viewer.html");

/// GET /
pub async fn viewer() -> Html<&'static str> {
    Html(VIEWER_HTML)
}

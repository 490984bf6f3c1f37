use axum::{
    debug_handler,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/static/site.css", get(stylesheet))
        .route("/static/lightbox.js", get(lightbox_script))
}

#[debug_handler]
pub async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        include_res!(str, "/static/site.css"),
    )
}

#[debug_handler]
pub async fn lightbox_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        include_res!(str, "/static/lightbox.js"),
    )
}

#[debug_handler]
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(include_res!(str, "/pages/not_found.html")))
}

pub fn error_page() -> &'static str {
    include_res!(str, "/pages/error.html")
}

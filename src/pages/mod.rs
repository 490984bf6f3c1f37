//! The public site.

mod about;
mod contact;
mod home;
pub mod layout;
mod portfolio;
pub mod viewer;

use axum::{
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/portfolio", get(portfolio::portfolio))
        .route("/about", get(about::about))
        .route("/contact", get(contact::contact_page).post(contact::send_message))
}

/// Renders the page, or follows the lightbox to its new URL.
pub(crate) fn respond(
    viewer: viewer::Viewer,
    page: impl FnOnce(Option<String>) -> Response,
) -> Response {
    match viewer {
        viewer::Viewer::Redirect(url) => Redirect::to(&url).into_response(),
        viewer::Viewer::Open(overlay) => page(Some(overlay)),
        viewer::Viewer::Closed => page(None),
    }
}

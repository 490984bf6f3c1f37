pub mod admin;
pub mod auth;
pub mod backend;
pub mod config;
pub mod gallery;
pub mod html;
pub mod lightbox;
pub mod model;
pub mod pages;
pub mod res;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::{Html, IntoResponse, Response}, Router};
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::{auth::AuthService, config::Config, store::SiteStore};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: SiteStore,
    pub auth: AuthService,
    pub config: Arc<Config>,
}

/// Builds the complete application: public pages, the admin panel, static
/// resources and the cookie session layer.
pub fn app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.session_idle_minutes,
        )));

    Router::new()
        .merge(pages::router())
        .nest("/admin", admin::router(&state.config))
        .merge(res::router())
        .fallback(res::not_found)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, backtrace = %self.0.backtrace(), "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(res::error_page()),
        )
            .into_response()
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(anyhow::Error);
apperr_impl!(serde_json::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::Error);
apperr_impl!(axum::extract::multipart::MultipartError);
apperr_impl!(backend::BackendError);
apperr_impl!(store::StoreError);

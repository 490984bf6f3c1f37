//! The admin panel. Every command posts a form, checks the session's
//! CSRF token, runs one store command and redirects back to its tab with
//! a flash notice.

mod content;
mod design;
mod forms;
mod mailbox;
mod photos;

use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{multipart::MultipartError, DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    auth::{self, AdminGate},
    config::Config,
    html::escape_html,
    include_res,
    pages::layout::{self, Nav, Page},
    session::{csrf_token, set_flash, take_flash, Flash},
    store::{SiteStore, StoreError},
    AppResult, AppState,
};

/// Room for the multipart framing around the largest allowed file.
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn router(config: &Config) -> Router<AppState> {
    Router::new()
        .route("/", get(panel))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/hero", post(content::save_hero))
        .route("/about", post(content::save_about))
        .route("/photos", post(photos::upload))
        .route("/photos/sweep", post(photos::sweep))
        .route("/photos/{id}/edit", get(photos::edit_page).post(photos::save_edit))
        .route("/photos/{id}/archive", post(photos::toggle_archive))
        .route("/photos/{id}/delete", get(photos::confirm_delete).post(photos::delete))
        .route("/messages/{id}/replied", post(mailbox::toggle_replied))
        .route("/design/color", post(design::save_color))
        .route("/design/logo", post(design::upload_logo))
        .route("/design/logo/remove", post(design::remove_logo))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + FORM_OVERHEAD))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Tab {
    #[default]
    Content,
    Photos,
    Mailbox,
    Design,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Content, Tab::Photos, Tab::Mailbox, Tab::Design];

    fn slug(&self) -> &'static str {
        match self {
            Tab::Content => "content",
            Tab::Photos => "photos",
            Tab::Mailbox => "mailbox",
            Tab::Design => "design",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Tab::Content => "Content",
            Tab::Photos => "Photos",
            Tab::Mailbox => "Mailbox",
            Tab::Design => "Design",
        }
    }

    /// Unknown names fall back to the first tab.
    fn parse(name: Option<&str>) -> Self {
        name.and_then(|name| Tab::ALL.into_iter().find(|tab| tab.slug().eq_ignore_ascii_case(name)))
            .unwrap_or_default()
    }

    pub(crate) fn href(&self) -> String {
        format!("/admin?tab={}", self.slug())
    }
}

fn tab_links(active: Tab) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            let class = if *tab == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{}"{class}>{}</a>"#, tab.href(), tab.label())
        })
        .collect()
}

/// Wraps an admin-only page in the site layout.
pub(crate) async fn admin_page(
    store: &SiteStore,
    config: &Config,
    session: &Session,
    title: &str,
    content: String,
) -> AppResult<Response> {
    let flash = take_flash(session).await?;
    let design = store.design().await;
    Ok(layout::render(config, &design, Page::new(title, Nav::Admin, content).with_flash(flash)).into_response())
}

/// Flashes the outcome of a command and returns to `tab`.
pub(crate) async fn finish<T>(
    session: &Session,
    tab: Tab,
    action: &str,
    result: Result<T, StoreError>,
    success: impl FnOnce(T) -> String,
) -> AppResult<Redirect> {
    let flash = match result {
        Ok(value) => Flash::success(success(value)),
        Err(err) => {
            tracing::warn!(action, %err, retryable = err.is_retryable(), "admin command failed");
            Flash::from_store_error(action, &err)
        }
    };
    set_flash(session, flash).await?;
    Ok(Redirect::to(&tab.href()))
}

/// Flashes a form problem found before any command ran.
pub(crate) async fn reject(session: &Session, tab: Tab, text: impl Into<String>) -> AppResult<Redirect> {
    set_flash(session, Flash::error(text)).await?;
    Ok(Redirect::to(&tab.href()))
}

/// Turns an oversized upload into a notice; other body errors propagate.
pub(crate) async fn unreadable_form(session: &Session, tab: Tab, err: MultipartError) -> AppResult<Redirect> {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return reject(session, tab, "The file is too large.").await;
    }
    Err(err.into())
}

pub(crate) async fn stale_form(session: &Session, tab: Tab) -> AppResult<Redirect> {
    reject(session, tab, "The form expired. Please try again.").await
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PanelQuery {
    tab: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn panel(
    State(store): State<SiteStore>,
    State(config): State<Arc<Config>>,
    Query(PanelQuery { tab }): Query<PanelQuery>,
    gate: AdminGate,
    session: Session,
) -> AppResult<Response> {
    let csrf = csrf_token(&session).await?;

    let content = match gate {
        AdminGate::Unauthenticated => include_res!(str, "/pages/admin/login.html").replace("{csrf_token}", &csrf),
        AdminGate::Authenticated(admin) => {
            let tab = Tab::parse(tab.as_deref());
            let body = match tab {
                Tab::Content => content::panel(&store, &csrf).await,
                Tab::Photos => photos::panel(&store, &csrf).await,
                Tab::Mailbox => mailbox::panel(&store, &csrf).await,
                Tab::Design => design::panel(&store, &csrf).await,
            };
            include_res!(str, "/pages/admin/panel.html")
                .replace("{tabs}", &tab_links(tab))
                .replace("{csrf_token}", &csrf)
                .replace("{email}", &escape_html(&admin.email))
                .replace("{panel}", &body)
        }
    };

    admin_page(&store, &config, &session, "Admin", content).await
}

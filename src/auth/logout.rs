use axum::{
    debug_handler,
    extract::{Query, State},
    response::Redirect,
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    session::{verify_csrf, ADMIN},
    AppResult, AppState,
};

use super::{AdminSession, AuthService};

#[derive(Deserialize)]
pub struct LogoutQuery {
    pub return_url: Option<String>,
}

#[derive(Deserialize)]
pub struct LogoutForm {
    #[serde(default)]
    csrf_token: String,
}

/// Only same-site paths are followed.
fn local_path(url: Option<String>) -> String {
    url.filter(|u| u.starts_with('/') && !u.starts_with("//"))
        .unwrap_or_else(|| "/admin".to_owned())
}

#[debug_handler(state = AppState)]
pub async fn logout(
    State(auth): State<AuthService>,
    Query(LogoutQuery { return_url }): Query<LogoutQuery>,
    session: Session,
    Form(LogoutForm { csrf_token }): Form<LogoutForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &csrf_token).await? {
        return Ok(Redirect::to("/admin"));
    }
    if let Some(admin) = session.get::<AdminSession>(ADMIN).await? {
        auth.signed_out(&admin);
    }
    session.clear().await;
    Ok(Redirect::to(&local_path(return_url)))
}

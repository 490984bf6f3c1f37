use axum::{debug_handler, extract::State, response::Redirect, Form};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    session::{set_flash, verify_csrf, Flash, ADMIN},
    store::SiteStore,
    AppResult, AppState,
};

use super::{AuthError, AuthService};

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    csrf_token: String,
}

#[debug_handler(state = AppState)]
pub async fn login(
    State(auth): State<AuthService>,
    State(store): State<SiteStore>,
    session: Session,
    Form(LoginForm { email, password, csrf_token }): Form<LoginForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &csrf_token).await? {
        set_flash(&session, Flash::error("The form expired. Please try again.")).await?;
        return Ok(Redirect::to("/admin"));
    }

    let admin = match auth.sign_in(&email, &password).await {
        Ok(admin) => admin,
        Err(AuthError::InvalidCredentials) => {
            set_flash(&session, Flash::error("Invalid email or password.")).await?;
            return Ok(Redirect::to("/admin"));
        }
        Err(err) if err.is_retryable() => {
            tracing::warn!(%err, "admin sign-in unavailable");
            set_flash(&session, Flash::retry("Sign-in is unavailable right now. Please try again.")).await?;
            return Ok(Redirect::to("/admin"));
        }
        Err(err) => {
            tracing::warn!(%err, "admin sign-in refused");
            set_flash(&session, Flash::error("Sign-in failed. Check the account and try again.")).await?;
            return Ok(Redirect::to("/admin"));
        }
    };

    session.cycle_id().await?;
    session.insert(ADMIN, &admin).await?;

    let report = store.sweep_tombstones(&admin.id_token).await;
    let mut problems = Vec::new();
    if report.failed > 0 {
        problems.push(format!("{} interrupted deletion(s) could not be finished yet.", report.failed));
    }
    if let Err(err) = store.reload_messages(&admin.id_token).await {
        tracing::warn!(%err, "mailbox not loaded at sign-in");
        problems.push("The mailbox could not be loaded; sign in again to retry.".to_owned());
    }
    let flash = if problems.is_empty() {
        Flash::success("Signed in.")
    } else {
        Flash::retry(format!("Signed in. {}", problems.join(" ")))
    };
    set_flash(&session, flash).await?;

    Ok(Redirect::to("/admin"))
}

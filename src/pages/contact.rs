use std::sync::Arc;

use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tower_sessions::Session;

use crate::{
    config::Config,
    html::escape_html,
    include_res,
    model::{NewMessage, SiteDesign},
    session::{set_flash, take_flash, Flash},
    store::{SiteStore, StoreError},
    AppResult, AppState,
};

use super::layout::{self, Nav, Page};

fn contact_form(config: &Config, design: &SiteDesign, values: &NewMessage, flash: Option<Flash>) -> Response {
    let content = include_res!(str, "/pages/contact.html")
        .replace("{name}", &escape_html(&values.name))
        .replace("{email}", &escape_html(&values.email))
        .replace("{message}", &escape_html(&values.message));
    layout::render(config, design, Page::new("Contact", Nav::Contact, content).with_flash(flash)).into_response()
}

#[debug_handler(state = AppState)]
pub(crate) async fn contact_page(
    State(store): State<SiteStore>,
    State(config): State<Arc<Config>>,
    session: Session,
) -> AppResult<Response> {
    let flash = take_flash(&session).await?;
    Ok(contact_form(&config, &store.design().await, &NewMessage::default(), flash))
}

#[debug_handler(state = AppState)]
pub(crate) async fn send_message(
    State(store): State<SiteStore>,
    State(config): State<Arc<Config>>,
    session: Session,
    Form(submission): Form<NewMessage>,
) -> AppResult<Response> {
    match store.add_message(submission.clone()).await {
        Ok(_) => {
            set_flash(&session, Flash::success("Thank you! Your message has been sent.")).await?;
            Ok(Redirect::to("/contact").into_response())
        }
        Err(err) => {
            let (status, flash) = match &err {
                StoreError::Invalid(reason) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, Flash::error(format!("Please check the form: {reason}.")))
                }
                err if err.is_retryable() => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Flash::retry("Sorry, something went wrong. Please try again."),
                ),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    Flash::error("Sorry, your message could not be sent."),
                ),
            };
            tracing::warn!(%err, "contact message not sent");
            let page = contact_form(&config, &store.design().await, &submission, Some(flash));
            Ok((status, page).into_response())
        }
    }
}

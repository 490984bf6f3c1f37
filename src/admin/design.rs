use axum::{
    debug_handler,
    extract::{Multipart, State},
    response::Redirect,
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    auth::RequireAdmin,
    html::escape_html,
    include_res,
    model::{DesignUpdate, SiteColor},
    session::verify_csrf,
    store::SiteStore,
    AppResult, AppState,
};

use super::{
    finish,
    forms::{image_data_url, MultipartForm, TokenForm},
    reject, stale_form, unreadable_form, Tab,
};

pub(crate) async fn panel(store: &SiteStore, csrf: &str) -> String {
    let design = store.design().await;
    let logo = match &design.logo {
        Some(logo) => include_res!(str, "/pages/admin/logo.html")
            .replace("{csrf_token}", csrf)
            .replace("{logo}", &escape_html(logo)),
        None => r#"<p class="empty">No logo yet; the site name is shown instead.</p>"#.to_owned(),
    };

    include_res!(str, "/pages/admin/design.html")
        .replace("{csrf_token}", csrf)
        .replace("{site_bg_color}", design.site_bg_color.as_str())
        .replace("{logo}", &logo)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ColorForm {
    #[serde(default)]
    site_bg_color: String,
    #[serde(default)]
    csrf_token: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn save_color(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(ColorForm { site_bg_color, csrf_token }): Form<ColorForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &csrf_token).await? {
        return stale_form(&session, Tab::Design).await;
    }
    let color = match site_bg_color.parse::<SiteColor>() {
        Ok(color) => color,
        Err(problem) => return reject(&session, Tab::Design, format!("Design: {problem}.")).await,
    };

    let update = DesignUpdate { site_bg_color: Some(color), logo: None };
    let result = store.update_design(update, &admin.id_token).await;
    finish(&session, Tab::Design, "Design", result, |design| {
        format!("Background colour set to {}.", design.site_bg_color)
    })
    .await
}

#[debug_handler(state = AppState)]
pub(crate) async fn upload_logo(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let mut form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(err) => return unreadable_form(&session, Tab::Design, err).await,
    };
    if !form.verify_csrf(&session).await? {
        return stale_form(&session, Tab::Design).await;
    }
    let logo = match image_data_url(form.take_file("logo")) {
        Ok(Some(logo)) => logo,
        Ok(None) => return reject(&session, Tab::Design, "Logo: please select a file.").await,
        Err(problem) => return reject(&session, Tab::Design, format!("Logo: {problem}.")).await,
    };

    let update = DesignUpdate { site_bg_color: None, logo: Some(Some(logo)) };
    let result = store.update_design(update, &admin.id_token).await;
    finish(&session, Tab::Design, "Logo", result, |_| "Logo updated.".to_owned()).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove_logo(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(TokenForm { csrf_token }): Form<TokenForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &csrf_token).await? {
        return stale_form(&session, Tab::Design).await;
    }
    let update = DesignUpdate { site_bg_color: None, logo: Some(None) };
    let result = store.update_design(update, &admin.id_token).await;
    finish(&session, Tab::Design, "Logo", result, |_| "Logo removed.".to_owned()).await
}

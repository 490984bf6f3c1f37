use axum::{
    debug_handler,
    extract::{Multipart, State},
    response::Redirect,
};
use tower_sessions::Session;

use crate::{
    auth::RequireAdmin,
    html::escape_html,
    include_res,
    model::{split_paragraphs, AboutUpdate, HeroUpdate},
    store::SiteStore,
    AppResult, AppState,
};

use super::{
    finish,
    forms::{image_data_url, MultipartForm},
    reject, stale_form, unreadable_form, Tab,
};

pub(crate) async fn panel(store: &SiteStore, csrf: &str) -> String {
    let hero = store.hero().await;
    let about = store.about().await;

    include_res!(str, "/pages/admin/content.html")
        .replace("{csrf_token}", csrf)
        .replace("{hero_src}", &escape_html(&hero.src))
        .replace("{hero_title}", &escape_html(&hero.title))
        .replace("{hero_subtitle}", &escape_html(&hero.subtitle))
        .replace("{headshot_src}", &escape_html(&about.headshot_src))
        .replace("{about_title}", &escape_html(&about.title))
        .replace("{about_paragraphs}", &escape_html(&about.paragraphs.join("\n\n")))
}

#[debug_handler(state = AppState)]
pub(crate) async fn save_hero(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let mut form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(err) => return unreadable_form(&session, Tab::Content, err).await,
    };
    if !form.verify_csrf(&session).await? {
        return stale_form(&session, Tab::Content).await;
    }
    let src = match image_data_url(form.take_file("hero_image")) {
        Ok(src) => src,
        Err(problem) => return reject(&session, Tab::Content, format!("Hero: {problem}.")).await,
    };

    let update = HeroUpdate {
        src,
        title: Some(form.text("hero_title").trim().to_owned()),
        subtitle: Some(form.text("hero_subtitle").trim().to_owned()),
    };
    let result = store.update_hero(update, &admin.id_token).await;
    finish(&session, Tab::Content, "Hero", result, |_| "Hero section saved.".to_owned()).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn save_about(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let mut form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(err) => return unreadable_form(&session, Tab::Content, err).await,
    };
    if !form.verify_csrf(&session).await? {
        return stale_form(&session, Tab::Content).await;
    }
    let headshot_src = match image_data_url(form.take_file("headshot")) {
        Ok(src) => src,
        Err(problem) => return reject(&session, Tab::Content, format!("About page: {problem}.")).await,
    };

    let update = AboutUpdate {
        title: Some(form.text("about_title").trim().to_owned()),
        paragraphs: Some(split_paragraphs(form.text("about_paragraphs"))),
        headshot_src,
    };
    let result = store.update_about(update, &admin.id_token).await;
    finish(&session, Tab::Content, "About page", result, |_| "About page saved.".to_owned()).await
}

use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    auth::RequireAdmin,
    config::Config,
    gallery,
    html::{escape_html, options},
    include_res,
    model::{Category, NewPhoto, Photo, PhotoEdit},
    session::{csrf_token, set_flash, verify_csrf, Flash},
    store::SiteStore,
    AppResult, AppState,
};

use super::{admin_page, finish, forms::MultipartForm, forms::TokenForm, reject, stale_form, unreadable_form, Tab};

fn category_options(selected: Category) -> String {
    options(Category::ALL.iter().map(Category::as_str), selected.as_str())
}

fn photo_cards(photos: &[&Photo], csrf: &str, empty: &str) -> String {
    if photos.is_empty() {
        return format!(r#"<p class="empty">{empty}</p>"#);
    }
    let cards: String = photos
        .iter()
        .map(|photo| {
            let archive_label = if photo.is_archived { "Publish" } else { "Archive" };
            include_res!(str, "/pages/admin/photo_card.html")
                .replace("{csrf_token}", csrf)
                .replace("{archive_label}", archive_label)
                .replace("{id}", &escape_html(&photo.id))
                .replace("{src}", &escape_html(&photo.src))
                .replace("{category}", photo.category.as_str())
                .replace("{title}", &escape_html(&photo.title))
        })
        .collect();
    format!(r#"<div class="photo-admin">{cards}</div>"#)
}

pub(crate) async fn panel(store: &SiteStore, csrf: &str) -> String {
    let photos = store.photos().await;
    let (active, archived) = gallery::partition(&photos);
    let pending = match gallery::pending_deletions(&photos) {
        0 => String::new(),
        count => include_res!(str, "/pages/admin/pending.html")
            .replace("{csrf_token}", csrf)
            .replace("{count}", &count.to_string()),
    };

    include_res!(str, "/pages/admin/photos.html")
        .replace("{csrf_token}", csrf)
        .replace("{category_options}", &category_options(Category::Portraits))
        .replace("{pending}", &pending)
        .replace("{active_count}", &active.len().to_string())
        .replace("{archived_count}", &archived.len().to_string())
        .replace("{active}", &photo_cards(&active, csrf, "No active photos."))
        .replace("{archived}", &photo_cards(&archived, csrf, "No archived photos."))
}

#[debug_handler(state = AppState)]
pub(crate) async fn upload(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let mut form = match MultipartForm::read(multipart).await {
        Ok(form) => form,
        Err(err) => return unreadable_form(&session, Tab::Photos, err).await,
    };
    if !form.verify_csrf(&session).await? {
        return stale_form(&session, Tab::Photos).await;
    }
    let (Some(image), Some(title)) = (form.take_file("photo"), form.optional("title")) else {
        return reject(&session, Tab::Photos, "Upload: please select a file and provide a title.").await;
    };
    let category = match form.text("category").parse::<Category>() {
        Ok(category) => category,
        Err(problem) => return reject(&session, Tab::Photos, format!("Upload: {problem}.")).await,
    };

    let new = NewPhoto { title, category, caption: form.optional("caption") };
    let result = store.add_photo(new, image, &admin.id_token).await;
    finish(&session, Tab::Photos, "Upload", result, |photo| {
        format!("Uploaded \"{}\".", photo.title)
    })
    .await
}

fn missing_photo() -> Flash {
    Flash::error("That photo no longer exists.")
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_page(
    State(store): State<SiteStore>,
    State(config): State<Arc<Config>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    session: Session,
) -> AppResult<Response> {
    let Some(photo) = store.photo(&id).await.filter(|p| !p.pending_delete) else {
        set_flash(&session, missing_photo()).await?;
        return Ok(Redirect::to(&Tab::Photos.href()).into_response());
    };
    let csrf = csrf_token(&session).await?;

    let content = include_res!(str, "/pages/admin/edit_photo.html")
        .replace("{csrf_token}", &csrf)
        .replace("{category_options}", &category_options(photo.category))
        .replace("{id}", &escape_html(&photo.id))
        .replace("{src}", &escape_html(&photo.src))
        .replace("{caption}", &escape_html(photo.caption.as_deref().unwrap_or("")))
        .replace("{title}", &escape_html(&photo.title));
    admin_page(&store, &config, &session, "Edit Photo", content).await
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    csrf_token: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn save_edit(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    session: Session,
    Form(form): Form<EditForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &form.csrf_token).await? {
        return stale_form(&session, Tab::Photos).await;
    }
    let category = match form.category.parse::<Category>() {
        Ok(category) => category,
        Err(problem) => return reject(&session, Tab::Photos, format!("Edit: {problem}.")).await,
    };

    let edit = PhotoEdit { title: form.title, category, caption: Some(form.caption) };
    let result = store.edit_photo(&id, edit, &admin.id_token).await;
    finish(&session, Tab::Photos, "Edit", result, |photo| format!("Saved \"{}\".", photo.title)).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn toggle_archive(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    session: Session,
    Form(TokenForm { csrf_token }): Form<TokenForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &csrf_token).await? {
        return stale_form(&session, Tab::Photos).await;
    }
    let result = store.toggle_archive(&id, &admin.id_token).await;
    finish(&session, Tab::Photos, "Archive", result, |photo| {
        let state = if photo.is_archived { "archived" } else { "published" };
        format!("\"{}\" {state}.", photo.title)
    })
    .await
}

#[debug_handler(state = AppState)]
pub(crate) async fn confirm_delete(
    State(store): State<SiteStore>,
    State(config): State<Arc<Config>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    session: Session,
) -> AppResult<Response> {
    let Some(photo) = store.photo(&id).await.filter(|p| !p.pending_delete) else {
        set_flash(&session, missing_photo()).await?;
        return Ok(Redirect::to(&Tab::Photos.href()).into_response());
    };
    let csrf = csrf_token(&session).await?;

    let content = include_res!(str, "/pages/admin/confirm_delete.html")
        .replace("{csrf_token}", &csrf)
        .replace("{id}", &escape_html(&photo.id))
        .replace("{src}", &escape_html(&photo.src))
        .replace("{title}", &escape_html(&photo.title));
    admin_page(&store, &config, &session, "Delete Photo", content).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    session: Session,
    Form(TokenForm { csrf_token }): Form<TokenForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &csrf_token).await? {
        return stale_form(&session, Tab::Photos).await;
    }
    let title = store.photo(&id).await.map(|p| p.title).unwrap_or_default();
    let result = store.delete_photo(&id, &admin.id_token).await;
    finish(&session, Tab::Photos, "Delete", result, |()| format!("Deleted \"{title}\".")).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn sweep(
    State(store): State<SiteStore>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(TokenForm { csrf_token }): Form<TokenForm>,
) -> AppResult<Redirect> {
    if !verify_csrf(&session, &csrf_token).await? {
        return stale_form(&session, Tab::Photos).await;
    }
    let report = store.sweep_tombstones(&admin.id_token).await;
    let flash = if report.failed == 0 {
        Flash::success(format!("Finished {} pending deletion(s).", report.removed))
    } else {
        Flash::retry(format!(
            "{} deletion(s) could not be finished. Please try again.",
            report.failed
        ))
    };
    set_flash(&session, flash).await?;
    Ok(Redirect::to(&Tab::Photos.href()))
}

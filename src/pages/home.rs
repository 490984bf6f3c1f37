use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::{
    config::Config,
    gallery,
    html::escape_html,
    include_res,
    session::take_flash,
    store::SiteStore,
    AppResult, AppState,
};

use super::{
    layout::{self, Nav, Page},
    respond,
    viewer::{photo_grid, Viewer, ViewerQuery},
};

fn link(photo: Option<&str>) -> String {
    match photo {
        Some(id) => format!("/?photo={id}"),
        None => "/".to_owned(),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn home(
    State(store): State<SiteStore>,
    State(config): State<Arc<Config>>,
    Query(ViewerQuery { photo, key }): Query<ViewerQuery>,
    session: Session,
) -> AppResult<Response> {
    let photos = store.photos().await;
    let hero = store.hero().await;
    let design = store.design().await;
    let flash = take_flash(&session).await?;

    let featured = gallery::featured(&photos);
    let grid = photo_grid(&featured, &link, "No featured photos yet. Upload some in the admin panel!");
    let viewer = Viewer::resolve(
        photo.as_deref(),
        key.as_deref(),
        featured.into_iter().cloned().collect(),
        &link,
    );

    let content = include_res!(str, "/pages/home.html")
        .replace("{hero_src}", &escape_html(&hero.src))
        .replace("{hero_title}", &escape_html(&hero.title))
        .replace("{hero_subtitle}", &escape_html(&hero.subtitle))
        .replace("{featured}", &grid);

    Ok(respond(viewer, |overlay| {
        layout::render(
            &config,
            &design,
            Page::new("Home", Nav::Home, content).with_flash(flash).with_lightbox(overlay),
        )
        .into_response()
    }))
}

use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::{
    config::Config,
    html::{escape_html, paragraphs_to_html},
    include_res,
    model::{AboutContent, Category, Photo},
    session::take_flash,
    store::SiteStore,
    AppResult, AppState,
};

use super::{
    layout::{self, Nav, Page},
    respond,
    viewer::{Viewer, ViewerQuery},
};

pub(crate) const HEADSHOT_ID: &str = "portrait-headshot";

/// The headshot, shaped as a photo so the lightbox can show it.
fn headshot(about: &AboutContent, site_name: &str) -> Photo {
    Photo {
        id: HEADSHOT_ID.to_owned(),
        src: about.headshot_src.clone(),
        title: site_name.to_owned(),
        category: Category::Portraits,
        storage_path: String::new(),
        caption: Some("A portrait of the photographer.".to_owned()),
        is_archived: false,
        pending_delete: false,
    }
}

fn link(photo: Option<&str>) -> String {
    match photo {
        Some(id) => format!("/about?photo={id}"),
        None => "/about".to_owned(),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn about(
    State(store): State<SiteStore>,
    State(config): State<Arc<Config>>,
    Query(ViewerQuery { photo, key }): Query<ViewerQuery>,
    session: Session,
) -> AppResult<Response> {
    let about = store.about().await;
    let design = store.design().await;
    let flash = take_flash(&session).await?;

    let viewer = Viewer::resolve(
        photo.as_deref(),
        key.as_deref(),
        vec![headshot(&about, &config.site_name)],
        &link,
    );

    let content = include_res!(str, "/pages/about.html")
        .replace("{headshot_href}", &link(Some(HEADSHOT_ID)))
        .replace("{headshot_src}", &escape_html(&about.headshot_src))
        .replace("{site_name}", &escape_html(&config.site_name))
        .replace("{about_title}", &escape_html(&about.title))
        .replace("{paragraphs}", &paragraphs_to_html(&about.paragraphs));

    Ok(respond(viewer, |overlay| {
        layout::render(
            &config,
            &design,
            Page::new(about.title.clone(), Nav::About, content).with_flash(flash).with_lightbox(overlay),
        )
        .into_response()
    }))
}

use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    config::Config,
    gallery::CategoryFilter,
    include_res,
    session::take_flash,
    store::SiteStore,
    AppResult, AppState,
};

use super::{
    layout::{self, Nav, Page},
    respond,
    viewer::{photo_grid, Viewer},
};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PortfolioQuery {
    category: Option<String>,
    photo: Option<String>,
    key: Option<String>,
}

fn filter_href(filter: CategoryFilter) -> String {
    match filter {
        CategoryFilter::All => "/portfolio".to_owned(),
        CategoryFilter::Only(category) => format!("/portfolio?category={category}"),
    }
}

fn photo_href(filter: CategoryFilter, photo: Option<&str>) -> String {
    match (filter, photo) {
        (filter, None) => filter_href(filter),
        (CategoryFilter::All, Some(id)) => format!("/portfolio?photo={id}"),
        (CategoryFilter::Only(category), Some(id)) => format!("/portfolio?category={category}&photo={id}"),
    }
}

fn filter_buttons(active: CategoryFilter) -> String {
    CategoryFilter::choices()
        .map(|filter| {
            let class = if filter == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{}"{class}>{}</a>"#, filter_href(filter), filter.label())
        })
        .collect()
}

#[debug_handler(state = AppState)]
pub(crate) async fn portfolio(
    State(store): State<SiteStore>,
    State(config): State<Arc<Config>>,
    Query(PortfolioQuery { category, photo, key }): Query<PortfolioQuery>,
    session: Session,
) -> AppResult<Response> {
    let filter = category
        .and_then(|c| c.parse::<CategoryFilter>().ok())
        .unwrap_or_default();
    let photos = store.photos().await;
    let design = store.design().await;
    let flash = take_flash(&session).await?;

    let link = move |photo: Option<&str>| photo_href(filter, photo);
    let shown = filter.apply(&photos);
    let grid = photo_grid(&shown, &link, "No photos in this category yet.");
    let viewer = Viewer::resolve(
        photo.as_deref(),
        key.as_deref(),
        shown.into_iter().cloned().collect(),
        &link,
    );

    let content = include_res!(str, "/pages/portfolio.html")
        .replace("{filters}", &filter_buttons(filter))
        .replace("{grid}", &grid);

    Ok(respond(viewer, |overlay| {
        layout::render(
            &config,
            &design,
            Page::new("Portfolio", Nav::Portfolio, content).with_flash(flash).with_lightbox(overlay),
        )
        .into_response()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    #[test]
    fn links_keep_the_active_filter() {
        assert_eq!(photo_href(CategoryFilter::All, Some("7")), "/portfolio?photo=7");
        assert_eq!(
            photo_href(CategoryFilter::Only(Category::Events), Some("7")),
            "/portfolio?category=Events&photo=7"
        );
        assert_eq!(photo_href(CategoryFilter::Only(Category::Events), None), "/portfolio?category=Events");
    }

    #[test]
    fn exactly_one_filter_is_active() {
        let html = filter_buttons(CategoryFilter::Only(Category::Landscapes));
        assert_eq!(html.matches(r#"class="active""#).count(), 1);
        assert!(html.contains(r#"<a href="/portfolio?category=Landscapes" class="active">Landscapes</a>"#));
        assert!(html.contains(r#"<a href="/portfolio">All</a>"#));
    }
}

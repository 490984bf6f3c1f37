//! Photo grids and the lightbox overlay. Which photo is open lives in the
//! page URL (`?photo=`); a `key` parameter applies a keyboard action and
//! redirects to the resulting URL.

use serde::Deserialize;

use crate::{
    html::escape_html,
    include_res,
    lightbox::{Key, Lightbox},
    model::Photo,
};

#[derive(Debug, Default, Deserialize)]
pub struct ViewerQuery {
    pub photo: Option<String>,
    pub key: Option<String>,
}

pub enum Viewer {
    Closed,
    Open(String),
    /// Follow a keyboard action to the URL of the new state.
    Redirect(String),
}

impl Viewer {
    pub fn resolve(
        photo: Option<&str>,
        key: Option<&str>,
        photos: Vec<Photo>,
        link: &dyn Fn(Option<&str>) -> String,
    ) -> Self {
        let Some(id) = photo else {
            return Viewer::Closed;
        };
        let mut lightbox = Lightbox::open_by_id(id, photos);
        if let Some(key) = key {
            lightbox.handle_key(Key::from_dom(key));
            return Viewer::Redirect(link(lightbox.current().map(|p| p.id.as_str())));
        }
        match overlay(&lightbox, link) {
            Some(html) => Viewer::Open(html),
            None => Viewer::Closed,
        }
    }
}

pub fn overlay(lightbox: &Lightbox, link: &dyn Fn(Option<&str>) -> String) -> Option<String> {
    let current = lightbox.current()?;
    let prev = lightbox.peek(-1)?;
    let next = lightbox.peek(1)?;

    let caption = match &current.caption {
        Some(caption) => format!(
            "<figcaption><h3>{}</h3><p>{}</p></figcaption>",
            escape_html(&current.title),
            escape_html(caption)
        ),
        None => String::new(),
    };

    Some(
        include_res!(str, "/pages/lightbox.html")
            .replace("{close_href}", &escape_html(&link(None)))
            .replace("{prev_href}", &escape_html(&link(Some(&prev.id))))
            .replace("{next_href}", &escape_html(&link(Some(&next.id))))
            .replace("{src}", &escape_html(&current.src))
            .replace("{title}", &escape_html(&current.title))
            .replace("{caption}", &caption),
    )
}

pub fn photo_grid(photos: &[&Photo], link: &dyn Fn(Option<&str>) -> String, empty: &str) -> String {
    if photos.is_empty() {
        return format!(r#"<p class="empty">{}</p>"#, escape_html(empty));
    }
    let tiles: String = photos
        .iter()
        .map(|photo| {
            include_res!(str, "/pages/photo_tile.html")
                .replace("{href}", &escape_html(&link(Some(&photo.id))))
                .replace("{src}", &escape_html(&photo.src))
                .replace("{title}", &escape_html(&photo.title))
        })
        .collect();
    format!(r#"<div class="grid">{tiles}</div>"#)
}

use axum::response::Html;
use chrono::{Datelike, Utc};

use crate::{
    config::Config,
    html::{escape_html, flash},
    include_res,
    model::SiteDesign,
    session::Flash,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Home,
    Portfolio,
    About,
    Contact,
    Admin,
}

const NAV_LINKS: [(Nav, &str, &str); 4] = [
    (Nav::Home, "Home", "/"),
    (Nav::Portfolio, "Portfolio", "/portfolio"),
    (Nav::About, "About", "/about"),
    (Nav::Contact, "Contact", "/contact"),
];

fn nav_link(label: &str, href: &str, active: bool) -> String {
    let class = if active { r#" class="active" aria-current="page""# } else { "" };
    format!(r#"<a href="{href}"{class}>{label}</a>"#)
}

/// Everything that varies between pages of the public shell.
pub struct Page {
    pub title: String,
    pub nav: Nav,
    pub content: String,
    pub flash: Option<Flash>,
    pub lightbox: Option<String>,
}

impl Page {
    pub fn new(title: impl Into<String>, nav: Nav, content: String) -> Self {
        Self {
            title: title.into(),
            nav,
            content,
            flash: None,
            lightbox: None,
        }
    }

    pub fn with_flash(mut self, flash: Option<Flash>) -> Self {
        self.flash = flash;
        self
    }

    pub fn with_lightbox(mut self, lightbox: Option<String>) -> Self {
        self.lightbox = lightbox;
        self
    }
}

pub fn render(config: &Config, design: &SiteDesign, page: Page) -> Html<String> {
    let site_name = escape_html(&config.site_name);
    let brand = match &design.logo {
        Some(logo) => format!(r#"<img src="{}" alt="{site_name} Photography Logo">"#, escape_html(logo)),
        None => site_name.clone(),
    };
    let nav: String = NAV_LINKS
        .iter()
        .map(|(item, label, href)| nav_link(label, href, *item == page.nav))
        .collect();
    let body_class = if page.lightbox.is_some() { "lightbox-open" } else { "" };

    Html(
        include_res!(str, "/pages/layout.html")
            .replace("{title}", &escape_html(&page.title))
            .replace("{brand}", &brand)
            .replace("{site_name}", &site_name)
            .replace("{nav}", &nav)
            .replace("{admin_link}", &nav_link("Admin", "/admin", page.nav == Nav::Admin))
            .replace("{body_class}", body_class)
            .replace("{bg_color}", design.site_bg_color.as_str())
            .replace("{contact_email}", &escape_html(&config.contact_email))
            .replace("{instagram_url}", &escape_html(&config.instagram_url))
            .replace("{year}", &Utc::now().year().to_string())
            .replace("{flash}", &flash(page.flash.as_ref()))
            .replace("{lightbox}", page.lightbox.as_deref().unwrap_or(""))
            .replace("{content}", &page.content),
    )
}

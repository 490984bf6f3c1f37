//! Small helpers for filling the `res/pages` templates.

use pulldown_cmark::{Event, Options, Parser};

use crate::session::Flash;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            // keep template placeholders out of user text
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders one about-page paragraph as inline markdown. Raw HTML in the
/// source is shown as text.
pub fn paragraph_to_html(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output.replace('{', "&#123;").replace('}', "&#125;")
}

pub fn paragraphs_to_html(paragraphs: &[String]) -> String {
    paragraphs.iter().map(|p| paragraph_to_html(p)).collect()
}

pub fn flash(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => format!(
            r#"<p class="{}" role="status">{}</p>"#,
            flash.kind.css_class(),
            escape_html(&flash.text)
        ),
        None => String::new(),
    }
}

/// `<option>` list with `selected` on the matching value.
pub fn options<'a>(values: impl IntoIterator<Item = &'a str>, selected: &str) -> String {
    values
        .into_iter()
        .map(|value| {
            let value = escape_html(value);
            let mark = if value == escape_html(selected) { " selected" } else { "" };
            format!(r#"<option value="{value}"{mark}>{value}</option>"#)
        })
        .collect()
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const SETTINGS: &str = "settings";
pub const HERO_DOC: &str = "heroData";
pub const ABOUT_DOC: &str = "aboutContent";
pub const DESIGN_DOC: &str = "siteDesign";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroContent {
    pub src: String,
    pub title: String,
    pub subtitle: String,
}

impl Default for HeroContent {
    fn default() -> Self {
        Self {
            src: "https://picsum.photos/id/1015/1800/1000".to_owned(),
            title: "Passionfruit Reverie".to_owned(),
            subtitle: "Timeless photography that tells your story.".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeroUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AboutContent {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub headshot_src: String,
}

impl Default for AboutContent {
    fn default() -> Self {
        Self {
            title: "About Alicia".to_owned(),
            paragraphs: Vec::new(),
            headshot_src: "https://picsum.photos/id/1027/600/800".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraphs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headshot_src: Option<String>,
}

/// Splits editor text into paragraphs on blank lines, dropping empty ones.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    // a blank line, even one holding only spaces, ends a paragraph
    for line in text.lines() {
        if line.trim().is_empty() {
            push_paragraph(&mut paragraphs, &mut current);
        } else {
            current.push(line);
        }
    }
    push_paragraph(&mut paragraphs, &mut current);
    paragraphs
}

fn push_paragraph(paragraphs: &mut Vec<String>, lines: &mut Vec<&str>) {
    let paragraph = lines.join("\n");
    let paragraph = paragraph.trim();
    if !paragraph.is_empty() {
        paragraphs.push(paragraph.to_owned());
    }
    lines.clear();
}

/// A `#rgb` or `#rrggbb` colour, stored as lowercase `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteColor(String);

impl SiteColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SiteColor {
    fn default() -> Self {
        Self("#d1fffc".to_owned())
    }
}

impl FromStr for SiteColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("colour {s:?} must start with #"))?;
        if !matches!(hex.len(), 3 | 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("colour {s:?} is not a hex colour"));
        }
        let hex = hex.to_ascii_lowercase();
        // `<input type="color">` only accepts #rrggbb
        let hex = if hex.len() == 3 { hex.chars().flat_map(|c| [c, c]).collect() } else { hex };
        Ok(Self(format!("#{hex}")))
    }
}

impl TryFrom<String> for SiteColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SiteColor> for String {
    fn from(value: SiteColor) -> Self {
        value.0
    }
}

impl fmt::Display for SiteColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteDesign {
    pub site_bg_color: SiteColor,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_bg_color: Option<SiteColor>,
    /// `Some(None)` removes the logo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Option<String>>,
}

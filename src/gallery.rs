use std::{fmt, str::FromStr};

use crate::model::{Category, Photo};

pub const FEATURED_COUNT: usize = 6;

/// Photos visible on the public site.
pub fn active(photos: &[Photo]) -> Vec<&Photo> {
    photos.iter().filter(|p| p.is_active()).collect()
}

/// Splits into (active, archived). Photos pending deletion are in neither.
pub fn partition(photos: &[Photo]) -> (Vec<&Photo>, Vec<&Photo>) {
    photos
        .iter()
        .filter(|p| !p.pending_delete)
        .partition(|p| !p.is_archived)
}

pub fn pending_deletions(photos: &[Photo]) -> usize {
    photos.iter().filter(|p| p.pending_delete).count()
}

pub fn featured(photos: &[Photo]) -> Vec<&Photo> {
    photos.iter().filter(|p| p.is_active()).take(FEATURED_COUNT).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn choices() -> impl Iterator<Item = CategoryFilter> {
        std::iter::once(CategoryFilter::All).chain(Category::ALL.into_iter().map(CategoryFilter::Only))
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(category) => category.as_str(),
        }
    }

    pub fn matches(&self, photo: &Photo) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => photo.category == *category,
        }
    }

    /// Active photos passing the filter, in collection order.
    pub fn apply<'a>(&self, photos: &'a [Photo]) -> Vec<&'a Photo> {
        photos
            .iter()
            .filter(|p| p.is_active() && self.matches(p))
            .collect()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

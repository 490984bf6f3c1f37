use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Portraits,
    Landscapes,
    Events,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Portraits, Category::Landscapes, Category::Events];

    pub fn as_str(&self) -> &'static str {
        use Category::*;
        match self {
            Portraits => "Portraits",
            Landscapes => "Landscapes",
            Events => "Events",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category {s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub src: String,
    pub title: String,
    pub category: Category,
    pub storage_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    /// Set while the backing blob and record are being removed. A
    /// tombstoned photo is hidden everywhere.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending_delete: bool,
}

impl Photo {
    pub fn is_active(&self) -> bool {
        !self.is_archived && !self.pending_delete
    }

    pub fn storage_path_for(id: &str) -> String {
        format!("photos/{id}")
    }
}

/// Field values for a photo that is about to be uploaded.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub title: String,
    pub category: Category,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoEdit {
    pub title: String,
    pub category: Category,
    pub caption: Option<String>,
}

mod message;
mod photo;
mod settings;

pub use message::{Message, NewMessage};
pub use photo::{Category, NewPhoto, Photo, PhotoEdit};
pub use settings::{
    split_paragraphs, AboutContent, AboutUpdate, DesignUpdate, HeroContent, HeroUpdate, SiteColor, SiteDesign,
    ABOUT_DOC, DESIGN_DOC, HERO_DOC, SETTINGS,
};

pub const PHOTOS: &str = "photos";
pub const MESSAGES: &str = "messages";

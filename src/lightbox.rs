//! Full-screen viewer over a list of photos.

use crate::model::Photo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` name.
    pub fn from_dom(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Lightbox {
    #[default]
    Closed,
    Open {
        current: Photo,
        photos: Vec<Photo>,
    },
}

impl Lightbox {
    pub fn open(current: Photo, photos: Vec<Photo>) -> Self {
        Lightbox::Open { current, photos }
    }

    /// Opens on the photo with `id` if the list holds one.
    pub fn open_by_id(id: &str, photos: Vec<Photo>) -> Self {
        match photos.iter().find(|p| p.id == id).cloned() {
            Some(current) => Lightbox::open(current, photos),
            None => Lightbox::Closed,
        }
    }

    pub fn close(&mut self) {
        *self = Lightbox::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Lightbox::Open { .. })
    }

    pub fn current(&self) -> Option<&Photo> {
        match self {
            Lightbox::Closed => None,
            Lightbox::Open { current, .. } => Some(current),
        }
    }

    pub fn next(&mut self) {
        self.step(1);
    }

    pub fn prev(&mut self) {
        self.step(-1);
    }

    /// Keys only act while open.
    pub fn handle_key(&mut self, key: Key) {
        if !self.is_open() {
            return;
        }
        match key {
            Key::Escape => self.close(),
            Key::ArrowLeft => self.prev(),
            Key::ArrowRight => self.next(),
            Key::Other => {}
        }
    }

    /// The photo `delta` positions away, wrapping at both ends.
    pub fn peek(&self, delta: isize) -> Option<&Photo> {
        let Lightbox::Open { current, photos } = self else {
            return None;
        };
        if photos.len() <= 1 {
            return Some(current);
        }
        let Some(position) = photos.iter().position(|p| p.id == current.id) else {
            return Some(current);
        };
        let len = photos.len() as isize;
        let target = (position as isize + delta).rem_euclid(len) as usize;
        photos.get(target)
    }

    fn step(&mut self, delta: isize) {
        let Some(target) = self.peek(delta).cloned() else {
            return;
        };
        if let Lightbox::Open { current, .. } = self {
            *current = target;
        }
    }
}

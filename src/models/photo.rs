use serde::{Deserialize, Serialize};

use super::record::Record;

/// A dish photo as submitted by anyone looking at today's menu.
#[derive(Debug, Clone, Default)]
pub struct DishPhotoForm {
    /// Menu section label, e.g. "Gerecht 1" or "Soep".
    pub dish_section: String,
    pub uploader_name: String,
    pub comment: String,
    /// 0 means no stars picked yet.
    pub rating: i16,
    pub photo: Option<Vec<u8>>,
}

impl DishPhotoForm {
    pub fn is_valid(&self) -> bool {
        (1..=5).contains(&self.rating)
            && !self.uploader_name.trim().is_empty()
            && self.photo.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// Query params for GET /dish-photos.
#[derive(Debug, Deserialize)]
pub struct DishPhotoQuery {
    /// Business day "YYYY-MM-DD" (defaults to today).
    pub date: Option<String>,
}

/// One menu section of a past day with the photos posted under its label.
#[derive(Debug, Clone, Serialize)]
pub struct SectionWithPhotos {
    pub label: Option<String>,
    pub body: String,
    pub photos: Vec<Record>,
}

/// A day in the menu history.
#[derive(Debug, Clone, Serialize)]
pub struct MenuDay {
    #[serde(flatten)]
    pub record: Record,
    pub sections: Vec<SectionWithPhotos>,
}

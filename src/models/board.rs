use serde::{Deserialize, Serialize};

use super::{photo::MenuDay, record::Record};

/// Everything the board shows for the current business day.
#[derive(Debug, Clone, Serialize)]
pub struct BoardToday {
    pub date_str: String,
    pub formatted_date: String,
    pub menu: Option<MenuDay>,
    pub advice: Option<Record>,
    pub status: Option<Record>,
    pub dish_photos: Vec<Record>,
}

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub kind: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub unlocked: bool,
}

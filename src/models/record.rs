use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::menu;

/// The record tables of the board. Each one is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Menu,
    Advice,
    Status,
    DishPhoto,
    /// Superseded by the `burritos` flag of [`StatusFlags`].
    Burrito,
}

impl EntryKind {
    pub const ALL: [EntryKind; 5] = [
        EntryKind::Menu,
        EntryKind::Advice,
        EntryKind::Status,
        EntryKind::DishPhoto,
        EntryKind::Burrito,
    ];

    pub fn table(self) -> &'static str {
        match self {
            EntryKind::Menu => "menus",
            EntryKind::Advice => "advices",
            EntryKind::Status => "daily_status",
            EntryKind::DishPhoto => "dish_photos",
            EntryKind::Burrito => "burritos",
        }
    }

    /// Redis channel carrying insert notifications for this table.
    pub fn channel(self) -> String {
        format!("board:{}", self.table())
    }

    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.table() == table)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EntryKind::Menu => "menu",
                EntryKind::Advice => "advice",
                EntryKind::Status => "status",
                EntryKind::DishPhoto => "dish_photo",
                EntryKind::Burrito => "burrito",
            }
        )
    }
}

impl std::str::FromStr for EntryKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menu" => Ok(EntryKind::Menu),
            "advice" => Ok(EntryKind::Advice),
            "status" | "other" => Ok(EntryKind::Status),
            "dish_photo" => Ok(EntryKind::DishPhoto),
            "burrito" => Ok(EntryKind::Burrito),
            _ => Err(anyhow::anyhow!("Unknown entry kind: {s}")),
        }
    }
}

/// The five daily indicators. `None` means nobody set the flag today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub bengels: Option<bool>,
    pub lekker_vreten: Option<bool>,
    pub korvel: Option<bool>,
    pub visdag: Option<bool>,
    pub burritos: Option<bool>,
}

/// Kind-specific part of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Menu {
        items: String,
    },
    Advice {
        advice: String,
        #[serde(default)]
        photo_url: Option<String>,
    },
    Status(StatusFlags),
    DishPhoto {
        dish_section: String,
        photo_url: String,
        uploader_name: String,
        #[serde(default)]
        comment: Option<String>,
        rating: i16,
    },
    Burrito {
        has_burritos: bool,
    },
}

impl Payload {
    pub fn kind(&self) -> EntryKind {
        match self {
            Payload::Menu { .. } => EntryKind::Menu,
            Payload::Advice { .. } => EntryKind::Advice,
            Payload::Status(_) => EntryKind::Status,
            Payload::DishPhoto { .. } => EntryKind::DishPhoto,
            Payload::Burrito { .. } => EntryKind::Burrito,
        }
    }

    /// Minimum content for a new record of this kind. Every write path checks
    /// this before inserting.
    pub fn is_submittable(&self) -> bool {
        match self {
            Payload::Menu { items } => menu::has_content(items),
            Payload::Advice { advice, .. } => !advice.trim().is_empty(),
            Payload::Status(_) | Payload::Burrito { .. } => true,
            Payload::DishPhoto {
                photo_url,
                uploader_name,
                rating,
                ..
            } => {
                (1..=5).contains(rating)
                    && !uploader_name.trim().is_empty()
                    && !photo_url.trim().is_empty()
            }
        }
    }
}

/// One stored row of any table.
///
/// `date_str` is the business-day key and the only field used to decide which
/// day a record belongs to. `formatted_date` is frozen at insert time and is for
/// display only. `timestamp` (epoch millis) orders records and never buckets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub date_str: String,
    pub formatted_date: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Record {
    pub fn kind(&self) -> EntryKind {
        self.payload.kind()
    }

    /// Ordering used everywhere "latest" is decided: timestamp first, id as a
    /// deterministic tie-break.
    pub fn is_newer_than(&self, other: &Record) -> bool {
        (self.timestamp, self.id) > (other.timestamp, other.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_table_names() {
        for kind in EntryKind::ALL {
            assert_eq!(EntryKind::from_table(kind.table()), Some(kind));
            assert_eq!(kind.to_string().parse::<EntryKind>().unwrap(), kind);
        }
        assert!(EntryKind::from_table("korvel_reviews").is_none());
    }

    #[test]
    fn legacy_other_alias_maps_to_status() {
        assert_eq!("other".parse::<EntryKind>().unwrap(), EntryKind::Status);
    }

    #[test]
    fn payload_json_is_tagged_by_kind() {
        let payload: Payload = serde_json::from_value(serde_json::json!({
            "kind": "status",
            "bengels": true,
            "visdag": false
        }))
        .unwrap();
        assert_eq!(
            payload,
            Payload::Status(StatusFlags {
                bengels: Some(true),
                visdag: Some(false),
                ..Default::default()
            })
        );

        let advice: Payload =
            serde_json::from_value(serde_json::json!({ "kind": "advice", "advice": "Eet fruit" }))
                .unwrap();
        assert_eq!(advice.kind(), EntryKind::Advice);
    }

    #[test]
    fn newer_breaks_timestamp_ties_by_id() {
        let make = |id: u128, ts: i64| Record {
            id: Uuid::from_u128(id),
            date_str: "2024-03-05".into(),
            formatted_date: String::new(),
            timestamp: ts,
            payload: Payload::Burrito { has_burritos: true },
        };
        assert!(make(1, 200).is_newer_than(&make(2, 100)));
        assert!(make(2, 100).is_newer_than(&make(1, 100)));
        assert!(!make(1, 100).is_newer_than(&make(1, 100)));
    }

    #[test]
    fn blank_entries_are_not_submittable() {
        let menu = |items: &str| Payload::Menu {
            items: items.into(),
        };
        assert!(!menu("   ").is_submittable());
        assert!(!menu(&crate::models::menu::MenuForm::default().to_items()).is_submittable());
        assert!(menu("Stamppot").is_submittable());

        let advice = Payload::Advice {
            advice: " \n".into(),
            photo_url: Some("https://photos.test/a.jpg".into()),
        };
        assert!(!advice.is_submittable());
        assert!(Payload::Status(StatusFlags::default()).is_submittable());
    }

    #[test]
    fn dish_photo_needs_rating_uploader_and_url() {
        let photo = |uploader: &str, rating: i16, url: &str| Payload::DishPhoto {
            dish_section: "Soep".into(),
            photo_url: url.into(),
            uploader_name: uploader.into(),
            comment: None,
            rating,
        };
        assert!(photo("Ries", 4, "https://photos.test/a.jpg").is_submittable());
        assert!(!photo("   ", 4, "https://photos.test/a.jpg").is_submittable());
        assert!(!photo("Ries", 42, "https://photos.test/a.jpg").is_submittable());
        assert!(!photo("Ries", 0, "https://photos.test/a.jpg").is_submittable());
        assert!(!photo("Ries", 4, "").is_submittable());
    }
}

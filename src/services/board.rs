use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    db::RecordStore,
    models::{
        board::BoardToday,
        menu,
        photo::{DishPhotoForm, MenuDay, SectionWithPhotos},
        record::{EntryKind, Payload, Record},
    },
    services::{
        changefeed::Changefeed,
        clock::{business_day_key, formatted_date, Clock, RecordStamp},
        history::reduce_to_latest_per_day,
        ingest::{self, IngestError},
        metrics::{RECORDS_INSERTED_COUNTER, UNLOCK_ATTEMPTS_COUNTER},
        session::SubmitError,
        storage::PhotoStorage,
        today::latest_for_today,
    },
};

/// Shared passwords of the gated entry kinds, compared as plain strings.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub advice: String,
    pub status: String,
}

impl Secrets {
    pub fn for_kind(&self, kind: EntryKind) -> Option<&str> {
        match kind {
            EntryKind::Advice => Some(&self.advice),
            EntryKind::Status => Some(&self.status),
            _ => None,
        }
    }
}

/// Reads and appends board records. Cloning is cheap; every handle shares the
/// same store, photo storage and clock.
#[derive(Clone)]
pub struct Board {
    store: Arc<dyn RecordStore>,
    photos: Arc<dyn PhotoStorage>,
    clock: Arc<dyn Clock>,
    secrets: Arc<Secrets>,
    feed: Option<Changefeed>,
}

impl Board {
    pub fn new(
        store: Arc<dyn RecordStore>,
        photos: Arc<dyn PhotoStorage>,
        clock: Arc<dyn Clock>,
        secrets: Secrets,
    ) -> Self {
        Self {
            store,
            photos,
            clock,
            secrets: Arc::new(secrets),
            feed: None,
        }
    }

    pub fn with_changefeed(mut self, feed: Changefeed) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today_key(&self) -> String {
        business_day_key(self.now())
    }

    pub fn is_gated(&self, kind: EntryKind) -> bool {
        self.secrets.for_kind(kind).is_some()
    }

    /// Exact comparison against the kind's shared secret. Ungated kinds always pass.
    pub fn check_password(&self, kind: EntryKind, attempt: &str) -> bool {
        let Some(secret) = self.secrets.for_kind(kind) else {
            return true;
        };
        let ok = attempt == secret;
        let label = kind.to_string();
        UNLOCK_ATTEMPTS_COUNTER
            .with_label_values(&[label.as_str(), if ok { "ok" } else { "denied" }])
            .inc();
        ok
    }

    /// Stamp and insert a new record, then notify subscribers.
    ///
    /// A failed publish is logged only: the row is already stored and clients
    /// pick it up on their next reload.
    pub async fn append(&self, payload: Payload) -> anyhow::Result<Record> {
        anyhow::ensure!(
            payload.is_submittable(),
            "incomplete {} entry",
            payload.kind()
        );
        let stamp = RecordStamp::at(self.now());
        let record = self.store.append(&stamp, &payload).await?;
        let kind = record.kind();
        RECORDS_INSERTED_COUNTER
            .with_label_values(&[kind.table()])
            .inc();
        info!("Inserted {} {} for {}", kind, record.id, record.date_str);

        if let Some(feed) = &self.feed {
            if let Err(e) = feed.publish_insert(kind).await {
                warn!("Changefeed publish for {} failed: {}", kind.table(), e);
            }
        }
        Ok(record)
    }

    /// Today's record of a kind, if one was entered today.
    pub async fn today(&self, kind: EntryKind) -> anyhow::Result<Option<Record>> {
        self.latest_on(kind, &self.today_key()).await
    }

    async fn latest_on(&self, kind: EntryKind, date_str: &str) -> anyhow::Result<Option<Record>> {
        let latest = self.store.latest(kind).await?;
        Ok(latest_for_today(latest, date_str))
    }

    /// One record per day, most recent day first.
    pub async fn history(&self, kind: EntryKind) -> anyhow::Result<Vec<Record>> {
        Ok(reduce_to_latest_per_day(self.store.list(kind).await?))
    }

    /// Menu history with each day's dish photos attached to their sections.
    pub async fn menu_history(&self) -> anyhow::Result<Vec<MenuDay>> {
        let days = self.history(EntryKind::Menu).await?;
        let mut photos = by_section(self.store.list(EntryKind::DishPhoto).await?);
        Ok(days
            .into_iter()
            .map(|day| attach_photos(day, &mut photos))
            .collect())
    }

    pub async fn dish_photos_on(&self, date_str: &str) -> anyhow::Result<Vec<Record>> {
        self.store.dish_photos_on(date_str).await
    }

    pub async fn all_dish_photos(&self) -> anyhow::Result<Vec<Record>> {
        self.store.list(EntryKind::DishPhoto).await
    }

    /// Everything on the board for one business day. The clock is read once so
    /// a request straddling midnight never mixes two days.
    pub async fn board_today(&self) -> anyhow::Result<BoardToday> {
        let now = self.now();
        let date_str = business_day_key(now);

        let menu = self.latest_on(EntryKind::Menu, &date_str).await?;
        let dish_photos = self.store.dish_photos_on(&date_str).await?;
        let menu = menu.map(|record| attach_photos(record, &mut by_section(dish_photos.clone())));

        Ok(BoardToday {
            formatted_date: formatted_date(now),
            menu,
            advice: self.latest_on(EntryKind::Advice, &date_str).await?,
            status: self.latest_on(EntryKind::Status, &date_str).await?,
            dish_photos,
            date_str,
        })
    }

    /// Compress and store a photo, returning its public URL.
    pub async fn upload_photo(&self, bytes: &[u8]) -> Result<String, IngestError> {
        ingest::ingest(self.photos.as_ref(), bytes).await
    }

    /// Upload the photo, then insert the dish photo record. A failed upload
    /// inserts nothing.
    pub async fn submit_dish_photo(&self, form: DishPhotoForm) -> Result<Record, SubmitError> {
        if !form.is_valid() {
            return Err(SubmitError::Invalid);
        }
        let Some(photo) = form.photo.as_deref() else {
            return Err(SubmitError::Invalid);
        };
        let photo_url = self.upload_photo(photo).await?;

        let comment = form.comment.trim();
        let payload = Payload::DishPhoto {
            dish_section: form.dish_section,
            photo_url,
            uploader_name: form.uploader_name.trim().to_string(),
            comment: (!comment.is_empty()).then(|| comment.to_string()),
            rating: form.rating,
        };
        self.append(payload).await.map_err(SubmitError::Store)
    }
}

type PhotosBySection = HashMap<(String, String), Vec<Record>>;

/// Index dish photos by (day, section label), keeping their order.
fn by_section(photos: impl IntoIterator<Item = Record>) -> PhotosBySection {
    let mut index = PhotosBySection::new();
    for photo in photos {
        let Payload::DishPhoto { dish_section, .. } = &photo.payload else {
            continue;
        };
        let key = (photo.date_str.clone(), dish_section.clone());
        index.entry(key).or_default().push(photo);
    }
    index
}

fn attach_photos(record: Record, photos: &mut PhotosBySection) -> MenuDay {
    let items = match &record.payload {
        Payload::Menu { items } => items.as_str(),
        _ => "",
    };
    let sections = menu::sections(items)
        .into_iter()
        .map(|section| {
            let photos = section
                .label
                .as_ref()
                .and_then(|label| photos.remove(&(record.date_str.clone(), label.clone())))
                .unwrap_or_default();
            SectionWithPhotos {
                label: section.label,
                body: section.body,
                photos,
            }
        })
        .collect();
    MenuDay { record, sections }
}

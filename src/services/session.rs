use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    models::{
        menu::MenuForm,
        record::{EntryKind, Payload, Record, StatusFlags},
    },
    services::{board::Board, ingest::IngestError},
};

/// How long the "saved" indicator stays on after a successful submit.
pub const SAVED_INDICATOR_MS: i64 = 2_000;

/// Entry kinds that have an edit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Menu,
    Advice,
    Status,
}

impl FormKind {
    pub fn entry_kind(self) -> EntryKind {
        match self {
            FormKind::Menu => EntryKind::Menu,
            FormKind::Advice => EntryKind::Advice,
            FormKind::Status => EntryKind::Status,
        }
    }
}

impl std::str::FromStr for FormKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<EntryKind>()? {
            EntryKind::Menu => Ok(FormKind::Menu),
            EntryKind::Advice => Ok(FormKind::Advice),
            EntryKind::Status => Ok(FormKind::Status),
            other => Err(anyhow::anyhow!("No entry form for {other}")),
        }
    }
}

/// Photo attached to the advice form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AdvicePhoto {
    #[default]
    Empty,
    /// Already uploaded; the URL is reused as is.
    Stored(String),
    /// Picked but not uploaded yet.
    Pending(Vec<u8>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdviceForm {
    pub text: String,
    pub photo: AdvicePhoto,
}

/// Field values of the form being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    Menu(MenuForm),
    Advice(AdviceForm),
    Status(StatusFlags),
}

impl Form {
    pub fn blank(kind: FormKind) -> Self {
        match kind {
            FormKind::Menu => Form::Menu(MenuForm::default()),
            FormKind::Advice => Form::Advice(AdviceForm::default()),
            FormKind::Status => Form::Status(StatusFlags::default()),
        }
    }

    /// Pre-fill from a stored record. `None` if the record has no form.
    pub fn from_record(record: &Record) -> Option<Self> {
        match &record.payload {
            Payload::Menu { items } => Some(Form::Menu(MenuForm::from_items(items))),
            Payload::Advice { advice, photo_url } => Some(Form::Advice(AdviceForm {
                text: advice.clone(),
                photo: photo_url
                    .clone()
                    .map(AdvicePhoto::Stored)
                    .unwrap_or_default(),
            })),
            Payload::Status(flags) => Some(Form::Status(*flags)),
            Payload::DishPhoto { .. } | Payload::Burrito { .. } => None,
        }
    }

    pub fn kind(&self) -> FormKind {
        match self {
            Form::Menu(_) => FormKind::Menu,
            Form::Advice(_) => FormKind::Advice,
            Form::Status(_) => FormKind::Status,
        }
    }

    pub fn can_submit(&self) -> bool {
        match self {
            Form::Menu(menu) => !menu.is_blank(),
            Form::Advice(advice) => !advice.text.trim().is_empty(),
            // Leaving every flag unset is a valid status.
            Form::Status(_) => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Nothing entered today yet; submitting creates the day's first record.
    New,
    /// Today's record is loaded; submitting appends a correction.
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Locked { auth_error: bool },
    Loading,
    Ready(EditMode),
    Submitting(EditMode),
}

/// One-shot message shown after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NewDay,
    ExistingLoaded,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("form is not ready to submit")]
    NotReady,
    #[error("form is incomplete")]
    Invalid,
    #[error(transparent)]
    Upload(#[from] IngestError),
    #[error("saving failed: {0:#}")]
    Store(anyhow::Error),
}

/// Editing today's entry of one kind.
pub struct EditSession {
    board: Board,
    kind: FormKind,
    state: SessionState,
    form: Form,
    password: String,
    notice: Option<Notice>,
    saved_at: Option<DateTime<Utc>>,
}

impl EditSession {
    /// Start a session. Gated kinds start locked; others load straight away.
    pub async fn open(board: Board, kind: FormKind) -> Self {
        let mut session = Self {
            board,
            kind,
            state: SessionState::Loading,
            form: Form::blank(kind),
            password: String::new(),
            notice: None,
            saved_at: None,
        };
        session.reset(kind).await;
        session
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    /// Switch to another kind: fields are cleared, the lock is re-evaluated
    /// and today's record reloaded.
    pub async fn select_kind(&mut self, kind: FormKind) {
        self.reset(kind).await;
    }

    /// Replace the password being typed. Clears a previous auth error.
    pub fn type_password(&mut self, text: &str) {
        self.password = text.to_string();
        if let SessionState::Locked { auth_error } = &mut self.state {
            *auth_error = false;
        }
    }

    /// Try the typed password. Returns whether the session is unlocked.
    pub async fn unlock(&mut self) -> bool {
        if !matches!(self.state, SessionState::Locked { .. }) {
            return true;
        }
        if self
            .board
            .check_password(self.kind.entry_kind(), &self.password)
        {
            self.load().await;
            true
        } else {
            self.state = SessionState::Locked { auth_error: true };
            false
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.state, SessionState::Ready(_)) && self.form.can_submit()
    }

    /// Append the form as a new record.
    ///
    /// On failure the session returns to where it was before the submit with
    /// every field untouched.
    pub async fn submit(&mut self) -> Result<Record, SubmitError> {
        let SessionState::Ready(mode) = self.state else {
            return Err(SubmitError::NotReady);
        };
        if !self.form.can_submit() {
            return Err(SubmitError::Invalid);
        }

        self.state = SessionState::Submitting(mode);
        match self.persist().await {
            Ok((record, uploaded)) => {
                if let (Some(url), Form::Advice(advice)) = (uploaded, &mut self.form) {
                    advice.photo = AdvicePhoto::Stored(url);
                }
                self.saved_at = Some(self.board.now());
                self.state = SessionState::Ready(EditMode::Editing);
                Ok(record)
            }
            Err(e) => {
                warn!("Submitting {:?} failed: {}", self.kind, e);
                self.state = SessionState::Ready(mode);
                Err(e)
            }
        }
    }

    /// Whether the "saved" indicator is still on.
    pub fn is_saved_visible(&self) -> bool {
        self.saved_at
            .is_some_and(|at| (self.board.now() - at).num_milliseconds() < SAVED_INDICATOR_MS)
    }

    async fn reset(&mut self, kind: FormKind) {
        self.kind = kind;
        self.form = Form::blank(kind);
        self.password.clear();
        self.notice = None;
        self.saved_at = None;
        if self.board.is_gated(kind.entry_kind()) {
            self.state = SessionState::Locked { auth_error: false };
        } else {
            self.load().await;
        }
    }

    async fn load(&mut self) {
        self.state = SessionState::Loading;
        match self.board.today(self.kind.entry_kind()).await {
            Ok(Some(record)) => match Form::from_record(&record) {
                Some(form) => {
                    debug!("Loaded today's {:?} entry {}", self.kind, record.id);
                    self.form = form;
                    self.state = SessionState::Ready(EditMode::Editing);
                    self.notice = Some(Notice::ExistingLoaded);
                }
                None => {
                    self.form = Form::blank(self.kind);
                    self.state = SessionState::Ready(EditMode::New);
                    self.notice = Some(Notice::NewDay);
                }
            },
            Ok(None) => {
                self.form = Form::blank(self.kind);
                self.state = SessionState::Ready(EditMode::New);
                self.notice = Some(Notice::NewDay);
            }
            Err(e) => {
                warn!("Loading today's {:?} entry failed: {:#}", self.kind, e);
                self.form = Form::blank(self.kind);
                self.state = SessionState::Ready(EditMode::New);
                self.notice = None;
            }
        }
    }

    async fn persist(&self) -> Result<(Record, Option<String>), SubmitError> {
        let mut uploaded = None;
        let payload = match &self.form {
            Form::Menu(menu) => Payload::Menu {
                items: menu.to_items(),
            },
            Form::Advice(advice) => {
                let photo_url = match &advice.photo {
                    AdvicePhoto::Empty => None,
                    AdvicePhoto::Stored(url) => Some(url.clone()),
                    AdvicePhoto::Pending(bytes) => {
                        let url = self.board.upload_photo(bytes).await?;
                        uploaded = Some(url.clone());
                        Some(url)
                    }
                };
                Payload::Advice {
                    advice: advice.text.clone(),
                    photo_url,
                }
            }
            Form::Status(flags) => Payload::Status(*flags),
        };

        let record = self
            .board
            .append(payload)
            .await
            .map_err(SubmitError::Store)?;
        Ok((record, uploaded))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{atomic::Ordering, Arc};

    use chrono::Duration;

    use super::*;
    use crate::{
        db::memory::MemoryRecordStore,
        services::{board::Secrets, clock::FixedClock, storage::MemoryPhotoStorage},
    };

    struct Fixture {
        board: Board,
        store: Arc<MemoryRecordStore>,
        photos: Arc<MemoryPhotoStorage>,
        clock: Arc<FixedClock>,
    }

    fn fixture(now: &str) -> Fixture {
        let store = Arc::new(MemoryRecordStore::default());
        let photos = Arc::new(MemoryPhotoStorage::default());
        let clock = Arc::new(FixedClock::at(now));
        let board = Board::new(
            store.clone(),
            photos.clone(),
            clock.clone(),
            Secrets {
                advice: "wijsheid".into(),
                status: "bengels123".into(),
            },
        );
        Fixture {
            board,
            store,
            photos,
            clock,
        }
    }

    fn png() -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(8, 8);
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn menu_mut(session: &mut EditSession) -> &mut MenuForm {
        match session.form_mut() {
            Form::Menu(menu) => menu,
            other => panic!("expected menu form, got {other:?}"),
        }
    }

    fn advice_mut(session: &mut EditSession) -> &mut AdviceForm {
        match session.form_mut() {
            Form::Advice(advice) => advice,
            other => panic!("expected advice form, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn menu_new_day_then_reopen_shows_existing_data() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Menu).await;

        assert_eq!(session.state(), SessionState::Ready(EditMode::New));
        assert_eq!(session.notice(), Some(Notice::NewDay));
        assert!(!session.can_submit());

        let menu = menu_mut(&mut session);
        menu.dish1 = "Soup".into();
        menu.price1 = "5,00".into();
        assert!(session.can_submit());

        let record = session.submit().await.unwrap();
        assert_eq!(record.date_str, "2024-03-05");
        assert_eq!(session.state(), SessionState::Ready(EditMode::Editing));
        assert!(session.is_saved_visible());

        f.clock.advance(Duration::seconds(3));
        assert!(!session.is_saved_visible());

        let reopened = EditSession::open(f.board.clone(), FormKind::Menu).await;
        assert_eq!(reopened.state(), SessionState::Ready(EditMode::Editing));
        assert_eq!(reopened.notice(), Some(Notice::ExistingLoaded));
        match reopened.form() {
            Form::Menu(menu) => {
                assert_eq!(menu.dish1, "Soup");
                assert_eq!(menu.price1, "5,00");
                assert_eq!(menu.soup, "");
            }
            other => panic!("expected menu form, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn correction_appends_instead_of_updating() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Menu).await;
        menu_mut(&mut session).dish1 = "Stamppot".into();
        session.submit().await.unwrap();

        f.clock.advance(Duration::minutes(10));
        menu_mut(&mut session).dish1 = "Hutspot".into();
        session.submit().await.unwrap();

        assert_eq!(f.store.count(EntryKind::Menu).await, 2);
        let reopened = EditSession::open(f.board.clone(), FormKind::Menu).await;
        match reopened.form() {
            Form::Menu(menu) => assert_eq!(menu.dish1, "Hutspot"),
            other => panic!("expected menu form, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn advice_stays_locked_on_wrong_password() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Advice).await;
        assert_eq!(session.state(), SessionState::Locked { auth_error: false });

        session.type_password("x");
        assert!(!session.unlock().await);
        assert_eq!(session.state(), SessionState::Locked { auth_error: true });

        session.type_password("wijsheid");
        assert_eq!(session.state(), SessionState::Locked { auth_error: false });
        assert!(session.unlock().await);
        assert_eq!(session.state(), SessionState::Ready(EditMode::New));
        assert_eq!(session.notice(), Some(Notice::NewDay));
    }

    #[tokio::test]
    async fn locked_session_cannot_submit() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Status).await;
        assert!(!session.can_submit());
        assert!(matches!(session.submit().await, Err(SubmitError::NotReady)));
        assert_eq!(f.store.count(EntryKind::Status).await, 0);
    }

    #[tokio::test]
    async fn status_with_every_flag_unset_submits() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Status).await;
        session.type_password("bengels123");
        assert!(session.unlock().await);
        assert!(session.can_submit());

        let record = session.submit().await.unwrap();
        assert_eq!(record.payload, Payload::Status(StatusFlags::default()));
    }

    #[tokio::test]
    async fn whitespace_advice_is_not_submittable() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Advice).await;
        session.type_password("wijsheid");
        session.unlock().await;

        advice_mut(&mut session).text = "   \n".into();
        assert!(!session.can_submit());
        assert!(matches!(session.submit().await, Err(SubmitError::Invalid)));
        assert_eq!(session.state(), SessionState::Ready(EditMode::New));
    }

    #[tokio::test]
    async fn advice_photo_is_uploaded_before_insert() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Advice).await;
        session.type_password("wijsheid");
        session.unlock().await;

        let advice = advice_mut(&mut session);
        advice.text = "Drink water".into();
        advice.photo = AdvicePhoto::Pending(png());
        let record = session.submit().await.unwrap();

        let Payload::Advice { photo_url, .. } = &record.payload else {
            panic!("expected advice payload");
        };
        let url = photo_url.clone().unwrap();
        assert!(url.starts_with("https://photos.test/"));
        assert_eq!(
            advice_mut(&mut session).photo,
            AdvicePhoto::Stored(url.clone())
        );

        // Resubmitting keeps the stored URL without another upload.
        f.clock.advance(Duration::minutes(1));
        session.submit().await.unwrap();
        assert_eq!(f.photos.objects.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_upload_keeps_fields_and_inserts_nothing() {
        let f = fixture("2024-03-05T09:00:00Z");
        f.photos.fail.store(true, Ordering::SeqCst);
        let mut session = EditSession::open(f.board.clone(), FormKind::Advice).await;
        session.type_password("wijsheid");
        session.unlock().await;

        let advice = advice_mut(&mut session);
        advice.text = "Eet fruit".into();
        advice.photo = AdvicePhoto::Pending(png());
        let before = session.form().clone();

        assert!(matches!(session.submit().await, Err(SubmitError::Upload(_))));
        assert_eq!(session.state(), SessionState::Ready(EditMode::New));
        assert_eq!(session.form(), &before);
        assert!(!session.is_saved_visible());
        assert_eq!(f.store.count(EntryKind::Advice).await, 0);
    }

    #[tokio::test]
    async fn store_failure_keeps_editing_mode_and_fields() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Menu).await;
        menu_mut(&mut session).dish1 = "Stamppot".into();
        session.submit().await.unwrap();

        f.store.fail_appends.store(true, Ordering::SeqCst);
        menu_mut(&mut session).dish1 = "Hutspot".into();
        assert!(matches!(session.submit().await, Err(SubmitError::Store(_))));
        assert_eq!(session.state(), SessionState::Ready(EditMode::Editing));
        assert_eq!(menu_mut(&mut session).dish1, "Hutspot");
        assert_eq!(f.store.count(EntryKind::Menu).await, 1);
    }

    #[tokio::test]
    async fn load_failure_falls_back_to_a_blank_new_form() {
        let f = fixture("2024-03-05T09:00:00Z");
        f.store.fail_reads.store(true, Ordering::SeqCst);
        let session = EditSession::open(f.board.clone(), FormKind::Menu).await;

        assert_eq!(session.state(), SessionState::Ready(EditMode::New));
        assert_eq!(session.notice(), None);
        assert_eq!(session.form(), &Form::blank(FormKind::Menu));
    }

    #[tokio::test]
    async fn yesterdays_entry_does_not_prefill() {
        let f = fixture("2024-03-04T15:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Menu).await;
        menu_mut(&mut session).dish1 = "Maandagmenu".into();
        session.submit().await.unwrap();

        f.clock.advance(Duration::days(1));
        let next_day = EditSession::open(f.board.clone(), FormKind::Menu).await;
        assert_eq!(next_day.state(), SessionState::Ready(EditMode::New));
        assert_eq!(next_day.form(), &Form::blank(FormKind::Menu));
    }

    #[tokio::test]
    async fn switching_kind_resets_and_relocks() {
        let f = fixture("2024-03-05T09:00:00Z");
        let mut session = EditSession::open(f.board.clone(), FormKind::Menu).await;
        menu_mut(&mut session).dish1 = "Stamppot".into();

        session.select_kind(FormKind::Status).await;
        assert_eq!(session.kind(), FormKind::Status);
        assert_eq!(session.state(), SessionState::Locked { auth_error: false });
        assert_eq!(session.form(), &Form::blank(FormKind::Status));

        session.select_kind(FormKind::Menu).await;
        assert_eq!(session.form(), &Form::blank(FormKind::Menu));
        assert_eq!(session.state(), SessionState::Ready(EditMode::New));
    }

    #[test]
    fn form_kinds_parse_from_entry_names() {
        assert_eq!("menu".parse::<FormKind>().unwrap(), FormKind::Menu);
        assert_eq!("other".parse::<FormKind>().unwrap(), FormKind::Status);
        assert!("dish_photo".parse::<FormKind>().is_err());
    }
}

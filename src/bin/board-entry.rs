/// Enter or correct today's board values from a terminal.
///
/// Usage:
///   board-entry menu --soup "Tomatensoep" --price-soup "3,50"
///   board-entry advice --password ... --text "Drink water" --photo ./advies.jpg
///   board-entry status --password ... --visdag true --burritos false
///   board-entry status --password ... --dry-run
///
/// Fields that are not given keep the value already entered today.
use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use lunchboard_api::{
    config::Config,
    db::{self, records::PgRecordStore},
    services::{
        board::{Board, Secrets},
        changefeed::Changefeed,
        clock::SystemClock,
        session::{AdvicePhoto, EditSession, Form, FormKind, Notice, SessionState},
        storage::LocalMediaStorage,
    },
};

#[derive(Parser)]
#[command(name = "board-entry", about = "Enter today's menu, advice or status on the lunch board")]
struct Args {
    /// menu, advice or status
    kind: FormKind,

    /// Shared password (advice and status only)
    #[arg(long, env = "BOARD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Show what is entered today without submitting
    #[arg(long)]
    dry_run: bool,

    // Menu
    #[arg(long)]
    dish1: Option<String>,
    #[arg(long)]
    price1: Option<String>,
    #[arg(long)]
    dish2: Option<String>,
    #[arg(long)]
    price2: Option<String>,
    #[arg(long)]
    soup: Option<String>,
    #[arg(long)]
    price_soup: Option<String>,

    // Advice
    #[arg(long)]
    text: Option<String>,
    /// Image to attach to the advice
    #[arg(long)]
    photo: Option<PathBuf>,
    /// Drop the photo currently attached to today's advice
    #[arg(long, conflicts_with = "photo")]
    no_photo: bool,

    // Status
    #[arg(long)]
    bengels: Option<bool>,
    #[arg(long)]
    lekker_vreten: Option<bool>,
    #[arg(long)]
    korvel: Option<bool>,
    #[arg(long)]
    visdag: Option<bool>,
    #[arg(long)]
    burritos: Option<bool>,
}

impl Args {
    async fn apply(&self, form: &mut Form) -> anyhow::Result<()> {
        match form {
            Form::Menu(menu) => {
                for (field, value) in [
                    (&mut menu.dish1, &self.dish1),
                    (&mut menu.price1, &self.price1),
                    (&mut menu.dish2, &self.dish2),
                    (&mut menu.price2, &self.price2),
                    (&mut menu.soup, &self.soup),
                    (&mut menu.price_soup, &self.price_soup),
                ] {
                    if let Some(value) = value {
                        *field = value.clone();
                    }
                }
            }
            Form::Advice(advice) => {
                if let Some(text) = &self.text {
                    advice.text = text.clone();
                }
                if let Some(path) = &self.photo {
                    let bytes = tokio::fs::read(path)
                        .await
                        .with_context(|| format!("Cannot read {}", path.display()))?;
                    advice.photo = AdvicePhoto::Pending(bytes);
                } else if self.no_photo {
                    advice.photo = AdvicePhoto::Empty;
                }
            }
            Form::Status(flags) => {
                for (flag, value) in [
                    (&mut flags.bengels, self.bengels),
                    (&mut flags.lekker_vreten, self.lekker_vreten),
                    (&mut flags.korvel, self.korvel),
                    (&mut flags.visdag, self.visdag),
                    (&mut flags.burritos, self.burritos),
                ] {
                    if value.is_some() {
                        *flag = value;
                    }
                }
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;

    let mut board = Board::new(
        Arc::new(PgRecordStore::new(pool)),
        Arc::new(LocalMediaStorage::new(
            &config.media_dir,
            &config.public_base_url,
        )),
        Arc::new(SystemClock),
        Secrets {
            advice: config.advice_password.clone(),
            status: config.status_password.clone(),
        },
    );

    // Without Redis the entry is still stored; open boards see it on their next reload.
    match redis::Client::open(config.redis_url.as_str()) {
        Ok(client) => match client.get_multiplexed_async_connection().await {
            Ok(conn) => board = board.with_changefeed(Changefeed::new(conn)),
            Err(e) => warn!("Redis unavailable, boards will not be notified: {}", e),
        },
        Err(e) => warn!("Invalid REDIS_URL, boards will not be notified: {}", e),
    }

    let mut session = EditSession::open(board, args.kind).await;

    if let SessionState::Locked { .. } = session.state() {
        session.type_password(args.password.as_deref().unwrap_or(""));
        if !session.unlock().await {
            anyhow::bail!("Wrong password for {:?}", args.kind);
        }
    }

    match session.notice() {
        Some(Notice::ExistingLoaded) => info!("Today's entry loaded; submitting adds a correction"),
        Some(Notice::NewDay) => info!("Nothing entered today yet"),
        None => warn!("Could not load today's entry; starting from a blank form"),
    }

    if args.dry_run {
        println!("{:#?}", session.form());
        return Ok(());
    }

    args.apply(session.form_mut()).await?;
    if !session.can_submit() {
        anyhow::bail!("Nothing to submit: fill in at least one field");
    }

    let record = session.submit().await?;
    info!("Saved {} for {} ({})", record.kind(), record.date_str, record.id);
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

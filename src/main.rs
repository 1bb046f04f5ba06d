use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use confectionery::bot::{self, BotContext};
use confectionery::config::{AppConfig, PathResolver};
use confectionery::dialogue::BotDialogueState;
use confectionery::file_manager::FileManager;
use confectionery::localization::LocalizationManager;
use confectionery::photo_index::PhotoIndex;
use confectionery::recipes::RecipeCatalog;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();
    info!("Starting Confectionery Telegram Bot");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    info!(data_dir = %config.storage.base_dir().display(), "Photo storage configured");

    let file_manager = Arc::new(FileManager::new(Arc::new(config.storage.clone())));
    let catalog = RecipeCatalog::load_default()?;
    info!(recipes = catalog.list().len(), "Recipe catalog loaded");

    let ctx = Arc::new(BotContext {
        file_manager,
        photo_index: PhotoIndex::new(),
        catalog,
        localization: LocalizationManager::new().context("Failed to load translations")?,
        staff_ids: config.staff_ids.clone(),
    });

    let bot = Bot::new(config.bot_token);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<BotDialogueState>, BotDialogueState>()
                .endpoint(bot::message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<BotDialogueState>, BotDialogueState>()
                .endpoint(bot::callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<BotDialogueState>::new(), ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

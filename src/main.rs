//! Application entry point for modgate.
//!
//! Initializes all components and starts polling for updates.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use log::debug;
use log::info;
use log::warn;
use tracing_appender::non_blocking::WorkerGuard;

use modgate::bot::Bot;
use modgate::chat::InMemoryUserDirectory;
use modgate::config::Config;
use modgate::event::AuditRecordEvent;
use modgate::event::EventBus;
use modgate::logging::setup_logging;
use modgate::moderation::Moderator;
use modgate::subscriber::LogChannelSubscriber;
use modgate::task::update_poller::UpdatePoller;
use modgate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let (config, _log_guard) = load_config()?;
    let event_bus = Arc::new(EventBus::new());

    let client = setup_client(&config, init_start).await?;
    let moderator = setup_moderator(&config, client.clone()).await?;

    setup_subscribers(&config, &event_bus, client.clone());
    let bot = Arc::new(Bot::new(&config, moderator, client.clone(), event_bus));

    let poller = UpdatePoller::new(client, bot, config.poll_timeout);
    poller.clone().start()?;

    run(init_start).await?;
    poller.stop()
}

fn load_config() -> Result<(Arc<Config>, WorkerGuard)> {
    debug!("Loading configuration...");
    let mut config = Config::new();
    config.load()?;
    let guard = setup_logging(&config)?;
    info!("Starting modgate...");
    Ok((Arc::new(config), guard))
}

async fn setup_client(config: &Config, init_start: Instant) -> Result<Arc<TelegramClient>> {
    debug!("Setting up Telegram client...");
    let client = Arc::new(TelegramClient::new(&config.api_url, &config.bot_token)?);
    info!(
        "Telegram client setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(client)
}

async fn setup_moderator(config: &Config, client: Arc<TelegramClient>) -> Result<Arc<Moderator>> {
    let me = client.get_me().await?;
    info!(
        "Logged in as @{} ({})",
        me.username.as_deref().unwrap_or("unknown"),
        me.id
    );
    Ok(Arc::new(Moderator::new(
        client,
        Arc::new(InMemoryUserDirectory::with_capacity(
            config.directory_capacity,
        )),
        me,
    )))
}

fn setup_subscribers(config: &Config, event_bus: &EventBus, client: Arc<TelegramClient>) {
    debug!("Setting up Subscribers...");
    match config.log_channel_id {
        Some(chat_id) => {
            let subscriber = Arc::new(LogChannelSubscriber::new(client, chat_id));
            event_bus.register_subscriber::<AuditRecordEvent, _>(subscriber);
            info!("Audit records go to chat {chat_id}.");
        }
        None => warn!("LOG_CHANNEL_ID is not set, audit records are not delivered."),
    }
}

async fn run(init_start: Instant) -> Result<()> {
    info!(
        "modgate is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    Ok(())
}

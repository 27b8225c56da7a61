use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use picbot_core::{Config, MediaPool};
use picbot_gateway::bot::{Bot, BotConfig};
use picbot_gateway::matrix::MatrixClient;
use picbot_gateway::scheduler;
use picbot_gateway::session::SessionEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    picbot_core::load_dotenv();

    // Initialize tracing before anything that may log, behind a reload
    // layer so the level configured in settings can be applied once the
    // config file has been read.
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let (env_filter, filter_handle) = tracing_subscriber::reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (RUST_LOG overrides the configured level)
    let config = Config::load()?;
    if std::env::var("RUST_LOG").is_err() {
        let _ = filter_handle.reload(tracing_subscriber::EnvFilter::new(
            &config.settings.logging.level,
        ));
    }

    info!(
        "Configuration loaded (homeserver: {}, room: {}, media dir: {})",
        config.settings.homeserver, config.settings.room_id, config.settings.media_dir
    );

    let (hour, minute) = config.post_time();
    let schedule = scheduler::daily_schedule(hour, minute);
    info!("Daily post scheduled at {:02}:{:02} UTC", hour, minute);

    let pool = MediaPool::new(&config.settings.media_dir);
    let api = Arc::new(MatrixClient::new(
        &config.settings.homeserver,
        &config.secrets.access_token,
        &config.settings.user_id,
    ));

    let bot = Arc::new(Bot::new(
        Arc::clone(&api),
        BotConfig {
            user_id: config.settings.user_id.clone(),
            room_id: config.settings.room_id.clone(),
            owners: config.owners(),
            approve_key: config.settings.approve_key.clone(),
            owners_exempt: config.settings.owners_exempt,
        },
        pool,
    ));

    let scheduler_task = tokio::spawn(scheduler::run(Arc::clone(&bot), schedule));

    // Run the session loop (this blocks until a fatal error)
    let engine = SessionEngine::new(api, bot);
    let result = engine.run().await;

    scheduler_task.abort();
    Ok(result?)
}

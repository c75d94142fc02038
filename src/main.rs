mod auth;
mod commands;
mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod reveal;
mod state;
mod tasks;

use config::AppConfig;
use db::Database;
use log::{error, info};
use serenity::async_trait;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Bot {
    state: Arc<AppState>,
    reaper_interval: Duration,
    session_idle_timeout: Duration,
    reaper_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Bot {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let state = Arc::clone(&self.state);

        // Spawn a task to handle the interaction concurrently
        tokio::spawn(async move {
            handlers::handle_interaction(&state, &ctx, interaction).await;
        });
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let commands = Command::set_global_application_commands(&ctx.http, |commands_builder| {
            commands_builder.create_application_command(|command| commands::poll::create_poll_command(command))
        })
        .await;

        if let Err(why) = commands {
            error!("Failed to register slash commands: {:?}", why);
        } else {
            info!("Successfully registered global slash commands.");
        }

        // Ready fires again after reconnects; one reaper is enough
        if !self.reaper_started.swap(true, Ordering::SeqCst) {
            let registry = Arc::clone(&self.state.reveals);
            tokio::spawn(tasks::session_reaper::reap_idle_sessions_task(
                registry,
                self.reaper_interval,
                self.session_idle_timeout,
            ));
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let database = match Database::new(&config.database_url).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let state = Arc::new(AppState::new(database, config.reveal.clone()));

    let intents = GatewayIntents::GUILDS;
    let bot = Bot {
        state: Arc::clone(&state),
        reaper_interval: config.reaper_interval,
        session_idle_timeout: config.session_idle_timeout,
        reaper_started: AtomicBool::new(false),
    };

    let mut client = match Client::builder(&config.discord_token, intents).event_handler(bot).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create client: {:?}", e);
            return;
        }
    };

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested, stopping shards...");
            shard_manager.lock().await.shutdown_all().await;
        }
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    state.shutdown().await;
    info!("Shut down cleanly.");
}

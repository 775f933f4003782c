use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use zeeguu_feeds::api::ZeeguuClient;
use zeeguu_feeds::articles::ArticleList;
use zeeguu_feeds::config::Config;
use zeeguu_feeds::speech::{CommandSpeaker, SpeechTrigger};
use zeeguu_feeds::subscription::SubscriptionList;

mod app;
mod ui;

use app::{App, AppEvent};

/// Get the config directory path (~/.config/zeeguu-feeds/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("zeeguu-feeds");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "zeeguu-feeds",
    about = "Follow Zeeguu reading feeds from the terminal"
)]
struct Args {
    /// Config file (default: ~/.config/zeeguu-feeds/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// API base URL, overrides the config file
    #[arg(long, value_name = "URL")]
    api: Option<String>,

    /// Language whose feeds are offered and spoken, overrides the config file
    #[arg(long, value_name = "CODE")]
    language: Option<String>,
}

/// Send logs to a file so they do not draw over the TUI.
fn init_logging(config_dir: &std::path::Path) -> Result<()> {
    let log_path = config_dir.join("zeeguu-feeds.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file '{}'", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // The config file may hold a session token: user-only access.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            eprintln!(
                "Warning: failed to restrict permissions on {}: {}",
                config_dir.display(),
                e
            );
        }
    }

    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;
    if let Some(api) = args.api {
        config.api_base_url = api;
    }
    if let Some(language) = args.language {
        config.from_language = language;
    }
    tracing::info!(?config, "Starting");

    let session = config.session_secret();
    if session.is_none() {
        tracing::warn!("No session configured; the server will reject requests");
        eprintln!("Warning: no session set. Add `session` to the config file or set ZEEGUU_SESSION.");
    }

    let api = Arc::new(
        ZeeguuClient::new(&config.api_base_url, session, config.request_timeout())
            .context("Invalid API base URL")?,
    );

    let (subscription_tx, subscription_rx) = mpsc::channel(32);
    let (article_tx, article_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    let articles = ArticleList::new(Arc::clone(&api), article_tx);
    let mut subscriptions = SubscriptionList::new(Arc::clone(&api), articles, subscription_tx);
    subscriptions.load();

    let speech = SpeechTrigger::new(config.speech_delay(), config.from_language.clone());
    let speaker = CommandSpeaker::new(config.speech_command.clone());

    let mut app = App::new(api, subscriptions, speech, speaker, config.from_language);

    ui::run(
        &mut app,
        ui::Channels {
            subscription_rx,
            article_rx,
            event_tx,
            event_rx,
        },
    )
    .await?;

    Ok(())
}

//! Tessera command-line interface.
//!
//! Renders placeholders from JSON item files and manages cached output.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use picture::PicturePlugin;
use tessera_kernel::{AppState, Config, PluginPool, PluginPoolBuilder};
use text::TextPlugin;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the items of one placeholder to stdout.
    Render {
        /// JSON file holding an array of content items.
        #[arg(long)]
        items: PathBuf,

        /// Placeholder to render.
        #[arg(long, default_value = "main")]
        placeholder: String,

        /// Site to render for (defaults to SITE_ID).
        #[arg(long)]
        site: Option<i64>,

        /// Request language.
        #[arg(long)]
        language: Option<String>,

        /// Print each item's outcome to stderr.
        #[arg(long)]
        outcomes: bool,
    },

    /// List every cache key the items' output may be stored under.
    CacheKeys {
        #[arg(long)]
        items: PathBuf,
    },

    /// Clear cached output.
    Clear {
        /// Clear the items in this JSON file.
        #[arg(long)]
        items: Option<PathBuf>,

        /// Clear every stored item of this type.
        #[arg(long = "type")]
        type_name: Option<String>,
    },

    /// List registered plugins.
    Plugins,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(site_id = %config.site_id, cache_output = config.cache_output, "configuration loaded");

    let state = AppState::new(&config, plugins()?)
        .await
        .context("failed to initialize application state")?;

    match cli.command {
        Command::Render {
            items,
            placeholder,
            site,
            language,
            outcomes,
        } => commands::cmd_render(&state, &items, &placeholder, site, language, outcomes).await,
        Command::CacheKeys { items } => commands::cmd_cache_keys(&state, &items).await,
        Command::Clear { items, type_name } => {
            commands::cmd_clear(&state, items.as_deref(), type_name.as_deref()).await
        }
        Command::Plugins => {
            commands::cmd_plugins(&state);
            Ok(())
        }
    }
}

/// Plugins compiled into this binary.
fn plugins() -> Result<PluginPoolBuilder> {
    Ok(PluginPool::builder()
        .register(PicturePlugin)?
        .register(TextPlugin)?)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tessera=debug,sqlx=warn"));

    // Logs go to stderr so rendered markup on stdout stays clean
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

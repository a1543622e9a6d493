//! voxgate - key-holding proxy for text-to-speech and chat-completion APIs
//!
//! Keeps provider API keys on the server and forwards browser requests to
//! the speech and chat providers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voxgate::config::{Config, KeySource};
use voxgate::keys::KeyPool;

#[derive(Parser)]
#[command(name = "voxgate")]
#[command(about = "Key-holding proxy for text-to-speech and chat-completion APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    Serve {
        /// Path to configuration file (defaults and environment only when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override listen address
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Validate configuration and report where keys come from
    Check {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show configured providers, key counts and rotation policies
    Providers {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("voxgate={level},tower_http={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn log_key_sources(key_sources: &[(String, KeySource)]) {
    for (section, source) in key_sources {
        tracing::info!(section = %section, source = %source, "Resolved API keys");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, listen } => {
            let (mut config, key_sources) = Config::load(config.as_deref())?;
            init_tracing(&config.logging.level);
            log_key_sources(&key_sources);

            if let Some(addr) = listen {
                tracing::info!(listen = %addr, "Override listen address");
                config.server.listen = addr;
            }

            voxgate::proxy::run_server(config).await
        }

        Commands::Check { config } => {
            let (config, key_sources) = Config::load(config.as_deref())?;
            init_tracing(&config.logging.level);

            println!("Configuration OK");
            for (section, source) in &key_sources {
                println!("  [{}] keys: {}", section, source);
            }
            Ok(())
        }

        Commands::Providers { config } => {
            let (config, _) = Config::load(config.as_deref())?;
            init_tracing(&config.logging.level);

            let tts = KeyPool::from_delimited(
                "tts",
                config.tts.api_keys.as_ref().map(|k| k.expose_secret()),
                config.tts.rotation,
            );
            let chat = KeyPool::from_delimited(
                "chat",
                config.chat.api_keys.as_ref().map(|k| k.expose_secret()),
                config.chat.rotation,
            );

            println!(
                "tts   {}  voice={}  keys={}  rotation={}",
                config.tts.endpoint,
                config.tts.default_voice,
                tts.size(),
                tts.policy()
            );
            println!(
                "chat  {}  model={}  keys={}  rotation={}",
                config.chat.endpoint,
                config.chat.model,
                chat.size(),
                chat.policy()
            );
            Ok(())
        }
    }
}

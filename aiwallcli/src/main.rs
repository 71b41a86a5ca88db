use aiwall_core::{ApplyRequest, Config, ImageSearchClient, ScalingMode, TargetSurface};
use aiwallcli::{build_applier, AiwallCliApp, StdoutNotifier};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Search Unsplash and set wallpapers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print image URLs for a query
    Search {
        #[arg(default_value = "")]
        query: String,
        /// Target height, defaults to the configured screen height
        #[arg(long)]
        height: Option<u32>,
        /// Target width, defaults to the configured screen width
        #[arg(long)]
        width: Option<u32>,
    },
    /// Set an image URL as wallpaper
    Apply {
        url: String,
        /// crop, fit or stretch
        #[arg(long, default_value = "crop")]
        scaling: ScalingMode,
        /// home, lock or both
        #[arg(long, default_value = "home")]
        target: TargetSurface,
    },
    /// Interactive search and pick
    Browse { query: Option<String> },
}

fn init_logging() {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug".to_owned()
        } else {
            "info".to_owned()
        }
    });

    env_logger::Builder::new().parse_filters(&rust_log).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::new()?;

    match cli.command {
        Some(Commands::Search { query, height, width }) => {
            let client = ImageSearchClient::new(config.search_config()?);
            let height = height.unwrap_or(config.screen_height).to_string();
            let width = width.unwrap_or(config.screen_width).to_string();
            for url in client.search_urls(&query, &height, &width).await {
                println!("{}", url);
            }
        }
        Some(Commands::Apply { url, scaling, target }) => {
            // No search here, so no access key is needed
            let applier = build_applier(&config);
            let outcome = applier
                .spawn_apply(ApplyRequest::new(url, scaling, target), Arc::new(StdoutNotifier))
                .await?;
            if !outcome.is_applied() {
                std::process::exit(1);
            }
        }
        Some(Commands::Browse { query }) => {
            AiwallCliApp::with_config(config)?.run(query).await?;
        }
        None => {
            AiwallCliApp::with_config(config)?.run(None).await?;
        }
    }

    Ok(())
}

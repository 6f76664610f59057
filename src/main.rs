use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kiosk::app::AppContext;
use kiosk::cli::{commands, Cli, Commands};
use kiosk::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Headlines { page, limit } => {
            commands::headlines(&ctx, page, limit).await?;
        }
        Commands::Article { id } => {
            commands::article(&ctx, id).await?;
        }
        Commands::Category { slug, page } => {
            commands::category(&ctx, &slug, page).await?;
        }
        Commands::Search { term, page } => {
            commands::search(&ctx, &term, page).await?;
        }
        Commands::Trending { limit } => {
            commands::trending(&ctx, limit).await?;
        }
        Commands::Categories => {
            commands::categories(&ctx).await?;
        }
        Commands::Settings => {
            commands::settings(&ctx).await?;
        }
        Commands::Subscribe { email } => {
            commands::subscribe(&ctx, &email).await?;
        }
        Commands::Tui => {
            kiosk::tui::run(Arc::new(ctx)).await?;
        }
    }

    Ok(())
}

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kiosk")]
#[command(about = "A terminal reader for a news-publishing backend", long_about = None)]
pub struct Cli {
    /// Base URL of the backend API (overrides the config file)
    #[arg(long, env = "KIOSK_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Latest published articles
    Headlines {
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Articles per page
        #[arg(short, long, default_value_t = 12)]
        limit: u32,
    },
    /// Show one article in full
    Article {
        /// Article id
        id: i64,
    },
    /// Articles in a category
    Category {
        /// Category slug, e.g. "politics"
        slug: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Full-text search over published articles
    Search {
        /// Search term
        term: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Most-viewed articles
    Trending {
        /// How many to show
        #[arg(short, long, default_value_t = 5)]
        limit: u32,
    },
    /// List all categories
    Categories,
    /// Show public site settings
    Settings,
    /// Subscribe an email address to the newsletter
    Subscribe {
        /// Email address
        email: String,
    },
    /// Launch the TUI
    Tui,
}

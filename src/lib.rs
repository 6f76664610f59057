//! # Kiosk
//!
//! A terminal client for a headless news-publishing backend.
//!
//! ## Architecture
//!
//! Kiosk reads the backend's public REST API through a layered pipeline:
//!
//! ```text
//! Transport → Services → Query cache → Pages
//! ```
//!
//! - [`api`]: HTTP transport with a 10-second timeout and a small failure
//!   taxonomy (server error / no response / bad request)
//! - [`services`]: typed request builders per resource, response reshaping
//! - [`query`]: keyed client-side cache with staleness windows, request
//!   deduplication, retries, and stale-while-revalidate refetching
//! - [`tui`]: terminal pages built with ratatui
//!
//! ## Quick Start
//!
//! ```bash
//! # Latest headlines
//! kiosk headlines
//!
//! # One article in full
//! kiosk article 42
//!
//! # Search
//! kiosk search "river traffic"
//!
//! # Launch the TUI
//! kiosk tui
//! ```
//!
//! ## Modules
//!
//! - [`app`]: application context and error types
//! - [`carousel`]: auto-advancing media gallery state machine
//! - [`cli`]: command-line interface definitions
//! - [`config`]: configuration loading
//! - [`domain`]: article, category, settings, and media records

/// HTTP transport for the backend API.
///
/// - [`ApiTransport`](api::ApiTransport): async trait seam over the backend
/// - [`HttpClient`](api::HttpClient): reqwest-based implementation
pub mod api;

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the transport and the
/// resource services together for the CLI and TUI.
pub mod app;

/// Media carousel state machine.
///
/// Auto-advances every 5 seconds, suspends while a video plays, and enforces
/// one playing video at a time through
/// [`PlaybackControl`](carousel::PlaybackControl) handles.
pub mod carousel;

/// Command-line interface using clap.
///
/// Defines the CLI structure and subcommands:
/// - `headlines` / `article <id>` / `trending` - article reads
/// - `category <slug>` / `categories` / `search <term>` - discovery
/// - `settings` / `subscribe <email>` - site metadata and newsletter
/// - `tui` - launch the TUI
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/kiosk/config.toml`, supporting:
/// - Backend base URL and timeout
/// - Cache staleness/TTL/retry defaults
/// - Custom colors (named or hex)
pub mod config;

/// Core domain models.
///
/// - [`Article`](domain::Article) / [`ArticlePage`](domain::ArticlePage)
/// - [`Category`](domain::Category), [`PublicSettings`](domain::PublicSettings)
/// - [`MediaItem`](domain::MediaItem) with URL-sniffed [`MediaKind`](domain::MediaKind)
pub mod domain;

/// Client-side query cache.
///
/// An explicit keyed store: entries carry staleness timestamps, retry
/// budgets, subscriber refcounts, and per-key generations so a newer fetch
/// always supersedes an older one that resolves late.
pub mod query;

/// Typed access to each backend resource.
pub mod services;

/// Terminal user interface.
///
/// Routes mirror the website's pages (home, article, category, search), each
/// declaring its queries against the shared cache. The event loop ticks every
/// 250 ms to apply fetch outcomes, evict idle entries, and advance the media
/// carousel.
///
/// Keybindings: j/k navigate, Tab cycles panes, Enter opens, / searches,
/// n/p page, [/] slide, Space plays, Esc back, q quits.
pub mod tui;

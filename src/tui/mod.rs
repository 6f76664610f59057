pub mod app;
pub mod event;
pub mod layout;
pub mod pages;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{DisableFocusChange, EnableFocusChange, KeyCode};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{AppContext, KioskError, Result};
use crate::carousel::{Carousel, PlaybackControl};
use crate::domain::{collect_article_media, MediaKind};
use crate::query::{QueryCache, QueryOptions};

use self::app::{ArticlePane, HomePane, Route, TuiApp};
use self::event::{Action, AppEvent, EventHandler};
use self::pages::RouteQueries;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Drives cache polling, eviction, and carousel timing.
const TICK_RATE: Duration = Duration::from_millis(250);

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_boundary(&mut terminal, ctx).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Top-level boundary: a session error becomes a generic error screen with a
/// full reload as the only recovery, never a torn-down terminal mid-render.
async fn run_boundary(terminal: &mut Tui, ctx: Arc<AppContext>) -> Result<()> {
    loop {
        match run_session(terminal, ctx.clone()).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::error!("TUI session failed: {err}");
                match fatal_screen(terminal, &err)? {
                    Recovery::Reload => continue,
                    Recovery::Quit => return Ok(()),
                }
            }
        }
    }
}

enum Recovery {
    Reload,
    Quit,
}

fn fatal_screen(terminal: &mut Tui, err: &KioskError) -> Result<Recovery> {
    let events = EventHandler::new(TICK_RATE);
    loop {
        terminal.draw(|frame| layout::render_fatal(frame, err))?;
        if let AppEvent::Key(key) = events.next()? {
            match key.code {
                KeyCode::Char('r') => return Ok(Recovery::Reload),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(Recovery::Quit),
                _ => {}
            }
        }
    }
}

async fn run_session(terminal: &mut Tui, ctx: Arc<AppContext>) -> Result<()> {
    let mut app = TuiApp::new();
    let mut cache = QueryCache::new();
    let mut header = RouteQueries::new();
    let mut page = RouteQueries::new();
    let mut carousel: Option<(i64, Carousel)> = None;
    let events = EventHandler::new(TICK_RATE);
    let base = ctx.config.query.base_options();

    let now = Instant::now();
    pages::mount_header(&mut header, &mut cache, &ctx.services, &base, now);
    pages::mount_route(&app.route, &mut page, &mut cache, &ctx.services, &base, now);

    loop {
        terminal.draw(|frame| {
            layout::render(
                frame,
                &app,
                &cache,
                carousel.as_ref().map(|(_, c)| c),
                &ctx.config.theme,
            )
        })?;

        match events.next()? {
            AppEvent::Key(key) => {
                if app.search_input.is_some() {
                    handle_search_input(key.code, &mut app, &mut page, &mut cache, &ctx, &base, &mut carousel);
                } else {
                    handle_action(
                        Action::from(key),
                        &mut app,
                        &mut page,
                        &mut cache,
                        &ctx,
                        &base,
                        &mut carousel,
                    );
                }
            }
            AppEvent::Focus => cache.notify_focus(),
            AppEvent::Tick => {}
        }

        let now = Instant::now();
        if cache.poll(now) > 0 {
            // Outcomes landed; re-run the mount so queries gated on fresh
            // data attach.
            pages::mount_route(&app.route, &mut page, &mut cache, &ctx.services, &base, now);
        }
        cache.evict_expired(now);
        sync_carousel(&mut carousel, &app, &cache, now);
        if let Some((_, gallery)) = carousel.as_mut() {
            gallery.tick(now);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Unmount the old route's queries and mount the current one's. Called after
/// every route change.
fn remount(
    app: &TuiApp,
    page: &mut RouteQueries,
    cache: &mut QueryCache,
    ctx: &Arc<AppContext>,
    base: &QueryOptions,
    carousel: &mut Option<(i64, Carousel)>,
) {
    let now = Instant::now();
    page.unmount_all(cache, now);
    pages::mount_route(&app.route, page, cache, &ctx.services, base, now);
    *carousel = None;
}

#[allow(clippy::too_many_arguments)]
fn handle_action(
    action: Action,
    app: &mut TuiApp,
    page: &mut RouteQueries,
    cache: &mut QueryCache,
    ctx: &Arc<AppContext>,
    base: &QueryOptions,
    carousel: &mut Option<(i64, Carousel)>,
) {
    match action {
        Action::Quit => app.should_quit = true,
        Action::Back => {
            if app.back() {
                remount(app, page, cache, ctx, base, carousel);
            }
        }
        Action::Home => {
            if app.route != Route::Home {
                app.navigate(Route::Home);
                remount(app, page, cache, ctx, base, carousel);
            }
        }
        Action::MoveDown => move_selection(app, cache, 1),
        Action::MoveUp => move_selection(app, cache, -1),
        Action::NextPane | Action::PrevPane => match &app.route {
            Route::Home => {
                app.home_pane = if action == Action::NextPane {
                    app.home_pane.next()
                } else {
                    app.home_pane.prev()
                };
            }
            Route::Article { .. } => {
                app.article_pane = match app.article_pane {
                    ArticlePane::Body => ArticlePane::Related,
                    ArticlePane::Related => ArticlePane::Body,
                };
            }
            _ => {}
        },
        Action::Select => {
            if let Some(route) = selected_route(app, cache) {
                app.navigate(route);
                remount(app, page, cache, ctx, base, carousel);
            }
        }
        Action::NextPage => {
            if paginate(app, cache, 1) {
                remount(app, page, cache, ctx, base, carousel);
            }
        }
        Action::PrevPage => {
            if paginate(app, cache, -1) {
                remount(app, page, cache, ctx, base, carousel);
            }
        }
        Action::SlideNext => {
            if let Some((_, gallery)) = carousel.as_mut() {
                gallery.next();
            }
        }
        Action::SlidePrev => {
            if let Some((_, gallery)) = carousel.as_mut() {
                gallery.previous();
            }
        }
        Action::ToggleVideo => {
            if let Some((_, gallery)) = carousel.as_mut() {
                let current = gallery.current_index();
                gallery.toggle_video(current);
            }
        }
        Action::OpenMedia => {
            if let Some(item) = carousel.as_ref().and_then(|(_, c)| c.current_item()) {
                match open::that_detached(&item.url) {
                    Ok(()) => app.set_status(format!("Opened {}", item.url)),
                    Err(err) => app.set_status(format!("Failed to open: {err}")),
                }
            }
        }
        Action::Search => {
            let prefill = match &app.route {
                Route::Search { query, .. } => query.clone(),
                _ => String::new(),
            };
            app.search_input = Some(prefill);
        }
        Action::Refresh => {
            page.invalidate_all(cache);
            app.set_status("Refreshing...".to_string());
        }
        Action::None => {}
    }
}

fn handle_search_input(
    code: KeyCode,
    app: &mut TuiApp,
    page: &mut RouteQueries,
    cache: &mut QueryCache,
    ctx: &Arc<AppContext>,
    base: &QueryOptions,
    carousel: &mut Option<(i64, Carousel)>,
) {
    match code {
        KeyCode::Esc => app.search_input = None,
        KeyCode::Enter => {
            if let Some(input) = app.search_input.take() {
                let query = input.trim().to_string();
                if !query.is_empty() {
                    app.navigate(Route::Search { query, page: 1 });
                    remount(app, page, cache, ctx, base, carousel);
                }
            }
        }
        KeyCode::Backspace => {
            if let Some(input) = app.search_input.as_mut() {
                input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(input) = app.search_input.as_mut() {
                input.push(c);
            }
        }
        _ => {}
    }
}

fn move_selection(app: &mut TuiApp, cache: &QueryCache, delta: i64) {
    if matches!(app.route, Route::Article { .. }) && app.article_pane == ArticlePane::Body {
        app.body_scroll = if delta > 0 {
            app.body_scroll.saturating_add(1)
        } else {
            app.body_scroll.saturating_sub(1)
        };
        return;
    }

    let len = visible_len(app, cache);
    if len == 0 {
        return;
    }
    if let Some(selection) = app.selection_mut() {
        let next = (*selection as i64 + delta).clamp(0, len as i64 - 1);
        *selection = next as usize;
    }
}

/// How many entries the active pane's list currently shows.
fn visible_len(app: &TuiApp, cache: &QueryCache) -> usize {
    match &app.route {
        Route::Home => match app.home_pane {
            HomePane::Latest => layout::home_latest_articles(cache).len(),
            HomePane::Trending => cache
                .view(&pages::trending_key())
                .data
                .and_then(|d| d.as_articles())
                .map(|a| a.len())
                .unwrap_or(0),
            HomePane::Categories => cache
                .view(&pages::categories_key())
                .data
                .and_then(|d| d.as_categories())
                .map(|c| c.len())
                .unwrap_or(0),
        },
        Route::Article { id } => {
            let category_id = cache
                .view(&pages::article_key(*id))
                .data
                .and_then(|d| d.as_article())
                .and_then(|a| a.category_id);
            cache
                .view(&pages::related_key(*id, category_id))
                .data
                .and_then(|d| d.as_articles())
                .map(|a| a.len())
                .unwrap_or(0)
        }
        Route::Category { slug, page } => listing_len(cache, &pages::category_articles_key(slug, *page)),
        Route::Search { query, page } => listing_len(cache, &pages::search_key(query, *page)),
    }
}

fn listing_len(cache: &QueryCache, key: &crate::query::QueryKey) -> usize {
    cache
        .view(key)
        .data
        .and_then(|d| d.as_page())
        .map(|p| p.articles.len())
        .unwrap_or(0)
}

/// The route the Enter key leads to from the current selection.
fn selected_route(app: &TuiApp, cache: &QueryCache) -> Option<Route> {
    match &app.route {
        Route::Home => match app.home_pane {
            HomePane::Latest => layout::home_latest_articles(cache)
                .get(app.latest_index)
                .map(|article| Route::Article { id: article.id }),
            HomePane::Trending => cache
                .view(&pages::trending_key())
                .data
                .and_then(|d| d.as_articles())
                .and_then(|articles| articles.get(app.trending_index))
                .map(|article| Route::Article { id: article.id }),
            HomePane::Categories => cache
                .view(&pages::categories_key())
                .data
                .and_then(|d| d.as_categories())
                .and_then(|categories| categories.get(app.category_index))
                .map(|category| Route::Category {
                    slug: category.slug.clone(),
                    page: 1,
                }),
        },
        Route::Article { id } => {
            if app.article_pane != ArticlePane::Related {
                return None;
            }
            let category_id = cache
                .view(&pages::article_key(*id))
                .data
                .and_then(|d| d.as_article())
                .and_then(|a| a.category_id);
            cache
                .view(&pages::related_key(*id, category_id))
                .data
                .and_then(|d| d.as_articles())
                .and_then(|articles| articles.get(app.related_index))
                .map(|article| Route::Article { id: article.id })
        }
        Route::Category { slug, page } => cache
            .view(&pages::category_articles_key(slug, *page))
            .data
            .and_then(|d| d.as_page())
            .and_then(|listing| listing.articles.get(app.list_index))
            .map(|article| Route::Article { id: article.id }),
        Route::Search { query, page } => cache
            .view(&pages::search_key(query, *page))
            .data
            .and_then(|d| d.as_page())
            .and_then(|listing| listing.articles.get(app.list_index))
            .map(|article| Route::Article { id: article.id }),
    }
}

/// Step to the adjacent listing page when the current listing allows it.
fn paginate(app: &mut TuiApp, cache: &QueryCache, delta: i32) -> bool {
    let (key, current) = match &app.route {
        Route::Category { slug, page } => (pages::category_articles_key(slug, *page), *page),
        Route::Search { query, page } => (pages::search_key(query, *page), *page),
        _ => return false,
    };
    let Some(listing) = cache.view(&key).data.and_then(|d| d.as_page()) else {
        return false;
    };
    let target = if delta > 0 {
        if !listing.has_next() {
            return false;
        }
        current + 1
    } else {
        if !listing.has_prev() {
            return false;
        }
        current - 1
    };
    match &mut app.route {
        Route::Category { page, .. } | Route::Search { page, .. } => *page = target,
        _ => unreachable!(),
    }
    app.list_index = 0;
    true
}

/// (Re)build the media gallery when the on-screen article changes, wiring an
/// external-player handle to every video slide.
fn sync_carousel(
    carousel: &mut Option<(i64, Carousel)>,
    app: &TuiApp,
    cache: &QueryCache,
    now: Instant,
) {
    let Route::Article { id } = &app.route else {
        *carousel = None;
        return;
    };
    if matches!(carousel.as_ref(), Some((for_id, _)) if for_id == id) {
        return;
    }
    let Some(article) = cache.view(&pages::article_key(*id)).data.and_then(|d| d.as_article())
    else {
        return;
    };

    let items = collect_article_media(article);
    let videos: Vec<(usize, String)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.kind == MediaKind::Video)
        .map(|(index, item)| (index, item.url.clone()))
        .collect();

    let mut gallery = Carousel::new(items, now);
    for (index, url) in videos {
        gallery.register_player(index, Box::new(ExternalPlayer::new(url)));
    }
    *carousel = Some((*id, gallery));
}

/// Hands a video slide to the system's media player. The terminal cannot
/// control the spawned process, so pause and reset only drop tracked state.
struct ExternalPlayer {
    url: String,
    playing: bool,
}

impl ExternalPlayer {
    fn new(url: String) -> Self {
        Self {
            url,
            playing: false,
        }
    }
}

impl PlaybackControl for ExternalPlayer {
    fn play(&mut self) {
        if let Err(err) = open::that_detached(&self.url) {
            tracing::warn!("failed to launch player for {}: {err}", self.url);
        }
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn reset(&mut self) {}

    fn is_playing(&self) -> bool {
        self.playing
    }
}

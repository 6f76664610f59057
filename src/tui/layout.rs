use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::KioskError;
use crate::carousel::Carousel;
use crate::config::ThemeConfig;
use crate::domain::{Article, MediaKind, PublicSettings};
use crate::query::{QueryCache, QueryView};
use crate::tui::app::{ArticlePane, HomePane, Route, TuiApp};
use crate::tui::pages;

const CHECK_BACKEND: &str = "Could not load articles. Is the backend running?";

pub fn render(
    frame: &mut Frame,
    app: &TuiApp,
    cache: &QueryCache,
    carousel: Option<&Carousel>,
    theme: &ThemeConfig,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // masthead
            Constraint::Min(5),    // page
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());

    render_masthead(frame, cache, theme, chunks[0]);
    match &app.route {
        Route::Home => render_home(frame, app, cache, theme, chunks[1]),
        Route::Article { id } => render_article(frame, app, cache, carousel, theme, *id, chunks[1]),
        Route::Category { slug, page } => {
            render_category(frame, app, cache, theme, slug, *page, chunks[1])
        }
        Route::Search { query, page } => {
            render_search(frame, app, cache, theme, query, *page, chunks[1])
        }
    }
    render_status_bar(frame, app, cache, theme, chunks[2]);
}

/// Generic error screen shown by the top-level boundary.
pub fn render_fatal(frame: &mut Frame, err: &KioskError) {
    let area = frame.area();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Something went wrong",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(err.to_string()),
        Line::from(""),
        Line::from("r: Reload    q: Quit"),
    ];
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true })
        .centered();
    frame.render_widget(paragraph, area);
}

fn render_masthead(frame: &mut Frame, cache: &QueryCache, theme: &ThemeConfig, area: Rect) {
    let fallback = PublicSettings::default();
    let view = cache.view(&pages::settings_key());
    let settings = view.data.and_then(|d| d.as_settings()).unwrap_or(&fallback);

    let lines = vec![
        Line::from(Span::styled(
            settings.display_name(),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            settings.display_tagline(),
            Style::default().fg(theme.metadata),
        )),
    ];
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn render_home(frame: &mut Frame, app: &TuiApp, cache: &QueryCache, theme: &ThemeConfig, area: Rect) {
    let featured_view = cache.view(&pages::featured_key());
    let latest_view = cache.view(&pages::latest_key());

    // Nothing loaded and both headline queries failed: one inline message
    // instead of four empty panes.
    let dead = featured_view.data.is_none()
        && latest_view.data.is_none()
        && featured_view.error.is_some()
        && latest_view.error.is_some();
    if dead {
        let paragraph = Paragraph::new(CHECK_BACKEND)
            .style(Style::default().fg(theme.error))
            .block(Block::default().borders(Borders::ALL))
            .centered();
        frame.render_widget(paragraph, area);
        return;
    }

    let featured = featured_view
        .data
        .and_then(|d| d.as_page())
        .and_then(|p| p.articles.first());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if featured.is_some() {
            vec![Constraint::Length(1), Constraint::Min(5)]
        } else {
            vec![Constraint::Length(0), Constraint::Min(5)]
        })
        .split(area);

    if let Some(article) = featured {
        let banner = Line::from(vec![
            Span::styled(
                " BREAKING ",
                Style::default()
                    .fg(theme.status_fg)
                    .bg(theme.error)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                article.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]);
        frame.render_widget(Paragraph::new(banner), chunks[0]);
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Min(30)])
        .split(chunks[1]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Min(4)])
        .split(columns[1]);

    render_latest_pane(frame, app, cache, theme, columns[0]);
    render_trending_pane(frame, app, cache, theme, right[0]);
    render_categories_pane(frame, app, cache, theme, right[1]);
}

/// "Latest" and the page-two "More stories" render as one continuous list.
pub fn home_latest_articles<'a>(cache: &'a QueryCache) -> Vec<&'a Article> {
    let mut articles: Vec<&Article> = Vec::new();
    for key in [pages::latest_key(), pages::more_key()] {
        if let Some(page) = cache.view(&key).data.and_then(|d| d.as_page()) {
            articles.extend(page.articles.iter());
        }
    }
    articles
}

fn render_latest_pane(
    frame: &mut Frame,
    app: &TuiApp,
    cache: &QueryCache,
    theme: &ThemeConfig,
    area: Rect,
) {
    let active = app.home_pane == HomePane::Latest;
    let articles = home_latest_articles(cache);
    let view = cache.view(&pages::latest_key());

    let block = pane_block(format!(" Latest ({}) ", articles.len()), active, theme);
    if let Some(placeholder) = placeholder_for(&view, articles.is_empty(), theme) {
        frame.render_widget(Paragraph::new(placeholder).block(block), area);
        return;
    }

    let items: Vec<ListItem> = articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let date = article.display_date();
            let content = if date.is_empty() {
                article.title.clone()
            } else {
                format!("{}  ({})", article.title, date)
            };
            ListItem::new(content).style(selection_style(i == app.latest_index, active, theme))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn render_trending_pane(
    frame: &mut Frame,
    app: &TuiApp,
    cache: &QueryCache,
    theme: &ThemeConfig,
    area: Rect,
) {
    let active = app.home_pane == HomePane::Trending;
    let view = cache.view(&pages::trending_key());
    let articles = view.data.and_then(|d| d.as_articles()).unwrap_or(&[]);

    let block = pane_block(" Trending ".to_string(), active, theme);
    if let Some(placeholder) = placeholder_for(&view, articles.is_empty(), theme) {
        frame.render_widget(Paragraph::new(placeholder).block(block), area);
        return;
    }

    let items: Vec<ListItem> = articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let content = format!(
                "{}. {} ({} views)",
                i + 1,
                article.title,
                article.view_count()
            );
            ListItem::new(content).style(selection_style(i == app.trending_index, active, theme))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn render_categories_pane(
    frame: &mut Frame,
    app: &TuiApp,
    cache: &QueryCache,
    theme: &ThemeConfig,
    area: Rect,
) {
    let active = app.home_pane == HomePane::Categories;
    let view = cache.view(&pages::categories_key());
    let categories = view.data.and_then(|d| d.as_categories()).unwrap_or(&[]);

    let block = pane_block(" Categories ".to_string(), active, theme);
    if let Some(placeholder) = placeholder_for(&view, categories.is_empty(), theme) {
        frame.render_widget(Paragraph::new(placeholder).block(block), area);
        return;
    }

    let items: Vec<ListItem> = categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            ListItem::new(category.name.clone())
                .style(selection_style(i == app.category_index, active, theme))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn render_article(
    frame: &mut Frame,
    app: &TuiApp,
    cache: &QueryCache,
    carousel: Option<&Carousel>,
    theme: &ThemeConfig,
    id: i64,
    area: Rect,
) {
    let view = cache.view(&pages::article_key(id));
    let Some(article) = view.data.and_then(|d| d.as_article()) else {
        let message = if view.is_loading {
            Text::from("Loading article...")
        } else {
            Text::from(vec![
                Line::from(Span::styled(
                    "Article Not Found",
                    Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from("The article may have been removed or never existed."),
            ])
        };
        let paragraph = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL))
            .centered();
        frame.render_widget(paragraph, area);
        return;
    };

    let related_view = cache.view(&pages::related_key(id, article.category_id));
    let related = related_view.data.and_then(|d| d.as_articles()).unwrap_or(&[]);
    let show_media = carousel.map(|c| !c.is_empty()).unwrap_or(false);

    let mut constraints = vec![Constraint::Min(6)];
    if show_media {
        constraints.push(Constraint::Length(4));
    }
    if !related.is_empty() {
        constraints.push(Constraint::Length((related.len() as u16 + 2).min(6)));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_article_body(frame, app, theme, article, view.error.is_some(), chunks[0]);
    let mut next = 1;
    if show_media {
        if let Some(carousel) = carousel {
            render_media_pane(frame, carousel, theme, chunks[next]);
        }
        next += 1;
    }
    if !related.is_empty() {
        render_related_pane(frame, app, theme, related, chunks[next]);
    }
}

fn render_article_body(
    frame: &mut Frame,
    app: &TuiApp,
    theme: &ThemeConfig,
    article: &Article,
    stale: bool,
    area: Rect,
) {
    let mut lines = Vec::new();
    lines.push(Line::from(Span::styled(
        article.title.clone(),
        Style::default()
            .fg(theme.headline)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    let mut meta: Vec<String> = Vec::new();
    if let Some(category) = &article.category_name {
        meta.push(category.clone());
    }
    let date = article.display_date();
    if !date.is_empty() {
        meta.push(date);
    }
    meta.push(format!("{} views", article.view_count()));
    meta.push(format!("{} min read", article.reading_minutes()));
    lines.push(Line::from(Span::styled(
        meta.join("  |  "),
        Style::default().fg(theme.metadata),
    )));

    let tags = article.tag_list();
    if !tags.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Tags: {}", tags.join(", ")),
            Style::default().fg(theme.metadata),
        )));
    }
    if stale {
        lines.push(Line::from(Span::styled(
            "(showing cached copy; the last refresh failed)",
            Style::default().fg(theme.error),
        )));
    }
    lines.push(Line::from(""));

    if !article.excerpt.is_empty() {
        lines.push(Line::from(Span::styled(
            article.excerpt.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
    }
    for line in article.plain_body().lines() {
        lines.push(Line::from(line.to_string()));
    }

    let active = app.article_pane == ArticlePane::Body;
    let paragraph = Paragraph::new(Text::from(lines))
        .block(pane_block(" Article ".to_string(), active, theme))
        .wrap(Wrap { trim: false })
        .scroll((app.body_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_media_pane(frame: &mut Frame, carousel: &Carousel, theme: &ThemeConfig, area: Rect) {
    let count = carousel.len();
    let current = carousel.current_index();
    let title = format!(" Media ({}/{}) ", current + 1, count);

    let mut lines = Vec::new();
    if let Some(item) = carousel.current_item() {
        let marker = match item.kind {
            MediaKind::Video if carousel.active_video() == Some(current) => "video ▶",
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        };
        lines.push(Line::from(vec![
            Span::styled(format!("[{marker}] "), Style::default().fg(theme.accent)),
            Span::raw(item.url.clone()),
        ]));
    }
    // Indicators only make sense with somewhere to navigate.
    if count > 1 {
        let dots: String = (0..count)
            .map(|i| if i == current { "●" } else { "○" })
            .collect::<Vec<_>>()
            .join(" ");
        let suffix = if carousel.is_auto_advancing() && carousel.active_video().is_none() {
            "  (auto)"
        } else {
            ""
        };
        lines.push(Line::from(Span::styled(
            format!("{dots}{suffix}"),
            Style::default().fg(theme.metadata),
        )));
    }

    let paragraph = Paragraph::new(Text::from(lines)).block(pane_block(title, false, theme));
    frame.render_widget(paragraph, area);
}

fn render_related_pane(
    frame: &mut Frame,
    app: &TuiApp,
    theme: &ThemeConfig,
    related: &[Article],
    area: Rect,
) {
    let active = app.article_pane == ArticlePane::Related;
    let items: Vec<ListItem> = related
        .iter()
        .enumerate()
        .map(|(i, article)| {
            ListItem::new(article.title.clone())
                .style(selection_style(i == app.related_index, active, theme))
        })
        .collect();
    let list = List::new(items).block(pane_block(" Related ".to_string(), active, theme));
    frame.render_widget(list, area);
}

fn render_category(
    frame: &mut Frame,
    app: &TuiApp,
    cache: &QueryCache,
    theme: &ThemeConfig,
    slug: &str,
    page: u32,
    area: Rect,
) {
    let categories_view = cache.view(&pages::categories_key());
    let category = categories_view
        .data
        .and_then(|d| d.as_categories())
        .and_then(|categories| categories.iter().find(|c| c.slug == slug));

    let Some(category) = category else {
        let message = if categories_view.is_loading {
            Text::from("Loading...")
        } else if categories_view.data.is_some() {
            // The list loaded and the slug is not in it.
            Text::from(vec![
                Line::from(Span::styled(
                    "Category Not Found",
                    Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!("No category matches \"{slug}\".")),
            ])
        } else {
            Text::from(Span::styled(
                CHECK_BACKEND,
                Style::default().fg(theme.error),
            ))
        };
        let paragraph = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL))
            .centered();
        frame.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let title = match category.description.as_deref().filter(|d| !d.is_empty()) {
        Some(description) => format!(" {} — {} ", category.name, description),
        None => format!(" {} ", category.name),
    };
    let view = cache.view(&pages::category_articles_key(slug, page));
    render_listing_pane(frame, app, theme, &view, title, chunks[0]);
    render_pagination_line(frame, theme, &view, chunks[1]);
}

fn render_search(
    frame: &mut Frame,
    app: &TuiApp,
    cache: &QueryCache,
    theme: &ThemeConfig,
    query: &str,
    page: u32,
    area: Rect,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    let view = cache.view(&pages::search_key(query, page));
    let total = view.data.and_then(|d| d.as_page()).map(|p| p.total);
    let summary = match total {
        Some(total) => format!("{total} result(s) for \"{query}\""),
        None => format!("Searching for \"{query}\"..."),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(summary, Style::default().fg(theme.metadata))),
        chunks[0],
    );

    render_listing_pane(frame, app, theme, &view, " Results ".to_string(), chunks[1]);
    render_pagination_line(frame, theme, &view, chunks[2]);
}

fn render_listing_pane(
    frame: &mut Frame,
    app: &TuiApp,
    theme: &ThemeConfig,
    view: &QueryView<'_>,
    title: String,
    area: Rect,
) {
    let articles = view
        .data
        .and_then(|d| d.as_page())
        .map(|p| p.articles.as_slice())
        .unwrap_or(&[]);

    let block = pane_block(title, true, theme);
    if let Some(placeholder) = placeholder_for(view, articles.is_empty(), theme) {
        frame.render_widget(Paragraph::new(placeholder).block(block), area);
        return;
    }

    let items: Vec<ListItem> = articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let date = article.display_date();
            let content = if date.is_empty() {
                article.title.clone()
            } else {
                format!("{}  ({})", article.title, date)
            };
            ListItem::new(content).style(selection_style(i == app.list_index, true, theme))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn render_pagination_line(
    frame: &mut Frame,
    theme: &ThemeConfig,
    view: &QueryView<'_>,
    area: Rect,
) {
    let Some(listing) = view.data.and_then(|d| d.as_page()) else {
        return;
    };
    if listing.total_pages() <= 1 {
        return;
    }
    let mut parts = Vec::new();
    if listing.has_prev() {
        parts.push("p:Prev".to_string());
    }
    parts.push(format!("Page {} of {}", listing.page, listing.total_pages()));
    if listing.has_next() {
        parts.push("n:Next".to_string());
    }
    frame.render_widget(
        Paragraph::new(Span::styled(
            parts.join("   "),
            Style::default().fg(theme.metadata),
        )),
        area,
    );
}

fn render_status_bar(
    frame: &mut Frame,
    app: &TuiApp,
    cache: &QueryCache,
    theme: &ThemeConfig,
    area: Rect,
) {
    let status = if let Some(input) = &app.search_input {
        format!("Search: {input}█   Enter:Run  Esc:Cancel")
    } else if let Some(message) = &app.status_message {
        message.clone()
    } else if route_fetching(&app.route, cache) {
        "Loading...".to_string()
    } else {
        match &app.route {
            Route::Home => {
                "j/k:Move  Tab:Pane  Enter:Open  /:Search  R:Refresh  q:Quit".to_string()
            }
            Route::Article { .. } => {
                "j/k:Scroll  Tab:Related  [/]:Slide  Space:Play  o:Open  Esc:Back".to_string()
            }
            Route::Category { .. } | Route::Search { .. } => {
                "j/k:Move  Enter:Open  n/p:Page  /:Search  Esc:Back  q:Quit".to_string()
            }
        }
    };

    let paragraph = Paragraph::new(status)
        .style(Style::default().fg(theme.status_fg).bg(theme.status_bg));
    frame.render_widget(paragraph, area);
}

/// Any outstanding fetch for the route's primary queries, background
/// revalidation included.
fn route_fetching(route: &Route, cache: &QueryCache) -> bool {
    match route {
        Route::Home => {
            cache.is_fetching(&pages::featured_key())
                || cache.is_fetching(&pages::latest_key())
                || cache.is_fetching(&pages::trending_key())
        }
        Route::Article { id } => cache.is_fetching(&pages::article_key(*id)),
        Route::Category { slug, page } => {
            cache.is_fetching(&pages::categories_key())
                || cache.is_fetching(&pages::category_articles_key(slug, *page))
        }
        Route::Search { query, page } => cache.is_fetching(&pages::search_key(query, *page)),
    }
}

fn pane_block(title: String, active: bool, theme: &ThemeConfig) -> Block<'static> {
    let border_style = if active {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.border)
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn selection_style(selected: bool, active: bool, theme: &ThemeConfig) -> Style {
    if selected && active {
        Style::default()
            .bg(theme.accent)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else if selected {
        Style::default().bg(theme.border)
    } else {
        Style::default()
    }
}

/// Loading/error/empty substitute text for a list pane, or None when the
/// data should render.
fn placeholder_for<'a>(
    view: &QueryView<'_>,
    empty: bool,
    theme: &ThemeConfig,
) -> Option<Text<'a>> {
    if view.is_loading {
        return Some(Text::from("Loading..."));
    }
    if view.error.is_some() && view.data.is_none() {
        return Some(Text::from(Span::styled(
            CHECK_BACKEND.to_string(),
            Style::default().fg(theme.error),
        )));
    }
    if empty {
        return Some(Text::from("Nothing here yet"));
    }
    None
}

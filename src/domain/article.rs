use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

/// A published article as the backend returns it.
///
/// The backend owns validation; fields here are tolerated as missing or null
/// so a half-filled record still renders.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub featured_image: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub tags: Option<String>,
    pub status: Option<String>,
    pub views: Option<i64>,
    pub published_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Article {
    /// Publication date formatted for display, e.g. "January 5, 2025".
    ///
    /// Prefers `published_at`, falls back to `created_at`, then to the raw
    /// string when the timestamp doesn't parse.
    pub fn display_date(&self) -> String {
        let raw = match self.published_at.as_deref().or(self.created_at.as_deref()) {
            Some(s) if !s.is_empty() => s,
            _ => return String::new(),
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.format("%B %-d, %Y").to_string();
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return dt.format("%B %-d, %Y").to_string();
        }
        raw.to_string()
    }

    /// Estimated reading time at 200 words per minute, never less than one.
    pub fn reading_minutes(&self) -> u64 {
        let words = self.body.split_whitespace().count() as u64;
        words.div_ceil(200).max(1)
    }

    /// Comma-separated tags split into clean entries.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn view_count(&self) -> i64 {
        self.views.unwrap_or(0)
    }

    /// Body as renderable text: tags stripped, entities decoded, block-level
    /// closers and `<br>` turned into line breaks.
    pub fn plain_body(&self) -> String {
        const BLOCK_TAGS: &[&str] = &["p", "div", "h1", "h2", "h3", "h4", "li", "ul", "ol"];

        let mut text = String::new();
        let mut tag = String::new();
        let mut in_tag = false;

        for c in self.body.chars() {
            match c {
                '<' => {
                    in_tag = true;
                    tag.clear();
                }
                '>' if in_tag => {
                    in_tag = false;
                    let name = tag
                        .trim_start_matches('/')
                        .split([' ', '/'])
                        .next()
                        .unwrap_or("");
                    let closing = tag.starts_with('/');
                    if name.eq_ignore_ascii_case("br")
                        || (closing && BLOCK_TAGS.iter().any(|b| name.eq_ignore_ascii_case(b)))
                    {
                        text.push('\n');
                    }
                }
                _ if in_tag => tag.push(c),
                _ => text.push(c),
            }
        }

        let decoded = html_escape::decode_html_entities(&text);
        let mut lines: Vec<&str> = Vec::new();
        for line in decoded.lines() {
            let line = line.trim();
            if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
                continue;
            }
            lines.push(line);
        }
        while lines.last() == Some(&"") {
            lines.pop();
        }
        lines.join("\n")
    }
}

/// One page of an article listing, flattened from the backend's
/// `{ articles, pagination }` envelope.
#[derive(Debug, Clone, Default)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl ArticlePage {
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        (self.total.div_ceil(self.limit as u64)) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

//! Client-side query cache.
//!
//! Pages declare reads as (key, fetcher, options) subscriptions; the cache
//! deduplicates in-flight fetches, serves stale data while revalidating,
//! retries failures, and evicts entries nobody has used for a while. See
//! [`QueryCache`] for the full contract.

pub mod cache;

pub use cache::{QueryCache, QueryView};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::domain::{Article, ArticlePage, Category, PublicSettings};

/// One segment of a query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Str(String),
    Int(i64),
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s)
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        KeyPart::Int(n)
    }
}

impl From<u32> for KeyPart {
    fn from(n: u32) -> Self {
        KeyPart::Int(n as i64)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => f.write_str(s),
            KeyPart::Int(n) => write!(f, "{n}"),
        }
    }
}

/// Structural identity of a query: an ordered tuple of primitives, compared
/// by value. Two subscribers with equal keys share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    pub fn new(name: impl Into<KeyPart>) -> Self {
        Self(vec![name.into()])
    }

    pub fn part(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// Per-query behavior knobs. The defaults match what most pages want; call
/// sites override individual fields with struct-update syntax.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Fetch at all? Disabled queries sit idle until re-subscribed enabled.
    pub enabled: bool,
    /// How long after a successful fetch the data counts as fresh.
    pub stale_time: Duration,
    /// How long an unused entry survives before eviction.
    pub cache_time: Duration,
    /// Extra attempts after a failed fetch.
    pub retry: u32,
    /// Refetch on every subscribe, even when fresh.
    pub refetch_on_mount: bool,
    /// Refetch when the terminal regains focus.
    pub refetch_on_focus: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: Duration::ZERO,
            cache_time: Duration::from_secs(5 * 60),
            retry: 1,
            refetch_on_mount: false,
            refetch_on_focus: false,
        }
    }
}

/// Fetch lifecycle for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything a query can resolve to. A closed set keeps the cache free of
/// downcasts; each page knows which variant its key produces.
#[derive(Debug, Clone)]
pub enum QueryData {
    Page(ArticlePage),
    Article(Box<Article>),
    Articles(Vec<Article>),
    Categories(Vec<Category>),
    Settings(PublicSettings),
}

impl QueryData {
    pub fn as_page(&self) -> Option<&ArticlePage> {
        match self {
            QueryData::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_article(&self) -> Option<&Article> {
        match self {
            QueryData::Article(article) => Some(article),
            _ => None,
        }
    }

    pub fn as_articles(&self) -> Option<&[Article]> {
        match self {
            QueryData::Articles(articles) => Some(articles),
            _ => None,
        }
    }

    pub fn as_categories(&self) -> Option<&[Category]> {
        match self {
            QueryData::Categories(categories) => Some(categories),
            _ => None,
        }
    }

    pub fn as_settings(&self) -> Option<&PublicSettings> {
        match self {
            QueryData::Settings(settings) => Some(settings),
            _ => None,
        }
    }
}

/// Error surfaced to views. Carries only the rendered message; the transport
/// already logged the details.
#[derive(Debug, Clone)]
pub struct QueryError(pub String);

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<crate::app::KioskError> for QueryError {
    fn from(err: crate::app::KioskError) -> Self {
        QueryError(err.to_string())
    }
}

pub type QueryResult = std::result::Result<QueryData, QueryError>;
pub type QueryFuture = BoxFuture<'static, QueryResult>;

/// Stored fetcher: re-invocable for retries and refetches, shared with the
/// task driving the current attempt.
pub type QueryFetcher = Arc<dyn Fn() -> QueryFuture + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_compare_structurally() {
        let a = QueryKey::new("articles").part("category").part(3i64).part(2u32);
        let b = QueryKey::new("articles").part("category").part(3i64).part(2u32);
        let c = QueryKey::new("articles").part("category").part(3i64).part(3u32);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_key_display_joins_parts() {
        let key = QueryKey::new("article").part(42i64);
        assert_eq!(key.to_string(), "article/42");
    }

    #[test]
    fn test_default_options() {
        let options = QueryOptions::default();
        assert!(options.enabled);
        assert_eq!(options.retry, 1);
        assert_eq!(options.stale_time, Duration::ZERO);
        assert_eq!(options.cache_time, Duration::from_secs(300));
        assert!(!options.refetch_on_mount);
        assert!(!options.refetch_on_focus);
    }
}

//! Query declarations per page.
//!
//! Each route subscribes a fixed set of queries when it mounts; [`mount_route`]
//! is also re-run whenever fetch outcomes land, so queries gated on
//! previously-fetched data (a resolved category, a loaded article) attach as
//! soon as their precondition holds.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::query::{
    QueryCache, QueryData, QueryError, QueryKey, QueryOptions, QueryResult,
};
use crate::services::{ArticleFilter, Services};

use super::app::Route;

pub const PAGE_SIZE: u32 = 12;
pub const HOME_LATEST_LIMIT: u32 = 6;
pub const HOME_MORE_LIMIT: u32 = 12;
pub const TRENDING_LIMIT: u32 = 5;
pub const RELATED_LIMIT: u32 = 4;

pub fn featured_key() -> QueryKey {
    QueryKey::new("articles").part("featured")
}

pub fn latest_key() -> QueryKey {
    QueryKey::new("articles").part("latest")
}

pub fn more_key() -> QueryKey {
    QueryKey::new("articles").part("more")
}

pub fn trending_key() -> QueryKey {
    QueryKey::new("articles").part("trending")
}

pub fn categories_key() -> QueryKey {
    QueryKey::new("categories")
}

pub fn settings_key() -> QueryKey {
    QueryKey::new("site-settings")
}

pub fn article_key(id: i64) -> QueryKey {
    QueryKey::new("article").part(id)
}

pub fn related_key(id: i64, category_id: Option<i64>) -> QueryKey {
    QueryKey::new("related-articles")
        .part(id)
        .part(category_id.unwrap_or(0))
}

pub fn category_articles_key(slug: &str, page: u32) -> QueryKey {
    QueryKey::new("articles")
        .part("category")
        .part(slug.to_string())
        .part(page)
}

pub fn search_key(query: &str, page: u32) -> QueryKey {
    QueryKey::new("articles")
        .part("search")
        .part(query.to_string())
        .part(page)
}

/// The subscriptions one mounted page holds, so a route change releases
/// exactly those and nothing another page still uses.
pub struct RouteQueries {
    mounted: Vec<(QueryKey, bool)>,
}

impl RouteQueries {
    pub fn new() -> Self {
        Self {
            mounted: Vec::new(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.mounted.iter().map(|(key, _)| key)
    }

    /// Subscribe at most once per key for the lifetime of the page. A query
    /// first mounted disabled is re-subscribed (with the fresh fetcher) when
    /// its `enabled` flag turns true; the paired unsubscribe keeps the entry
    /// at one subscriber per page.
    pub fn subscribe<F, Fut>(
        &mut self,
        cache: &mut QueryCache,
        key: QueryKey,
        options: QueryOptions,
        fetch: F,
        now: Instant,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = QueryResult> + Send + 'static,
    {
        let enabled = options.enabled;
        if let Some(entry) = self.mounted.iter_mut().find(|(k, _)| *k == key) {
            if !entry.1 && enabled {
                cache.subscribe(key.clone(), options, fetch, now);
                cache.unsubscribe(&key, now);
                entry.1 = true;
            }
            return;
        }
        cache.subscribe(key.clone(), options, fetch, now);
        self.mounted.push((key, enabled));
    }

    pub fn unmount_all(&mut self, cache: &mut QueryCache, now: Instant) {
        for (key, _) in self.mounted.drain(..) {
            cache.unsubscribe(&key, now);
        }
    }

    pub fn invalidate_all(&self, cache: &mut QueryCache) {
        for (key, _) in &self.mounted {
            cache.invalidate(key);
        }
    }
}

impl Default for RouteQueries {
    fn default() -> Self {
        Self::new()
    }
}

/// Masthead data, mounted once per session: the category list and the public
/// site settings. Settings revalidate on focus so a rebrand shows up without
/// a restart.
pub fn mount_header(
    queries: &mut RouteQueries,
    cache: &mut QueryCache,
    services: &Arc<Services>,
    base: &QueryOptions,
    now: Instant,
) {
    subscribe_categories(queries, cache, services, base, now);

    let svc = services.clone();
    queries.subscribe(
        cache,
        settings_key(),
        QueryOptions {
            stale_time: Duration::from_secs(60),
            retry: 1,
            refetch_on_mount: true,
            refetch_on_focus: true,
            ..base.clone()
        },
        move || {
            let svc = svc.clone();
            async move {
                svc.settings
                    .public()
                    .await
                    .map(QueryData::Settings)
                    .map_err(QueryError::from)
            }
        },
        now,
    );
}

/// Subscribe everything the current route reads. Safe to call repeatedly;
/// already-mounted keys are skipped.
pub fn mount_route(
    route: &Route,
    queries: &mut RouteQueries,
    cache: &mut QueryCache,
    services: &Arc<Services>,
    base: &QueryOptions,
    now: Instant,
) {
    match route {
        Route::Home => mount_home(queries, cache, services, base, now),
        Route::Article { id } => mount_article(*id, queries, cache, services, base, now),
        Route::Category { slug, page } => {
            mount_category(slug, *page, queries, cache, services, base, now)
        }
        Route::Search { query, page } => {
            mount_search(query, *page, queries, cache, services, base, now)
        }
    }
}

fn mount_home(
    queries: &mut RouteQueries,
    cache: &mut QueryCache,
    services: &Arc<Services>,
    base: &QueryOptions,
    now: Instant,
) {
    let no_retry = QueryOptions {
        retry: 0,
        ..base.clone()
    };

    subscribe_listing(
        queries,
        cache,
        services,
        featured_key(),
        no_retry.clone(),
        ArticleFilter {
            page: Some(1),
            limit: Some(1),
            ..ArticleFilter::default()
        },
        now,
    );
    subscribe_listing(
        queries,
        cache,
        services,
        latest_key(),
        no_retry.clone(),
        ArticleFilter {
            page: Some(1),
            limit: Some(HOME_LATEST_LIMIT),
            ..ArticleFilter::default()
        },
        now,
    );
    subscribe_listing(
        queries,
        cache,
        services,
        more_key(),
        no_retry.clone(),
        ArticleFilter {
            page: Some(2),
            limit: Some(HOME_MORE_LIMIT),
            ..ArticleFilter::default()
        },
        now,
    );

    let svc = services.clone();
    queries.subscribe(
        cache,
        trending_key(),
        no_retry,
        move || {
            let svc = svc.clone();
            async move {
                svc.articles
                    .trending(Some(TRENDING_LIMIT))
                    .await
                    .map(QueryData::Articles)
                    .map_err(QueryError::from)
            }
        },
        now,
    );

    subscribe_categories(queries, cache, services, base, now);
}

fn mount_article(
    id: i64,
    queries: &mut RouteQueries,
    cache: &mut QueryCache,
    services: &Arc<Services>,
    base: &QueryOptions,
    now: Instant,
) {
    let svc = services.clone();
    queries.subscribe(
        cache,
        article_key(id),
        base.clone(),
        move || {
            let svc = svc.clone();
            async move {
                svc.articles
                    .by_id(id)
                    .await
                    .map(|article| QueryData::Article(Box::new(article)))
                    .map_err(QueryError::from)
            }
        },
        now,
    );

    // Related articles wait for the article itself, which carries the
    // category the backend biases toward.
    let loaded = cache
        .view(&article_key(id))
        .data
        .and_then(|d| d.as_article())
        .map(|article| article.category_id);
    let (enabled, category_id) = match loaded {
        Some(category_id) => (true, category_id),
        None => (false, None),
    };

    let svc = services.clone();
    queries.subscribe(
        cache,
        related_key(id, category_id),
        QueryOptions {
            enabled,
            ..base.clone()
        },
        move || {
            let svc = svc.clone();
            async move {
                svc.articles
                    .related(id, category_id, Some(RELATED_LIMIT))
                    .await
                    .map(QueryData::Articles)
                    .map_err(QueryError::from)
            }
        },
        now,
    );
}

fn mount_category(
    slug: &str,
    page: u32,
    queries: &mut RouteQueries,
    cache: &mut QueryCache,
    services: &Arc<Services>,
    base: &QueryOptions,
    now: Instant,
) {
    subscribe_categories(queries, cache, services, base, now);

    // The listing query stays disabled until the slug resolves to an id;
    // an unknown slug is the client-detected not-found case.
    let category_id = resolve_category(cache, slug);
    subscribe_listing(
        queries,
        cache,
        services,
        category_articles_key(slug, page),
        QueryOptions {
            enabled: category_id.is_some(),
            ..base.clone()
        },
        ArticleFilter {
            page: Some(page),
            limit: Some(PAGE_SIZE),
            category: category_id,
            ..ArticleFilter::default()
        },
        now,
    );
}

fn mount_search(
    query: &str,
    page: u32,
    queries: &mut RouteQueries,
    cache: &mut QueryCache,
    services: &Arc<Services>,
    base: &QueryOptions,
    now: Instant,
) {
    subscribe_listing(
        queries,
        cache,
        services,
        search_key(query, page),
        QueryOptions {
            enabled: !query.is_empty(),
            ..base.clone()
        },
        ArticleFilter {
            page: Some(page),
            limit: Some(PAGE_SIZE),
            search: Some(query.to_string()),
            ..ArticleFilter::default()
        },
        now,
    );
}

/// Look a slug up in the cached category list.
pub fn resolve_category(cache: &QueryCache, slug: &str) -> Option<i64> {
    cache
        .view(&categories_key())
        .data
        .and_then(|d| d.as_categories())
        .and_then(|categories| categories.iter().find(|c| c.slug == slug))
        .map(|category| category.id)
}

fn subscribe_categories(
    queries: &mut RouteQueries,
    cache: &mut QueryCache,
    services: &Arc<Services>,
    base: &QueryOptions,
    now: Instant,
) {
    let svc = services.clone();
    queries.subscribe(
        cache,
        categories_key(),
        QueryOptions {
            stale_time: Duration::from_secs(5 * 60),
            retry: 0,
            ..base.clone()
        },
        move || {
            let svc = svc.clone();
            async move {
                svc.categories
                    .all()
                    .await
                    .map(QueryData::Categories)
                    .map_err(QueryError::from)
            }
        },
        now,
    );
}

fn subscribe_listing(
    queries: &mut RouteQueries,
    cache: &mut QueryCache,
    services: &Arc<Services>,
    key: QueryKey,
    options: QueryOptions,
    filter: ArticleFilter,
    now: Instant,
) {
    let svc = services.clone();
    queries.subscribe(
        cache,
        key,
        options,
        move || {
            let svc = svc.clone();
            let filter = filter.clone();
            async move {
                svc.articles
                    .published(&filter)
                    .await
                    .map(QueryData::Page)
                    .map_err(QueryError::from)
            }
        },
        now,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::api::{ApiError, ApiTransport};
    use crate::query::QueryStatus;

    /// Transport with canned bodies per path prefix.
    struct CannedTransport;

    #[async_trait]
    impl ApiTransport for CannedTransport {
        async fn get_json(&self, path: &str, _query: &[(&str, String)]) -> Result<Value, ApiError> {
            if path.starts_with("categories") {
                return Ok(json!([
                    { "id": 3, "name": "Politics", "slug": "politics" },
                ]));
            }
            if path.starts_with("settings") {
                return Ok(json!({ "site_name": "Kiosk Daily" }));
            }
            if path == "articles/public/7" {
                return Ok(json!({ "id": 7, "title": "Loaded", "category_id": 3 }));
            }
            Ok(json!({ "articles": [], "pagination": { "total": 0, "page": 1, "limit": 12 } }))
        }

        async fn post_json(&self, _path: &str, _body: Value) -> Result<Value, ApiError> {
            Ok(json!({}))
        }
    }

    fn services() -> Arc<Services> {
        Arc::new(Services::new(Arc::new(CannedTransport)))
    }

    #[tokio::test]
    async fn test_home_mounts_five_queries() {
        let mut cache = QueryCache::new();
        let mut queries = RouteQueries::new();
        let now = Instant::now();

        mount_route(
            &Route::Home,
            &mut queries,
            &mut cache,
            &services(),
            &QueryOptions::default(),
            now,
        );

        assert_eq!(cache.len(), 5);
        for key in [featured_key(), latest_key(), more_key(), trending_key(), categories_key()] {
            assert!(cache.is_fetching(&key), "expected fetch for {key}");
        }
    }

    #[tokio::test]
    async fn test_remount_does_not_double_subscribe() {
        let mut cache = QueryCache::new();
        let mut queries = RouteQueries::new();
        let svc = services();
        let base = QueryOptions::default();
        let now = Instant::now();

        mount_route(&Route::Home, &mut queries, &mut cache, &svc, &base, now);
        cache.join_in_flight().await;
        cache.poll(now);
        mount_route(&Route::Home, &mut queries, &mut cache, &svc, &base, now);

        queries.unmount_all(&mut cache, now);
        // One subscriber per key: everything is evictable after one unmount.
        assert_eq!(
            cache.evict_expired(now + Duration::from_secs(3600)),
            5
        );
    }

    #[tokio::test]
    async fn test_empty_search_stays_idle() {
        let mut cache = QueryCache::new();
        let mut queries = RouteQueries::new();
        let now = Instant::now();

        let route = Route::Search {
            query: String::new(),
            page: 1,
        };
        mount_route(&route, &mut queries, &mut cache, &services(), &QueryOptions::default(), now);

        let key = search_key("", 1);
        assert!(!cache.is_fetching(&key));
        assert_eq!(cache.status(&key), QueryStatus::Idle);
    }

    #[tokio::test]
    async fn test_category_listing_waits_for_slug_resolution() {
        let mut cache = QueryCache::new();
        let mut queries = RouteQueries::new();
        let svc = services();
        let base = QueryOptions::default();
        let now = Instant::now();

        let route = Route::Category {
            slug: "politics".to_string(),
            page: 1,
        };
        mount_route(&route, &mut queries, &mut cache, &svc, &base, now);

        let listing = category_articles_key("politics", 1);
        assert!(!cache.is_fetching(&listing));

        // Categories land; the remount flips the listing query enabled.
        cache.join_in_flight().await;
        cache.poll(now);
        mount_route(&route, &mut queries, &mut cache, &svc, &base, now);

        assert!(cache.is_fetching(&listing));
        cache.join_in_flight().await;
        cache.poll(now);
        assert_eq!(cache.status(&listing), QueryStatus::Success);
    }

    #[tokio::test]
    async fn test_unknown_slug_never_fetches_listing() {
        let mut cache = QueryCache::new();
        let mut queries = RouteQueries::new();
        let svc = services();
        let base = QueryOptions::default();
        let now = Instant::now();

        let route = Route::Category {
            slug: "no-such-section".to_string(),
            page: 1,
        };
        mount_route(&route, &mut queries, &mut cache, &svc, &base, now);
        cache.join_in_flight().await;
        cache.poll(now);
        mount_route(&route, &mut queries, &mut cache, &svc, &base, now);

        assert!(resolve_category(&cache, "no-such-section").is_none());
        assert_eq!(
            cache.status(&category_articles_key("no-such-section", 1)),
            QueryStatus::Idle
        );
    }

    #[tokio::test]
    async fn test_related_attaches_after_article_loads() {
        let mut cache = QueryCache::new();
        let mut queries = RouteQueries::new();
        let svc = services();
        let base = QueryOptions::default();
        let now = Instant::now();

        let route = Route::Article { id: 7 };
        mount_route(&route, &mut queries, &mut cache, &svc, &base, now);
        assert!(!cache.is_fetching(&related_key(7, Some(3))));

        cache.join_in_flight().await;
        cache.poll(now);
        mount_route(&route, &mut queries, &mut cache, &svc, &base, now);

        // The loaded article carries category 3, so the keyed related query
        // fires against it.
        assert!(cache.is_fetching(&related_key(7, Some(3))));
    }

    #[tokio::test]
    async fn test_header_settings_refetch_on_focus() {
        let mut cache = QueryCache::new();
        let mut queries = RouteQueries::new();
        let now = Instant::now();

        mount_header(&mut queries, &mut cache, &services(), &QueryOptions::default(), now);
        cache.join_in_flight().await;
        cache.poll(now);

        cache.notify_focus();
        assert!(cache.is_fetching(&settings_key()));
        // Categories did not opt in.
        assert!(!cache.is_fetching(&categories_key()));
    }
}

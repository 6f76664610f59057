use std::sync::Arc;

use serde_json::Value;

use crate::api::ApiTransport;
use crate::app::Result;
use crate::domain::{Article, ArticlePage};

/// Filters for the published-articles listing. All optional; the backend
/// applies its own defaults for anything omitted.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<i64>,
    pub search: Option<String>,
}

impl ArticleFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(category) = self.category {
            query.push(("category", category.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        query
    }
}

pub struct ArticlesService {
    transport: Arc<dyn ApiTransport>,
}

impl ArticlesService {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Published articles, newest first, with pagination flattened out of the
    /// backend's `{ articles, pagination }` envelope.
    pub async fn published(&self, filter: &ArticleFilter) -> Result<ArticlePage> {
        let data = self
            .transport
            .get_json("articles/public", &filter.to_query())
            .await?;
        flatten_page(data)
    }

    pub async fn by_id(&self, id: i64) -> Result<Article> {
        let data = self
            .transport
            .get_json(&format!("articles/public/{id}"), &[])
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Most-viewed articles. The backend decides the window.
    pub async fn trending(&self, limit: Option<u32>) -> Result<Vec<Article>> {
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let data = self
            .transport
            .get_json("articles/public/trending", &query)
            .await?;
        article_list(&data)
    }

    /// Articles related to `id`, biased toward the same category.
    pub async fn related(
        &self,
        id: i64,
        category_id: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Article>> {
        let mut query = vec![("id", id.to_string())];
        if let Some(category_id) = category_id {
            query.push(("category", category_id.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let data = self
            .transport
            .get_json("articles/public/related", &query)
            .await?;
        article_list(&data)
    }
}

/// Flatten `{ articles, pagination: { total, page, limit } }`, defaulting
/// each missing piece (`[]`, 0, 1, 10) so a sparse payload still renders.
fn flatten_page(data: Value) -> Result<ArticlePage> {
    let articles: Vec<Article> = match data.get("articles") {
        Some(value) if !value.is_null() => serde_json::from_value(value.clone())?,
        _ => Vec::new(),
    };

    let pagination = data.get("pagination");
    let total = pagination
        .and_then(|p| p.get("total"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let page = pagination
        .and_then(|p| p.get("page"))
        .and_then(Value::as_u64)
        .unwrap_or(1) as u32;
    let limit = pagination
        .and_then(|p| p.get("limit"))
        .and_then(Value::as_u64)
        .unwrap_or(10) as u32;

    Ok(ArticlePage {
        articles,
        total,
        page,
        limit,
    })
}

fn article_list(data: &Value) -> Result<Vec<Article>> {
    match data.get("articles") {
        Some(value) if !value.is_null() => Ok(serde_json::from_value(value.clone())?),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::api::HttpClient;

    fn service_for(server: &MockServer) -> ArticlesService {
        let transport =
            HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        ArticlesService::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_published_flattens_pagination() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/articles/public")
                .query_param("page", "1")
                .query_param("limit", "12");
            then.status(200).json_body(json!({
                "articles": [
                    { "id": 1, "title": "First" },
                    { "id": 2, "title": "Second" },
                ],
                "pagination": { "total": 50, "page": 1, "limit": 12 },
            }));
        });

        let service = service_for(&server);
        let page = service
            .published(&ArticleFilter {
                page: Some(1),
                limit: Some(12),
                ..ArticleFilter::default()
            })
            .await
            .unwrap();

        mock.assert();
        assert_eq!(page.articles.len(), 2);
        assert_eq!(page.total, 50);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 12);
        assert_eq!(page.total_pages(), 5);
    }

    #[tokio::test]
    async fn test_published_defaults_for_sparse_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/articles/public");
            then.status(200).json_body(json!({}));
        });

        let service = service_for(&server);
        let page = service.published(&ArticleFilter::default()).await.unwrap();

        assert!(page.articles.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
    }

    #[tokio::test]
    async fn test_published_passes_category_and_search() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/articles/public")
                .query_param("category", "3")
                .query_param("search", "congo river");
            then.status(200).json_body(json!({ "articles": [] }));
        });

        let service = service_for(&server);
        service
            .published(&ArticleFilter {
                category: Some(3),
                search: Some("congo river".to_string()),
                ..ArticleFilter::default()
            })
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_by_id_decodes_article() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/articles/public/42");
            then.status(200).json_body(json!({
                "id": 42,
                "title": "Deep dive",
                "body": "text",
                "views": 7,
            }));
        });

        let service = service_for(&server);
        let article = service.by_id(42).await.unwrap();
        assert_eq!(article.id, 42);
        assert_eq!(article.view_count(), 7);
    }

    #[tokio::test]
    async fn test_trending_unwraps_articles_field() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/articles/public/trending")
                .query_param("limit", "5");
            then.status(200).json_body(json!({
                "articles": [{ "id": 9, "title": "Hot" }],
            }));
        });

        let service = service_for(&server);
        let articles = service.trending(Some(5)).await.unwrap();
        mock.assert();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, 9);
    }

    #[tokio::test]
    async fn test_related_sends_id_and_category() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/articles/public/related")
                .query_param("id", "42")
                .query_param("category", "3")
                .query_param("limit", "4");
            then.status(200).json_body(json!({ "articles": [] }));
        });

        let service = service_for(&server);
        let related = service.related(42, Some(3), Some(4)).await.unwrap();
        mock.assert();
        assert!(related.is_empty());
    }

    #[test]
    fn test_flatten_page_tolerates_null_articles() {
        let page = flatten_page(json!({ "articles": null })).unwrap();
        assert!(page.articles.is_empty());
        assert_eq!(page.limit, 10);
    }
}

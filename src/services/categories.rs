use std::sync::Arc;

use crate::api::ApiTransport;
use crate::app::Result;
use crate::domain::Category;

pub struct CategoriesService {
    transport: Arc<dyn ApiTransport>,
}

impl CategoriesService {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Every public category. The backend returns a bare array.
    pub async fn all(&self) -> Result<Vec<Category>> {
        let data = self.transport.get_json("categories/public", &[]).await?;
        Ok(serde_json::from_value(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::api::HttpClient;

    #[tokio::test]
    async fn test_all_decodes_bare_array() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/categories/public");
            then.status(200).json_body(json!([
                { "id": 1, "name": "Politics", "slug": "politics" },
                { "id": 2, "name": "Sports", "slug": "sports" },
            ]));
        });

        let transport = HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        let service = CategoriesService::new(Arc::new(transport));
        let categories = service.all().await.unwrap();

        mock.assert();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].slug, "sports");
    }
}

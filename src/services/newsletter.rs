use std::sync::Arc;

use serde_json::json;

use crate::api::ApiTransport;
use crate::app::Result;

pub struct NewsletterService {
    transport: Arc<dyn ApiTransport>,
}

impl NewsletterService {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Sign an address up. The backend response body carries nothing the
    /// client needs, so success is just "the request went through".
    pub async fn subscribe(&self, email: &str) -> Result<()> {
        self.transport
            .post_json("newsletter/subscribe", json!({ "email": email }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    use crate::api::HttpClient;
    use crate::app::KioskError;

    #[tokio::test]
    async fn test_subscribe_posts_email() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/newsletter/subscribe")
                .json_body(json!({ "email": "reader@example.com" }));
            then.status(201).json_body(json!({ "message": "Subscribed" }));
        });

        let transport = HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        let service = NewsletterService::new(Arc::new(transport));
        service.subscribe("reader@example.com").await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_subscribe_surfaces_validation_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/newsletter/subscribe");
            then.status(400).json_body(json!({ "error": "Invalid email" }));
        });

        let transport = HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        let service = NewsletterService::new(Arc::new(transport));
        let err = service.subscribe("not-an-email").await.unwrap_err();

        match err {
            KioskError::Api(api) => assert!(api.to_string().contains("400")),
            other => panic!("expected API error, got {:?}", other),
        }
    }
}

use std::sync::Arc;

use crate::api::ApiTransport;
use crate::app::Result;
use crate::domain::PublicSettings;

pub struct SettingsService {
    transport: Arc<dyn ApiTransport>,
}

impl SettingsService {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    pub async fn public(&self) -> Result<PublicSettings> {
        let data = self.transport.get_json("settings/public", &[]).await?;
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
    async fn test_public_decodes_settings() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/settings/public");
            then.status(200).json_body(json!({
                "site_name": "Kiosk Daily",
                "site_tagline": "All the news",
                "contact_email": "desk@example.com",
            }));
        });

        let transport = HttpClient::new(&format!("{}/api", server.base_url()), 10).unwrap();
        let service = SettingsService::new(Arc::new(transport));
        let settings = service.public().await.unwrap();

        assert_eq!(settings.display_name(), "Kiosk Daily");
        assert_eq!(settings.contact_email.as_deref(), Some("desk@example.com"));
        assert!(settings.facebook_url.is_none());
    }
}

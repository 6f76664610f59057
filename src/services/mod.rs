//! Typed access to each backend resource.
//!
//! One service per resource, all sharing the same [`ApiTransport`]. Services
//! shape responses (pagination flattening, envelope unwrapping) but hold no
//! state; caching happens a layer up in [`crate::query`].

pub mod articles;
pub mod categories;
pub mod newsletter;
pub mod settings;

pub use articles::{ArticleFilter, ArticlesService};
pub use categories::CategoriesService;
pub use newsletter::NewsletterService;
pub use settings::SettingsService;

use std::sync::Arc;

use crate::api::ApiTransport;

/// All resource services over one shared transport.
pub struct Services {
    pub articles: ArticlesService,
    pub categories: CategoriesService,
    pub settings: SettingsService,
    pub newsletter: NewsletterService,
}

impl Services {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            articles: ArticlesService::new(transport.clone()),
            categories: CategoriesService::new(transport.clone()),
            settings: SettingsService::new(transport.clone()),
            newsletter: NewsletterService::new(transport),
        }
    }
}

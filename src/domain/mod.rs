pub mod article;
pub mod category;
pub mod media;
pub mod settings;

pub use article::{Article, ArticlePage};
pub use category::Category;
pub use media::{collect_article_media, MediaItem, MediaKind};
pub use settings::PublicSettings;

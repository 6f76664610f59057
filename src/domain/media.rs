use serde::Deserialize;

use crate::domain::Article;

/// File extensions the backend serves as video.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4",
    "webm",
    "mpeg",
    "mpg",
    "mov",
    "quicktime",
    "avi",
    "wmv",
    "flv",
    "ogv",
    "m4v",
    "mkv",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Guess the media type from the URL alone.
    ///
    /// Upload paths carry no reliable extension, so anything under
    /// `/uploads/` is tried as video first; playback failure demotes it to an
    /// image (see [`Carousel::on_video_error`](crate::carousel::Carousel::on_video_error)).
    pub fn sniff(url: &str) -> MediaKind {
        if MediaKind::sniff_strict(url) == MediaKind::Video {
            return MediaKind::Video;
        }
        if url.contains("/uploads/") {
            return MediaKind::Video;
        }
        MediaKind::Image
    }

    /// Like [`sniff`](MediaKind::sniff) but without the `/uploads/` leniency.
    ///
    /// Used in list contexts where a wrong video marker is worse than a
    /// missing one.
    pub fn sniff_strict(url: &str) -> MediaKind {
        if url.is_empty() {
            return MediaKind::Image;
        }
        if has_video_extension(url)
            || url.starts_with("data:video/")
            || url.contains("video/")
            || url.contains("type=video")
        {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// One slide in a media gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub url: String,
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = MediaKind::sniff(&url);
        Self { url, kind }
    }
}

/// Assemble the gallery for an article: the featured image first, then every
/// embedded `src` found in the body, deduplicated in order.
pub fn collect_article_media(article: &Article) -> Vec<MediaItem> {
    let mut urls: Vec<String> = Vec::new();

    if let Some(featured) = article.featured_image.as_deref() {
        if !featured.is_empty() {
            urls.push(featured.to_string());
        }
    }

    for src in extract_src_urls(&article.body) {
        if !urls.contains(&src) {
            urls.push(src);
        }
    }

    urls.into_iter().map(MediaItem::from_url).collect()
}

/// Scan HTML for `src="…"` attribute values.
fn extract_src_urls(html: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut rest = html;
    while let Some(pos) = rest.find("src=\"") {
        let start = pos + "src=\"".len();
        let tail = &rest[start..];
        let Some(end) = tail.find('"') else { break };
        let value = &tail[..end];
        if !value.is_empty() {
            urls.push(html_escape::decode_html_entities(value).to_string());
        }
        rest = &tail[end..];
    }
    urls
}

fn has_video_extension(url: &str) -> bool {
    let path = url.split('?').next().unwrap_or(url);
    match path.rsplit_once('.') {
        Some((_, ext)) => VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_video_extensions() {
        assert_eq!(MediaKind::sniff("https://cdn.example.com/clip.mp4"), MediaKind::Video);
        assert_eq!(MediaKind::sniff("https://cdn.example.com/clip.MP4"), MediaKind::Video);
        assert_eq!(MediaKind::sniff("https://cdn.example.com/clip.webm?t=3"), MediaKind::Video);
    }

    #[test]
    fn test_sniff_data_url_and_mime_hints() {
        assert_eq!(MediaKind::sniff("data:video/mp4;base64,AAAA"), MediaKind::Video);
        assert_eq!(
            MediaKind::sniff("https://example.com/stream?type=video"),
            MediaKind::Video
        );
    }

    #[test]
    fn test_sniff_uploads_is_lenient() {
        // No extension to go on: try video, let the error path demote it.
        assert_eq!(MediaKind::sniff("/uploads/1735804800000-abc"), MediaKind::Video);
        assert_eq!(
            MediaKind::sniff_strict("/uploads/1735804800000-abc"),
            MediaKind::Image
        );
    }

    #[test]
    fn test_sniff_plain_images() {
        assert_eq!(MediaKind::sniff("https://cdn.example.com/banner.png"), MediaKind::Image);
        assert_eq!(MediaKind::sniff(""), MediaKind::Image);
    }

    #[test]
    fn test_collect_featured_first_then_body() {
        let article = Article {
            featured_image: Some("/uploads/hero.mp4".to_string()),
            body: r#"<p>intro</p><img src="/uploads/a.jpg"><video src="/uploads/b.mp4"></video>"#
                .to_string(),
            ..Article::default()
        };
        let media = collect_article_media(&article);
        let urls: Vec<&str> = media.iter().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec!["/uploads/hero.mp4", "/uploads/a.jpg", "/uploads/b.mp4"]);
        assert_eq!(media[0].kind, MediaKind::Video);
        assert_eq!(media[2].kind, MediaKind::Video);
    }

    #[test]
    fn test_collect_dedupes_repeated_urls() {
        let article = Article {
            featured_image: Some("/uploads/a.jpg".to_string()),
            body: r#"<img src="/uploads/a.jpg"><img src="/uploads/a.jpg">"#.to_string(),
            ..Article::default()
        };
        assert_eq!(collect_article_media(&article).len(), 1);
    }

    #[test]
    fn test_collect_empty_without_media() {
        assert!(collect_article_media(&Article::default()).is_empty());
    }

    #[test]
    fn test_extract_src_decodes_entities() {
        let urls = extract_src_urls(r#"<img src="/uploads/a.jpg?w=1&amp;h=2">"#);
        assert_eq!(urls, vec!["/uploads/a.jpg?w=1&h=2"]);
    }
}

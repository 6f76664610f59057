use serde::Deserialize;

pub const DEFAULT_SITE_NAME: &str = "Congo News";
pub const DEFAULT_SITE_TAGLINE: &str = "Breaking News & Latest Updates";

/// Publicly visible site settings (branding, contact, social links).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PublicSettings {
    pub site_name: Option<String>,
    pub site_tagline: Option<String>,
    pub site_description: Option<String>,
    pub site_logo_url: Option<String>,
    pub site_favicon_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub facebook_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub footer_copyright: Option<String>,
}

impl PublicSettings {
    /// Site name with the stock fallback while settings are missing or blank.
    pub fn display_name(&self) -> &str {
        self.site_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SITE_NAME)
    }

    pub fn display_tagline(&self) -> &str {
        self.site_tagline
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SITE_TAGLINE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_uses_value_when_set() {
        let settings = PublicSettings {
            site_name: Some("Kiosk Daily".to_string()),
            ..PublicSettings::default()
        };
        assert_eq!(settings.display_name(), "Kiosk Daily");
    }

    #[test]
    fn test_display_name_falls_back_when_blank() {
        let settings = PublicSettings {
            site_name: Some(String::new()),
            ..PublicSettings::default()
        };
        assert_eq!(settings.display_name(), DEFAULT_SITE_NAME);
        assert_eq!(PublicSettings::default().display_name(), DEFAULT_SITE_NAME);
    }

    #[test]
    fn test_display_tagline_fallback() {
        assert_eq!(
            PublicSettings::default().display_tagline(),
            DEFAULT_SITE_TAGLINE
        );
    }
}

use std::fmt;

use tracing::warn;

/// Page shown when the default page is selected, or when no usable URL is configured.
pub const DEFAULT_PAGE_URL: &str = "https://bobby-mcgonigle.github.io/HolloweenPumpkinEyes/";

/// Banner text rendered by the default page when no custom text is provided.
pub const DEFAULT_BANNER_TEXT: &str = "Happy Halloween";

/// Banner font size rendered by the default page when no custom size is provided.
pub const DEFAULT_FONT_SIZE: u32 = 75;

/// Options selecting and parameterizing the overlay page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebSourceConfig {
    use_default_page: bool,
    show_text: bool,
    banner_text: String,
    font_size: u32,
    custom_url: String,
}

impl Default for WebSourceConfig {
    fn default() -> Self {
        Self {
            use_default_page: true,
            show_text: true,
            banner_text: DEFAULT_BANNER_TEXT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            custom_url: String::new(),
        }
    }
}

impl WebSourceConfig {
    /// Returns whether the built-in default page is used instead of the custom URL.
    pub fn use_default_page(&self) -> bool {
        self.use_default_page
    }

    /// Returns whether the default page shows its text banner.
    pub fn show_text(&self) -> bool {
        self.show_text
    }

    /// Returns the banner text of the default page.
    pub fn banner_text(&self) -> &str {
        &self.banner_text
    }

    /// Returns the banner font size of the default page.
    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    /// Returns the custom page URL.
    pub fn custom_url(&self) -> &str {
        &self.custom_url
    }

    /// Sets whether the built-in default page is used. When `false`, the custom URL is shown
    /// verbatim.
    ///
    /// Default: `true`
    pub fn with_use_default_page(mut self, use_default_page: bool) -> Self {
        self.use_default_page = use_default_page;
        self
    }

    /// Sets whether the default page shows its text banner.
    ///
    /// Default: `true`
    pub fn with_show_text(mut self, show_text: bool) -> Self {
        self.show_text = show_text;
        self
    }

    /// Sets the banner text of the default page.
    ///
    /// Default: [`DEFAULT_BANNER_TEXT`]
    pub fn with_banner_text(mut self, text: impl Into<String>) -> Self {
        self.banner_text = text.into();
        self
    }

    /// Sets the banner font size of the default page.
    ///
    /// Default: [`DEFAULT_FONT_SIZE`]
    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Sets the custom page URL, used when the default page is disabled.
    ///
    /// Default: empty
    pub fn with_custom_url(mut self, url: impl Into<String>) -> Self {
        self.custom_url = url.into();
        self
    }

    /// Query string customizing the default page, or an empty string if every option matches
    /// the page defaults.
    fn default_page_query(&self) -> String {
        let mut params = Vec::new();

        if !self.show_text {
            params.push("showText=false".to_string());
        }

        if self.font_size != DEFAULT_FONT_SIZE {
            params.push(format!("modFontSize={}", self.font_size));
        }

        let text = self.banner_text.trim();
        if !text.is_empty() && !text.eq_ignore_ascii_case(DEFAULT_BANNER_TEXT) {
            params.push(format!("modTextContent={}", urlencoding::encode(text)));
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

/// The page the display sink is instructed to show.
///
/// Resolved once from a [`WebSourceConfig`]; configuration is static for the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayTarget {
    url: String,
    fallback: bool,
}

impl OverlayTarget {
    /// Resolves the target selected by `config`.
    ///
    /// A custom URL that is empty after trimming is replaced by the default page, and the
    /// substitution is flagged (see [`is_fallback`](Self::is_fallback)).
    pub fn resolve(config: &WebSourceConfig) -> Self {
        let default_url = || format!("{DEFAULT_PAGE_URL}{}", config.default_page_query());

        if config.use_default_page {
            return Self {
                url: default_url(),
                fallback: false,
            };
        }

        let custom_url = config.custom_url.trim();
        if custom_url.is_empty() {
            return Self {
                url: default_url(),
                fallback: true,
            };
        }

        Self {
            url: config.custom_url.clone(),
            fallback: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` if the configured URL was unusable and the default page was substituted.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Logs the fallback substitution, if any.
    pub(crate) fn warn_if_fallback(&self) {
        if self.fallback {
            warn!("Trick! Url undefined, assigning default Url [{}]", self.url);
        }
    }
}

impl fmt::Display for OverlayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

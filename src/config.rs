use crate::secrets::Secrets;

/// Browser `User-Agent` to be served the same pages as a desktop browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,
    pub app_lang: String,

    pub user_agent: String,

    /// Rewrite HLS playlist URLs to direct MP3 files.
    pub convert_m3u8_links: bool,

    pub secrets: Secrets,
}

impl Config {
    #[must_use]
    pub fn with_secrets(secrets: Secrets) -> Self {
        let app_name = env!("CARGO_PKG_NAME").to_owned();
        let app_version = env!("CARGO_PKG_VERSION").to_owned();
        let app_lang = "en".to_owned();

        let user_agent = DEFAULT_USER_AGENT.to_owned();
        trace!("user agent: {user_agent}");

        Self {
            app_name,
            app_version,
            app_lang,

            user_agent,

            convert_m3u8_links: true,

            secrets,
        }
    }
}

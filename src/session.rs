//! Session setup: cookies the site expects and the initial page visit.

use std::sync::Arc;

use cookie_store::{Cookie, CookieStore};
use reqwest_cookie_store::CookieStoreMutex;
use url::Url;

use crate::{
    config::Config,
    error::Result,
    http::{Client, Transport},
    protocol::{DESKTOP_BASE_URL, MOBILE_HOME_URL},
    secrets::Secrets,
};

/// Domain all session cookies are set on, including subdomains.
const COOKIE_DOMAIN: &str = "vk.com";

/// Creates a cookie jar holding the session and client preference cookies.
///
/// # Errors
///
/// Returns error if a cookie is rejected, e.g. because the session value
/// contains characters not allowed in a cookie.
pub fn cookie_jar(secrets: &Secrets) -> Result<CookieStoreMutex> {
    let origin = Url::parse(DESKTOP_BASE_URL)?;
    let mut store = CookieStore::default();

    let cookies = [
        // Suppress the "audio is unavailable in your region" banner.
        ("remixaudio_show_alert_today", "0"),
        // Pretend to be a large screen so that listings come unabridged.
        ("remixmdevice", "1920/1080/2/!!-!!!!"),
        ("remixsid", secrets.remixsid.as_str()),
    ];

    for (name, value) in cookies {
        let raw = format!("{name}={value}; Domain={COOKIE_DOMAIN}; Path=/; Secure");
        let cookie = Cookie::parse(raw, &origin)?;
        store.insert(cookie, &origin)?;
    }

    Ok(CookieStoreMutex::new(store))
}

/// Visits the mobile home page once, which sets the remaining cookies.
///
/// # Errors
///
/// Returns error if the request fails.
pub async fn warm_up<T: Transport>(http: &T) -> Result<()> {
    let response = http.get(MOBILE_HOME_URL, Vec::new(), true).await?;
    debug!("session warm-up: {}", response.status);
    Ok(())
}

/// Creates an HTTP client carrying the session in `config` and warms it up.
///
/// # Errors
///
/// Returns error if the cookies or client cannot be set up, or the warm-up
/// request fails.
pub async fn connect(config: &Config) -> Result<Client> {
    let cookie_jar = Arc::new(cookie_jar(&config.secrets)?);
    let client = Client::new(config, cookie_jar)?;
    warm_up(&client).await?;

    debug!("client: {}/{}", config.app_name, config.app_version);
    info!("session established for user {}", config.secrets.user_id);
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_session_cookies() {
        let secrets: Secrets = "remixsid = \"s3cr3t\"\nuser_id = 1\n".parse().unwrap();
        let jar = cookie_jar(&secrets).unwrap();
        let store = jar.lock().unwrap();

        assert_eq!(
            store.get("vk.com", "/", "remixsid").map(|c| c.value()),
            Some("s3cr3t")
        );
        assert_eq!(
            store.get("vk.com", "/", "remixaudio_show_alert_today").map(|c| c.value()),
            Some("0")
        );

        let mobile = Url::parse("https://m.vk.com/audio").unwrap();
        let names: Vec<&str> = store.matches(&mobile).iter().map(|c| c.name()).collect();
        assert!(names.contains(&"remixsid"));
        assert!(names.contains(&"remixmdevice"));
    }
}

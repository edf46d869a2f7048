//! HTTP transport with rate limiting and cookie management.
//!
//! Scraping code talks to the site through the [`Transport`] trait: form
//! encoded GET and POST requests whose bodies are read to text in full.
//! [`Client`] implements it on top of `reqwest` and adds:
//! * A shared cookie jar that carries the session
//! * A global request throttle
//! * Consistent timeouts and headers
//!
//! # Rate Limiting
//!
//! The client allows at most three requests per second, with bursts of up
//! to three. This is a floor under all traffic of one client; the batch
//! resolver paces itself more strictly on top of it.

use std::{fmt::Debug, future::Future, num::NonZeroU32, sync::Arc, time::Duration};

use governor::{DefaultDirectRateLimiter, Quota};
use http::StatusCode;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE},
    redirect, RequestBuilder,
};
use reqwest_cookie_store::CookieStoreMutex;
use serde::Deserialize;

use crate::{
    config::Config,
    error::Result,
    protocol::{self, strip_comment},
};

/// Form fields or query parameters of a request.
pub type Form = Vec<(&'static str, String)>;

/// A response read to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub url: String,
    pub status: StatusCode,
    pub text: String,
}

impl Response {
    #[must_use]
    pub fn new(url: impl Into<String>, status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            text: text.into(),
        }
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not valid JSON for `T`.
    pub fn json<T>(&self) -> Result<T>
    where
        T: for<'de> Deserialize<'de> + Debug,
    {
        protocol::json(&self.text, &self.url)
    }

    /// Parses an `al_audio.php` body, which is JSON behind a `<!--` prefix.
    ///
    /// # Errors
    ///
    /// Returns error if the remaining body is not valid JSON for `T`.
    pub fn payload<T>(&self) -> Result<T>
    where
        T: for<'de> Deserialize<'de> + Debug,
    {
        protocol::json(&strip_comment(&self.text), &self.url)
    }
}

/// The requests scraping needs to make.
///
/// Implementations must read the whole body before resolving, so that
/// callers can treat completion of the future as completion of the request.
pub trait Transport {
    /// Sends a GET request with `query` appended to `url`.
    fn get(
        &self,
        url: &str,
        query: Form,
        allow_redirects: bool,
    ) -> impl Future<Output = Result<Response>>;

    /// Sends a POST request with `form` as urlencoded body.
    fn post(
        &self,
        url: &str,
        form: Form,
        allow_redirects: bool,
    ) -> impl Future<Output = Result<Response>>;
}

/// HTTP client with built-in rate limiting and a session cookie jar.
pub struct Client {
    /// Client that follows redirects.
    redirecting: reqwest::Client,

    /// Client that returns redirect responses as is.
    direct: reqwest::Client,

    /// Global throttle shared by both clients.
    rate_limiter: DefaultDirectRateLimiter,

    /// Cookie storage for the session.
    pub cookie_jar: Arc<CookieStoreMutex>,
}

impl Client {
    /// Rate limit interval for all requests.
    const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(1);

    /// Maximum requests per interval.
    const RATE_LIMIT_CALLS_PER_INTERVAL: u8 = 3;

    /// Duration to keep idle connections alive.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Duration to wait for individual network reads.
    const READ_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new client sharing `cookie_jar` between all requests.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if rate limit parameters are zero.
    pub fn new(config: &Config, cookie_jar: Arc<CookieStoreMutex>) -> Result<Self> {
        // Not having `Accept-Language` set is non-fatal.
        let mut headers = HeaderMap::new();
        if let Ok(lang) = HeaderValue::from_str(&config.app_lang) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        let builder = || {
            reqwest::Client::builder()
                .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
                .read_timeout(Self::READ_TIMEOUT)
                .default_headers(headers.clone())
                .user_agent(&config.user_agent)
                .cookie_provider(Arc::clone(&cookie_jar))
        };

        // Rate limit own requests as to not trip the anti-abuse defenses.
        let replenish_interval =
            Self::RATE_LIMIT_INTERVAL / u32::from(Self::RATE_LIMIT_CALLS_PER_INTERVAL);
        let quota = Quota::with_period(replenish_interval)
            .expect("quota time interval is zero")
            .allow_burst(
                NonZeroU32::new(Self::RATE_LIMIT_CALLS_PER_INTERVAL.into())
                    .expect("calls per interval is zero"),
            );

        Ok(Self {
            redirecting: builder().build()?,
            direct: builder().redirect(redirect::Policy::none()).build()?,
            rate_limiter: governor::RateLimiter::direct(quota),
            cookie_jar,
        })
    }

    fn client(&self, allow_redirects: bool) -> &reqwest::Client {
        if allow_redirects {
            &self.redirecting
        } else {
            &self.direct
        }
    }

    /// Executes a request with rate limiting and reads the body.
    ///
    /// Non-success statuses are not errors: the site answers requests it
    /// refuses with redirects and empty bodies, which callers interpret.
    ///
    /// # Errors
    ///
    /// Returns error if the request or reading the body fails.
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.rate_limiter.until_ready().await;

        let response = request.send().await?;
        let url = response.url().to_string();
        let status = response.status();
        let text = response.text().await?;

        debug!("{url}: {status} ({} bytes)", text.len());
        Ok(Response { url, status, text })
    }
}

impl Transport for Client {
    async fn get(&self, url: &str, query: Form, allow_redirects: bool) -> Result<Response> {
        let request = self.client(allow_redirects).get(url).query(&query);
        self.execute(request).await
    }

    async fn post(&self, url: &str, form: Form, allow_redirects: bool) -> Result<Response> {
        let request = self.client(allow_redirects).post(url).form(&form);
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn payload_strips_comment_prefix() {
        let response = Response::new(
            protocol::AL_AUDIO_URL,
            StatusCode::OK,
            r#"<!--{"payload": [0, [1]]}"#,
        );
        let value: Value = response.payload().unwrap();
        assert_eq!(value["payload"][1][0], 1);

        assert!(response.json::<Value>().is_err());
    }
}

//! Turns the URLs a batch resolve hands out into playable ones.
//!
//! Two rewrites apply, in order:
//! 1. Obfuscated `audio_api_unavailable` placeholders are decoded with the
//!    session's user ID (see [`url_decoder`](crate::url_decoder)).
//! 2. HLS playlist URLs are rewritten to the direct MP3 file next to them,
//!    when enabled.
//!
//! Any other URL is passed through unchanged.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::{error::Result, protocol::UserId, url_decoder};

/// Marker of an obfuscated URL.
const UNAVAILABLE_MARKER: &str = "audio_api_unavailable";

/// Marker of an HLS playlist URL.
const M3U8_MARKER: &str = "m3u8";

static RE_M3U8: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/([0-9a-f]+)(?:/audios)?/([0-9a-f]+)/index\.m3u8")
        .expect("invalid m3u8 pattern")
});

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Normalizer {
    user_id: UserId,
    convert_m3u8_links: bool,
}

impl Normalizer {
    #[must_use]
    pub fn new(user_id: UserId, convert_m3u8_links: bool) -> Self {
        Self {
            user_id,
            convert_m3u8_links,
        }
    }

    /// Normalizes one URL.
    ///
    /// # Errors
    ///
    /// Returns an error if an obfuscated URL cannot be decoded.
    pub fn normalize(&self, url: &str) -> Result<String> {
        let mut url = if url.contains(UNAVAILABLE_MARKER) {
            url_decoder::decode(url, self.user_id)?
        } else {
            url.to_owned()
        };

        if self.convert_m3u8_links && url.contains(M3U8_MARKER) {
            url = RE_M3U8.replace(&url, "/${1}/${2}.mp3").into_owned();
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_hls_playlists() {
        let normalizer = Normalizer::new(1, true);
        assert_eq!(
            normalizer
                .normalize("https://cs9-1v4.vkuseraudio.net/s/v1/ac/abc123/audios/def456/index.m3u8?extra=1")
                .unwrap(),
            "https://cs9-1v4.vkuseraudio.net/s/v1/ac/abc123/def456.mp3?extra=1"
        );
        assert_eq!(
            normalizer
                .normalize("https://psv4.vkuseraudio.net/c1/u1/abc123/def456/index.m3u8")
                .unwrap(),
            "https://psv4.vkuseraudio.net/c1/u1/abc123/def456.mp3"
        );
    }

    #[test]
    fn keeps_hls_when_disabled() {
        let url = "https://cs1.vkuseraudio.net/abc123/audios/def456/index.m3u8";
        assert_eq!(Normalizer::new(1, false).normalize(url).unwrap(), url);
    }

    #[test]
    fn passes_plain_urls_through() {
        let url = "https://cs1.vkuseraudio.net/p1/abc.mp3?extra=xyz";
        assert_eq!(Normalizer::new(1, true).normalize(url).unwrap(), url);
        assert_eq!(Normalizer::new(1, true).normalize("").unwrap(), "");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let normalizer = Normalizer::new(1, true);
        for url in [
            "https://cs1.vkuseraudio.net/p1/abc.mp3?extra=xyz",
            "https://psv4.vkuseraudio.net/c1/u1/abc123/def456.mp3",
            "https://cs9-1v4.vkuseraudio.net/s/v1/ac/abc123/audios/def456/index.m3u8?extra=1",
        ] {
            let once = normalizer.normalize(url).unwrap();
            assert_eq!(normalizer.normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn malformed_placeholder_fails() {
        let url = "https://m.vk.com/mp3/audio_api_unavailable.mp3";
        assert!(Normalizer::new(1, true).normalize(url).is_err());
    }
}

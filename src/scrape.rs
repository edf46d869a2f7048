//! Extraction of structured data from HTML pages.
//!
//! Three shapes are handled:
//! * JSON embedded in a page as the argument of `new AudioPage(...)`
//! * HTML lists whose items carry an audio tuple in `data-audio`
//! * HTML-escaped performer and title fragments
//!
//! Pages are parsed with [`scraper`]; nothing in here performs I/O.

use std::sync::LazyLock;

use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::{
    error::{Error, Result},
    identity::TrackIdentity,
    protocol::{AudioRecord, OwnerId},
};

/// Scraping failures.
///
/// `MissingRoot` is reported with the same kind as `AccessDenied`: a page
/// without the expected list is what the site serves to sessions that may
/// not see it, and a layout change looks the same from here.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("you don't have permissions to browse {0}'s audio")]
    AccessDenied(OwnerId),

    #[error("could not find root element {0} for audio")]
    MissingRoot(String),

    #[error("pattern {0} not found in page")]
    PatternNotFound(&'static str),

    #[error("audio tuple has {len} fields, at least {required} are required")]
    ShortRecord { len: usize, required: usize },
}

/// Sentinel that precedes the embedded JSON of popular and new releases.
const AUDIO_PAGE_SENTINEL: &str = "new AudioPage(";

/// Root of search results on the mobile site.
pub const DEFAULT_ROOT: &str = "#au_search_items";

/// Nested playlist previews whose items do not belong to the surrounding list.
const PLAYLIST_SNIPPET_CLASS: &str = "audioPlaylistSnippet__list";

const AUDIO_ITEM_SELECTOR: &str = "div.audio_item";
const DISABLED_CLASS: &str = "audio_item_disabled";
const DATA_AUDIO_ATTR: &str = "data-audio";

static RE_OWNER_HASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"AudioUtils.(un)?followOwner\(\d+, &#39;([^)]+)&#39;\)")
        .expect("invalid owner hash pattern")
});

pub(crate) fn selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::internal(format!("{selector}: {e}")))
}

/// Returns the first balanced `{...}` literal after `new AudioPage(`.
///
/// String literals in either quote style are skipped, so braces inside
/// titles do not unbalance the scan.
///
/// # Errors
///
/// Returns [`ScrapeError::PatternNotFound`] if the sentinel is absent or no
/// balanced literal follows it.
pub fn scrap_json(html: &str) -> Result<&str> {
    let not_found = || Error::from(ScrapeError::PatternNotFound(AUDIO_PAGE_SENTINEL));

    let after = html
        .find(AUDIO_PAGE_SENTINEL)
        .map(|pos| pos + AUDIO_PAGE_SENTINEL.len())
        .ok_or_else(not_found)?;
    let start = html[after..].find('{').map(|pos| after + pos).ok_or_else(not_found)?;

    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    for (pos, chr) in html[start..].char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if chr == '\\' {
                escaped = true;
            } else if chr == open {
                quote = None;
            }
            continue;
        }

        match chr {
            '"' | '\'' => quote = Some(chr),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&html[start..=start + pos]);
                }
            }
            _ => {}
        }
    }

    Err(not_found())
}

/// Extracts track identities from the audio items of an HTML page.
///
/// Only items below the first element matching `root` are considered.
/// Items inside nested playlist previews and disabled items are skipped;
/// items whose tuple lacks an identity are dropped.
///
/// # Errors
///
/// Returns [`ScrapeError::MissingRoot`] if no element matches `root`, or an
/// error if a `data-audio` attribute is not a valid audio tuple.
pub fn scrap_ids_from_html(html: &str, root: &str) -> Result<Vec<TrackIdentity>> {
    let document = Html::parse_document(html);
    let root_selector = selector(root)?;
    let item_selector = selector(AUDIO_ITEM_SELECTOR)?;

    let root_el = document
        .select(&root_selector)
        .next()
        .ok_or_else(|| ScrapeError::MissingRoot(root.to_owned()))?;

    let mut ids = Vec::new();
    for audio in root_el.select(&item_selector) {
        if in_playlist_snippet(audio) || has_class(audio, DISABLED_CLASS) {
            continue;
        }

        let Some(data_audio) = audio.value().attr(DATA_AUDIO_ATTR) else {
            continue;
        };
        let record: AudioRecord = serde_json::from_str(data_audio)?;
        if let Some(id) = TrackIdentity::from_record(&record) {
            ids.push(id);
        }
    }

    Ok(ids)
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn in_playlist_snippet(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| has_class(ancestor, PLAYLIST_SNIPPET_CLASS))
}

/// Text content of an HTML fragment: tags dropped, entities decoded.
#[must_use]
pub fn track_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect()
}

/// Unescapes performer and title; the title is trimmed first.
#[must_use]
pub fn track_info(performer: &str, title: &str) -> (String, String) {
    (track_text(performer), track_text(title.trim()))
}

/// The hash needed to follow or unfollow an owner, from their audio page.
#[must_use]
pub fn scrap_owner_hash(html: &str) -> Option<String> {
    RE_OWNER_HASH
        .captures(html)
        .and_then(|captures| captures.get(2))
        .map(|hash| hash.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_audio(owner: i64, id: i64, hashes: &str) -> String {
        let tuple = serde_json::json!([
            id, owner, "", "Title", "Artist", 100, 0, 0, "", "", 0, "", "", hashes, ""
        ]);
        tuple.to_string().replace('"', "&quot;")
    }

    #[test]
    fn extracts_balanced_literal() {
        let html = r#"<script>new AudioPage(ge('audio'), {"a": {"b": "}{"}, "c": [1]}, 5);</script>"#;
        assert_eq!(scrap_json(html).unwrap(), r#"{"a": {"b": "}{"}, "c": [1]}"#);
    }

    #[test]
    fn missing_sentinel_is_pattern_not_found() {
        let err = scrap_json("<html>nothing here</html>").unwrap_err();
        assert!(matches!(
            err.downcast::<ScrapeError>(),
            Some(ScrapeError::PatternNotFound(_))
        ));

        assert!(scrap_json("new AudioPage({\"open\": 1").is_err());
    }

    #[test]
    fn html_ids_skip_disabled_and_snippets() {
        let html = format!(
            r#"<div class="audios_list">
                 <div class="audio_item" data-audio="{}"></div>
                 <div class="audio_item audio_item_disabled" data-audio="{}"></div>
                 <div class="audioPlaylistSnippet__list">
                   <div class="audio_item" data-audio="{}"></div>
                 </div>
                 <div class="audio_item" data-audio="{}"></div>
                 <div class="audio_item" data-audio="{}"></div>
               </div>"#,
            data_audio(1, 10, "a/b/h2/d/e/h5"),
            data_audio(1, 11, "a/b/h2/d/e/h5"),
            data_audio(1, 12, "a/b/h2/d/e/h5"),
            data_audio(1, 13, "a/b//d/e/h5"),
            data_audio(-5, 14, "a/b/x2/d/e/x5"),
        );

        let ids = scrap_ids_from_html(&html, ".audios_list").unwrap();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["1_10_h2_h5", "-5_14_x2_x5"]);
    }

    #[test]
    fn html_ids_missing_root() {
        let err = scrap_ids_from_html("<div></div>", DEFAULT_ROOT).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::PermissionDenied);
        assert!(matches!(
            err.downcast::<ScrapeError>(),
            Some(ScrapeError::MissingRoot(_))
        ));
    }

    #[test]
    fn unescapes_track_info() {
        let (artist, title) = track_info("<em>AC</em>&amp;DC", "  Back in Black &#39;80  ");
        assert_eq!(artist, "AC&DC");
        assert_eq!(title, "Back in Black '80");
    }

    #[test]
    fn owner_hash() {
        let html = "onclick=\"AudioUtils.followOwner(123, &#39;abcdef0123&#39;)\"";
        assert_eq!(scrap_owner_hash(html).as_deref(), Some("abcdef0123"));
        assert_eq!(scrap_owner_hash("<html></html>"), None);
    }
}

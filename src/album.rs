//! Albums (playlists) as listed on an owner's playlists page.

use std::sync::LazyLock;

use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    protocol::{OwnerId, MOBILE_AUDIO_URL},
    scrape::selector,
};

const ITEM_SELECTOR: &str = "div.audioPlaylistsPage__item";
const LINK_SELECTOR: &str = ".audioPlaylistsPage__itemLink";
const STATS_SELECTOR: &str = ".audioPlaylistsPage__stats";
const TITLE_SELECTOR: &str = ".audioPlaylistsPage__title";
const AUTHOR_SELECTOR: &str = ".audioPlaylistsPage__author";

static RE_ALBUM_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"act=audio_playlist(-?\d+)_(\d+)").expect("invalid album id pattern")
});

static RE_ACCESS_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"access_hash=(\w+)").expect("invalid access hash pattern"));

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub owner_id: OwnerId,
    pub url: String,

    /// Required to list the tracks of an album that is not public.
    pub access_hash: Option<String>,

    pub title: String,
    pub artist: String,

    /// Play count, `None` when the page text is not a number.
    pub plays: Option<u64>,
}

/// Browse URL of an album on the mobile site.
#[must_use]
pub fn album_url(owner_id: OwnerId, id: i64) -> String {
    format!("{MOBILE_AUDIO_URL}?act=audio_playlist{owner_id}_{id}")
}

/// Parses a localized play count such as `"1 011 plays"`.
///
/// The trailing unit word is dropped and thousands separators removed.
#[must_use]
pub fn parse_plays(stats: &str) -> Option<u64> {
    let stats = stats.trim();
    let number = stats.rsplit_once(' ').map_or(stats, |(head, _)| head);
    number.replace(' ', "").parse().ok()
}

/// Extracts all albums from a playlists page.
///
/// Items whose link carries no album ID are skipped.
///
/// # Errors
///
/// Returns an error only if the built-in selectors fail to parse.
pub fn scrap_albums(html: &str) -> Result<Vec<Album>> {
    let document = Html::parse_document(html);
    let item = selector(ITEM_SELECTOR)?;
    let link = selector(LINK_SELECTOR)?;
    let stats = selector(STATS_SELECTOR)?;
    let title = selector(TITLE_SELECTOR)?;
    let author = selector(AUTHOR_SELECTOR)?;

    let mut albums = Vec::new();
    for element in document.select(&item) {
        let href = element
            .select(&link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .unwrap_or_default();

        let Some((owner_id, id)) = RE_ALBUM_ID.captures(href).and_then(|captures| {
            let owner_id = captures.get(1)?.as_str().parse().ok()?;
            let id = captures.get(2)?.as_str().parse().ok()?;
            Some((owner_id, id))
        }) else {
            warn!("skipping album without id in link {href:?}");
            continue;
        };

        let access_hash = RE_ACCESS_HASH
            .captures(href)
            .and_then(|captures| captures.get(1))
            .map(|hash| hash.as_str().to_owned());

        albums.push(Album {
            id,
            owner_id,
            url: album_url(owner_id, id),
            access_hash,
            title: child_text(element, &title),
            artist: child_text(element, &author),
            plays: parse_plays(&child_text(element, &stats)),
        });
    }

    Ok(albums)
}

fn child_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|child| child.text().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(href: &str, stats: &str) -> String {
        format!(
            r#"<div class="audioPlaylistsPage__item">
                 <a class="audioPlaylistsPage__itemLink" href="{href}"></a>
                 <div class="audioPlaylistsPage__title">Road &amp; Trip</div>
                 <div class="audioPlaylistsPage__author">Various</div>
                 <div class="audioPlaylistsPage__stats">{stats}</div>
               </div>"#
        )
    }

    #[test]
    fn play_counts() {
        assert_eq!(parse_plays("1 011 something"), Some(1011));
        assert_eq!(parse_plays("42 plays"), Some(42));
        assert_eq!(parse_plays("7"), Some(7));
        assert_eq!(parse_plays("no number here"), None);
        assert_eq!(parse_plays(""), None);
    }

    #[test]
    fn scraps_album_items() {
        let html = format!(
            "<html><body>{}{}{}</body></html>",
            item("/audio?act=audio_playlist-123_45&access_hash=f00d", "1 011 plays"),
            item("/audio?act=audio_playlists-123", "3 plays"),
            item("/audio?act=audio_playlist77_8", "no plays yet"),
        );

        let albums = scrap_albums(&html).unwrap();
        assert_eq!(albums.len(), 2);

        assert_eq!(albums[0].owner_id, -123);
        assert_eq!(albums[0].id, 45);
        assert_eq!(albums[0].access_hash.as_deref(), Some("f00d"));
        assert_eq!(albums[0].url, "https://m.vk.com/audio?act=audio_playlist-123_45");
        assert_eq!(albums[0].title, "Road & Trip");
        assert_eq!(albums[0].artist, "Various");
        assert_eq!(albums[0].plays, Some(1011));

        assert_eq!(albums[1].access_hash, None);
        assert_eq!(albums[1].plays, None);
    }

    #[test]
    fn empty_page_has_no_albums() {
        assert!(scrap_albums("<html></html>").unwrap().is_empty());
    }
}

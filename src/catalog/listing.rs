//! Tracks owned by a user or group, or the tracks of one album.

use crate::{
    error::Result,
    http::Transport,
    protocol::{catalog::LoadSection, OwnerId, MOBILE_AUDIO_URL},
    scrape::ScrapeError,
};

use super::{Page, Pager};

/// Tracks per listing page.
pub const PAGE_SIZE: u64 = 2000;

/// Playlist ID that selects all tracks of the owner.
const ALL_TRACKS: i64 = -1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    owner_id: OwnerId,
    album_id: Option<i64>,
    access_hash: Option<String>,
    offset: u64,
    done: bool,
}

impl Listing {
    #[must_use]
    pub fn new(owner_id: OwnerId, album_id: Option<i64>, access_hash: Option<String>) -> Self {
        Self {
            owner_id,
            album_id,
            access_hash,
            offset: 0,
            done: false,
        }
    }
}

impl Pager for Listing {
    async fn next_page<T: Transport>(&mut self, http: &T, raw: bool) -> Result<Option<Page>> {
        if self.done {
            return Ok(None);
        }

        let mut form = vec![
            ("act", "load_section".to_owned()),
            ("owner_id", self.owner_id.to_string()),
            (
                "playlist_id",
                self.album_id.unwrap_or(ALL_TRACKS).to_string(),
            ),
            ("offset", self.offset.to_string()),
            ("type", "playlist".to_owned()),
            ("is_loading_all", "1".to_owned()),
        ];
        if let Some(access_hash) = &self.access_hash {
            form.push(("access_hash", access_hash.clone()));
        }

        let response = http.post(MOBILE_AUDIO_URL, form, false).await?;
        let Some(playlist) = response.json::<LoadSection>()?.playlist()? else {
            self.done = true;
            return Err(ScrapeError::AccessDenied(self.owner_id).into());
        };

        let page = Page::from_records(playlist.list);
        if !raw && page.ids.is_empty() {
            self.done = true;
            return Ok(None);
        }

        if playlist.has_more {
            self.offset += PAGE_SIZE;
        } else {
            self.done = true;
        }

        Ok(Some(page))
    }
}

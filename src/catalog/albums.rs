//! The albums of an owner, from the mobile playlists page.

use std::collections::VecDeque;

use futures_util::{stream, Stream};

use crate::{
    album::{scrap_albums, Album},
    error::Result,
    http::Transport,
    protocol::{OwnerId, MOBILE_AUDIO_URL},
    scrape::ScrapeError,
};

/// Albums per playlists page.
pub const PAGE_SIZE: u64 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Albums {
    owner_id: OwnerId,
    offset: u64,
    done: bool,
}

impl Albums {
    #[must_use]
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            offset: 0,
            done: false,
        }
    }

    /// Fetches the next page of albums, or `None` after the last one.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::AccessDenied`] when the page comes back empty,
    /// which is how the site refuses owners that cannot be browsed.
    pub async fn next_page<T: Transport>(&mut self, http: &T) -> Result<Option<Vec<Album>>> {
        if self.done {
            return Ok(None);
        }

        let url = format!("{MOBILE_AUDIO_URL}?act=audio_playlists{}", self.owner_id);
        let query = vec![("offset", self.offset.to_string())];
        let response = http.get(&url, query, false).await?;

        if response.text.is_empty() {
            self.done = true;
            return Err(ScrapeError::AccessDenied(self.owner_id).into());
        }

        let albums = scrap_albums(&response.text)?;
        if albums.is_empty() {
            self.done = true;
            return Ok(None);
        }

        self.offset += PAGE_SIZE;
        Ok(Some(albums))
    }

    /// Streams the albums of all pages.
    pub fn stream<T: Transport>(self, http: &T) -> impl Stream<Item = Result<Album>> + '_ {
        stream::try_unfold((http, self, VecDeque::new()), next_album)
    }
}

async fn next_album<T: Transport>(
    (http, mut pager, mut ready): (&T, Albums, VecDeque<Album>),
) -> Result<Option<(Album, (&T, Albums, VecDeque<Album>))>> {
    loop {
        if let Some(album) = ready.pop_front() {
            return Ok(Some((album, (http, pager, ready))));
        }

        match pager.next_page(http).await? {
            Some(albums) => ready.extend(albums),
            None => return Ok(None),
        }
    }
}

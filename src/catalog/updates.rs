//! Recent additions of friends and followed communities.
//!
//! Each entry of the feed is a playlist of what one owner added; only its
//! first track is listed.

use serde_json::Value;

use crate::{
    error::Result,
    http::Transport,
    identity::scrap_ids,
    protocol::{
        catalog::{Section, SectionCursor},
        UserId, AL_AUDIO_URL,
    },
    scrape::ScrapeError,
};

use super::{
    search::{next_form, section_form},
    Page, Pager,
};

/// Entries on a full page. A shorter page is the last one.
pub const FULL_PAGE: usize = 11;

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    Start,
    Next(SectionCursor),
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Updates {
    user_id: UserId,
    state: State,
}

impl Updates {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: State::Start,
        }
    }
}

impl Pager for Updates {
    async fn next_page<T: Transport>(&mut self, http: &T, _raw: bool) -> Result<Option<Page>> {
        let form = match &self.state {
            State::Done => return Ok(None),
            State::Start => section_form(self.user_id, "updates"),
            State::Next(cursor) => next_form(cursor),
        };
        let first = self.state == State::Start;

        let payload: Value = http.post(AL_AUDIO_URL, form, true).await?.payload()?;
        let Some(section) = Section::from_payload(&payload)? else {
            self.state = State::Done;
            if first {
                return Err(ScrapeError::AccessDenied(self.user_id).into());
            }
            return Ok(None);
        };

        let entries = section.playlists.len();
        let records: Vec<_> = section
            .playlists
            .iter()
            .filter_map(|playlist| playlist.list.first().cloned())
            .collect();
        let ids = scrap_ids(&records);
        if ids.is_empty() {
            self.state = State::Done;
            return Ok(None);
        }

        self.state = match section.cursor() {
            Some(cursor) if entries >= FULL_PAGE => State::Next(cursor),
            _ => State::Done,
        };

        Ok(Some(Page { records, ids }))
    }
}

//! Free-text search over the catalog.
//!
//! The first request returns several result blocks; the one whose tracks
//! carry the marker of the requested [`SearchScope`] is followed, falling
//! back to the first block. Later pages come from `load_catalog_section`
//! with the cursor of the previous response.

use serde_json::Value;

use crate::{
    error::Result,
    http::{Form, Transport},
    protocol::{
        catalog::{SearchScope, Section, SectionCursor},
        UserId, AL_AUDIO_URL,
    },
    scrape::ScrapeError,
};

use super::{Page, Pager, Skip};

/// Form of the first request of a catalog section.
pub(crate) fn section_form(owner_id: i64, section: &str) -> Form {
    vec![
        ("al", "1".to_owned()),
        ("act", "section".to_owned()),
        ("claim", "0".to_owned()),
        ("is_layer", "0".to_owned()),
        ("owner_id", owner_id.to_string()),
        ("section", section.to_owned()),
    ]
}

/// Form requesting the page after `cursor`.
pub(crate) fn next_form(cursor: &SectionCursor) -> Form {
    vec![
        ("al", "1".to_owned()),
        ("act", "load_catalog_section".to_owned()),
        ("section_id", cursor.section_id.to_string()),
        ("start_from", cursor.next_from.to_string()),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    Start,
    Next { block: usize, cursor: SectionCursor },
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Search {
    user_id: UserId,
    query: String,
    scope: SearchScope,
    skip: Skip,
    state: State,
}

impl Search {
    #[must_use]
    pub fn new(user_id: UserId, query: impl Into<String>, offset: usize, scope: SearchScope) -> Self {
        Self {
            user_id,
            query: query.into(),
            scope,
            skip: Skip::new(offset),
            state: State::Start,
        }
    }

    /// Index of the first search block whose first track matches the scope.
    fn block_index(&self, section: &Section) -> usize {
        section
            .playlists
            .iter()
            .position(|playlist| {
                playlist.kind == "search"
                    && playlist
                        .list
                        .first()
                        .is_some_and(|first| first.context().contains(self.scope.marker()))
            })
            .unwrap_or_default()
    }
}

impl Pager for Search {
    async fn next_page<T: Transport>(&mut self, http: &T, raw: bool) -> Result<Option<Page>> {
        let (block, form) = match &self.state {
            State::Done => return Ok(None),
            State::Start => {
                let mut form = section_form(self.user_id, "search");
                form.push(("q", self.query.clone()));
                (None, form)
            }
            State::Next { block, cursor } => (Some(*block), next_form(cursor)),
        };

        let payload: Value = http.post(AL_AUDIO_URL, form, true).await?.payload()?;
        let Some(section) = Section::from_payload(&payload)? else {
            self.state = State::Done;
            return match block {
                None => Err(ScrapeError::AccessDenied(self.user_id).into()),
                Some(_) => Ok(None),
            };
        };

        let block = block.unwrap_or_else(|| self.block_index(&section));
        let cursor = section.cursor();
        let Some(playlist) = section.playlists.into_iter().nth(block) else {
            self.state = State::Done;
            return Ok(None);
        };

        let mut page = Page::from_records(playlist.list);
        if page.ids.is_empty() {
            self.state = State::Done;
            return Ok(None);
        }

        self.state = match cursor {
            Some(cursor) => State::Next { block, cursor },
            None => State::Done,
        };

        page.ids = self.skip.apply(page.ids);
        if raw && !self.skip.reached() {
            page.records.clear();
        }

        Ok(Some(page))
    }
}

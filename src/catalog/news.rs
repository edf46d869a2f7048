//! New releases.
//!
//! The first page is embedded in the desktop audio page, later ones come
//! from `load_catalog_section`. The offset is counted across pages.

use serde_json::Value;

use crate::{
    error::Result,
    http::Transport,
    protocol::{
        catalog::{Section, SectionCursor},
        AL_AUDIO_URL,
    },
};

use super::{
    popular::{recoms, section_page},
    search::next_form,
    Page, Pager, Skip,
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    Start,
    Next(SectionCursor),
    Done,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct News {
    skip: Skip,
    state: State,
}

impl News {
    #[must_use]
    pub fn new(offset: usize) -> Self {
        Self {
            skip: Skip::new(offset),
            state: State::Start,
        }
    }
}

impl Pager for News {
    async fn next_page<T: Transport>(&mut self, http: &T, _raw: bool) -> Result<Option<Page>> {
        let section = match &self.state {
            State::Done => return Ok(None),
            State::Start => recoms(http, "new_songs").await?,
            State::Next(cursor) => {
                let payload: Value = http
                    .post(AL_AUDIO_URL, next_form(cursor), true)
                    .await?
                    .payload()?;
                let Some(section) = Section::from_payload(&payload)? else {
                    self.state = State::Done;
                    return Ok(None);
                };

                section
            }
        };
        let first = self.state == State::Start;

        self.state = match section.cursor() {
            Some(cursor) => State::Next(cursor),
            None => State::Done,
        };

        let mut page = section_page(section);
        if page.ids.is_empty() && !first {
            self.state = State::Done;
            return Ok(None);
        }

        page.ids = self.skip.apply(page.ids);
        Ok(Some(page))
    }
}

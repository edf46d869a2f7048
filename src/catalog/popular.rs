//! The chart of popular tracks.

use crate::{
    error::Result,
    http::Transport,
    protocol::{
        catalog::{AudioPage, Section},
        DESKTOP_AUDIO_URL,
    },
    scrape::scrap_json,
};

use super::{Page, Pager};

/// Fetches the recommendations section embedded in a desktop audio page.
pub(crate) async fn recoms<T: Transport>(http: &T, block: &str) -> Result<Section> {
    let form = vec![
        ("block", block.to_owned()),
        ("section", "recoms".to_owned()),
    ];
    let response = http.post(DESKTOP_AUDIO_URL, form, true).await?;
    let page: AudioPage = crate::protocol::json(scrap_json(&response.text)?, &response.url)?;
    Ok(page.section_data.recoms)
}

/// Tracks of the section's primary playlist.
pub(crate) fn section_page(section: Section) -> Page {
    Page::from_records(section.playlist.map(|playlist| playlist.list).unwrap_or_default())
}

/// Single page listing; the offset is applied to the fetched page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Popular {
    offset: usize,
    done: bool,
}

impl Popular {
    #[must_use]
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            done: false,
        }
    }
}

impl Pager for Popular {
    async fn next_page<T: Transport>(&mut self, http: &T, _raw: bool) -> Result<Option<Page>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut page = section_page(recoms(http, "chart").await?);
        page.ids = page.ids.split_off(self.offset.min(page.ids.len()));
        Ok(Some(page))
    }
}

//! Listing, catalog and batch resolve envelopes.
//!
//! # Wire Formats
//!
//! Owned tracks or an album (`act=load_section` on the mobile site):
//! ```json
//! { "data": [ { "list": [ [...], [...] ], "hasMore": true, ... } ] }
//! ```
//! `data[0]` is `false` or `null` when the owner cannot be browsed.
//!
//! Batch resolve (`act=reload_audio`):
//! ```json
//! { "data": [ [ [...], [...] ] ] }
//! ```
//!
//! Catalog sections (`act=section` / `act=load_catalog_section` on
//! `al_audio.php`), after stripping the leading `<!--`:
//! ```json
//! { "payload": [ 0, [ "...", { "playlists": [...], "sectionId": "...", "nextFrom": "..." } ] ] }
//! ```
//!
//! Popular and new releases pages embed the same section object as
//! `sectionData.recoms` inside a `new AudioPage(...)` call.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use serde_with::{formats::Flexible, serde_as, BoolFromInt, PickFirst};

use super::{is_truthy, AudioRecord};
use crate::error::Result;

/// One playlist as embedded in listings and catalog sections.
#[serde_as]
#[derive(Clone, Default, PartialEq, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Playlist kind, `"search"` for search result blocks.
    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub list: Vec<AudioRecord>,

    /// Whether another listing page exists after this one.
    #[serde(default)]
    #[serde_as(as = "PickFirst<(_, BoolFromInt<Flexible>)>")]
    pub has_more: bool,
}

/// Response to `act=load_section`.
#[derive(Clone, PartialEq, Deserialize, Debug)]
pub struct LoadSection {
    #[serde(default)]
    data: Vec<Value>,
}

impl LoadSection {
    /// The primary playlist, or `None` when the container is falsy.
    ///
    /// # Errors
    ///
    /// Returns error if the container is present but not a playlist.
    pub fn playlist(self) -> Result<Option<Playlist>> {
        match self.data.into_iter().next() {
            Some(container) if is_truthy(&container) => {
                Ok(Some(serde_json::from_value(container)?))
            }
            _ => Ok(None),
        }
    }
}

/// Response to `act=reload_audio`.
#[derive(Clone, PartialEq, Deserialize, Debug)]
pub struct ReloadAudio {
    #[serde(default)]
    data: Value,
}

impl ReloadAudio {
    /// The resolved audio tuples; empty when the envelope is absent or empty.
    ///
    /// # Errors
    ///
    /// Returns error if a tuple is present but malformed.
    pub fn records(self) -> Result<Vec<AudioRecord>> {
        let Value::Array(data) = self.data else {
            return Ok(Vec::new());
        };

        match data.into_iter().next() {
            Some(records) if is_truthy(&records) => Ok(serde_json::from_value(records)?),
            _ => Ok(Vec::new()),
        }
    }
}

/// Opaque token copied verbatim from a response.
///
/// The site sends these as strings or numbers interchangeably.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize, Debug)]
#[serde(from = "RawToken")]
pub struct Token(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawToken {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawToken> for Token {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::Text(s) => Self(s),
            RawToken::Number(n) => Self(n.to_string()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cursor of a catalog section: the pair to send back for the next page.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SectionCursor {
    pub section_id: Token,
    pub next_from: Token,
}

/// A catalog section: search results, updates feed or recommendations.
#[derive(Clone, Default, PartialEq, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub playlists: Vec<Playlist>,

    #[serde(default)]
    pub playlist: Option<Playlist>,

    #[serde(default)]
    pub section_id: Option<Token>,

    #[serde(default)]
    pub next_from: Option<Token>,
}

impl Section {
    /// Extracts the section from an `al_audio.php` payload.
    ///
    /// Returns `None` when `payload[1]` is falsy, which the site sends for
    /// owners that cannot be browsed, or when there is no section object.
    ///
    /// # Errors
    ///
    /// Returns error if the section object is malformed.
    pub fn from_payload(payload: &Value) -> Result<Option<Self>> {
        let Some(body) = payload.pointer("/payload/1") else {
            return Ok(None);
        };
        if !is_truthy(body) {
            return Ok(None);
        }

        match body.get(1) {
            Some(section) if section.is_object() => {
                Ok(Some(Self::deserialize(section)?))
            }
            _ => Ok(None),
        }
    }

    /// The cursor for the next page, if the section hands one out.
    ///
    /// Both values are taken verbatim; an empty `nextFrom` means there are
    /// no more pages.
    #[must_use]
    pub fn cursor(&self) -> Option<SectionCursor> {
        let section_id = self.section_id.clone()?;
        let next_from = self.next_from.clone()?;
        if next_from.0.is_empty() {
            return None;
        }

        Some(SectionCursor {
            section_id,
            next_from,
        })
    }
}

/// Object literal embedded in `new AudioPage(...)`.
#[derive(Clone, PartialEq, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AudioPage {
    pub section_data: SectionData,
}

#[derive(Clone, PartialEq, Deserialize, Debug)]
pub struct SectionData {
    pub recoms: Section,
}

/// Where a free-text search looks, as marked in the result's context field.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SearchScope {
    /// The whole catalog.
    #[default]
    Global,

    /// Only tracks in the user's own collection.
    Owned,

    /// Matches in lyrics.
    Lyrics,
}

impl SearchScope {
    /// Marker found in the context field of the first track of a result block.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Global => "search_global_audios",
            Self::Owned => "search_owned_audios",
            Self::Lyrics => "_global_audios_lyrics",
        }
    }
}

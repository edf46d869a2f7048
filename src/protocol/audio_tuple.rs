//! The positional audio tuple.
//!
//! Every track the site hands out, whether in a listing, a search result, a
//! `data-audio` attribute or a batch resolve response, is an array of about
//! thirty heterogeneous values. Positions are stable, names are not sent.
//!
//! # Wire Format
//!
//! ```json
//! [
//!     456239017,                      // ID
//!     2000123456,                     // OWNER_ID
//!     "",                             // URL (empty until resolved)
//!     "Title &amp; more",             // TITLE (HTML)
//!     "<em>Artist</em>",              // PERFORMER (HTML)
//!     215,                            // DURATION (seconds)
//!     0,                              // ALBUM_ID
//!     ...
//!     "search_global_audios",         // CONTEXT
//!     ...
//!     "a1/b2/c3d4/e5/f6/g7h8/",       // HASHES (slash-delimited)
//!     "https://.../80.jpg,https://.../150.jpg", // COVER_URL
//!     ...
//! ]
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{text, OwnerId};
use crate::scrape::ScrapeError;

/// Named positions of the audio tuple.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(usize)]
pub enum Field {
    Id = 0,
    OwnerId = 1,
    Url = 2,
    Title = 3,
    Performer = 4,
    Duration = 5,
    AlbumId = 6,
    AuthorLink = 8,
    Lyrics = 9,
    Flags = 10,
    Context = 11,
    Extra = 12,
    Hashes = 13,
    CoverUrl = 14,
    Ads = 15,
    Subtitle = 16,
    MainArtists = 17,
    FeatArtists = 18,
    Album = 19,
    TrackCode = 20,
    Restriction = 21,
    AlbumPart = 22,
    AccessKey = 24,
    ChartInfo = 25,
    TrackPageId = 26,
    IsOriginalSound = 27,
    AdminUrl = 28,
    UmaQueryUrl = 29,
}

impl Field {
    /// All named positions, in ascending order.
    pub const ALL: [Field; 28] = [
        Self::Id,
        Self::OwnerId,
        Self::Url,
        Self::Title,
        Self::Performer,
        Self::Duration,
        Self::AlbumId,
        Self::AuthorLink,
        Self::Lyrics,
        Self::Flags,
        Self::Context,
        Self::Extra,
        Self::Hashes,
        Self::CoverUrl,
        Self::Ads,
        Self::Subtitle,
        Self::MainArtists,
        Self::FeatArtists,
        Self::Album,
        Self::TrackCode,
        Self::Restriction,
        Self::AlbumPart,
        Self::AccessKey,
        Self::ChartInfo,
        Self::TrackPageId,
        Self::IsOriginalSound,
        Self::AdminUrl,
        Self::UmaQueryUrl,
    ];

    #[must_use]
    pub const fn position(self) -> usize {
        self as usize
    }

    /// Inverse of [`Field::position`].
    #[must_use]
    pub fn from_position(position: usize) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.position() == position)
    }

    /// The name the site's scripts use for this position.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::OwnerId => "OWNER_ID",
            Self::Url => "URL",
            Self::Title => "TITLE",
            Self::Performer => "PERFORMER",
            Self::Duration => "DURATION",
            Self::AlbumId => "ALBUM_ID",
            Self::AuthorLink => "AUTHOR_LINK",
            Self::Lyrics => "LYRICS",
            Self::Flags => "FLAGS",
            Self::Context => "CONTEXT",
            Self::Extra => "EXTRA",
            Self::Hashes => "HASHES",
            Self::CoverUrl => "COVER_URL",
            Self::Ads => "ADS",
            Self::Subtitle => "SUBTITLE",
            Self::MainArtists => "MAIN_ARTISTS",
            Self::FeatArtists => "FEAT_ARTISTS",
            Self::Album => "ALBUM",
            Self::TrackCode => "TRACK_CODE",
            Self::Restriction => "RESTRICTION",
            Self::AlbumPart => "ALBUM_PART",
            Self::AccessKey => "ACCESS_KEY",
            Self::ChartInfo => "CHART_INFO",
            Self::TrackPageId => "TRACK_PAGE_ID",
            Self::IsOriginalSound => "IS_ORIGINAL_SOUND",
            Self::AdminUrl => "ADMIN_URL",
            Self::UmaQueryUrl => "UMA_QUERY_URL",
        }
    }
}

/// Minimum tuple length: one past the highest position read when resolving.
pub const REQUIRED_LEN: usize = Field::CoverUrl.position() + 1;

// The table must be strictly ascending for `from_position` and the length
// check above to hold.
const _: () = {
    let mut i = 1;
    while i < Field::ALL.len() {
        assert!(Field::ALL[i - 1].position() < Field::ALL[i].position());
        i += 1;
    }
};

/// One audio tuple, addressed by [`Field`].
///
/// Deserializes from the positional array and serializes back into it, so
/// raw records can be passed on without loss.
#[derive(Clone, PartialEq, Deserialize, Serialize, Debug)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct AudioRecord(Vec<Value>);

impl TryFrom<Vec<Value>> for AudioRecord {
    type Error = ScrapeError;

    fn try_from(fields: Vec<Value>) -> Result<Self, Self::Error> {
        if fields.len() < REQUIRED_LEN {
            return Err(ScrapeError::ShortRecord {
                len: fields.len(),
                required: REQUIRED_LEN,
            });
        }

        Ok(Self(fields))
    }
}

impl From<AudioRecord> for Vec<Value> {
    fn from(record: AudioRecord) -> Self {
        record.0
    }
}

impl AudioRecord {
    /// Raw value at `field`, if the tuple is long enough to carry it.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.0.get(field.position())
    }

    /// Replaces the value at `field`. Does nothing past the end of the tuple.
    pub fn set(&mut self, field: Field, value: Value) {
        if let Some(slot) = self.0.get_mut(field.position()) {
            *slot = value;
        }
    }

    /// Value at `field` as the site's scripts would stringify it.
    #[must_use]
    pub fn text(&self, field: Field) -> Cow<'_, str> {
        self.get(field).map_or(Cow::Borrowed(""), text)
    }

    /// Number of values in the tuple.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.integer(Field::Id)
    }

    #[must_use]
    pub fn owner_id(&self) -> Option<OwnerId> {
        self.integer(Field::OwnerId)
    }

    #[must_use]
    pub fn url(&self) -> Cow<'_, str> {
        self.text(Field::Url)
    }

    #[must_use]
    pub fn title(&self) -> Cow<'_, str> {
        self.text(Field::Title)
    }

    #[must_use]
    pub fn performer(&self) -> Cow<'_, str> {
        self.text(Field::Performer)
    }

    /// Track length in seconds, zero when absent.
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.get(Field::Duration)
            .and_then(|value| match value {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// The slash-delimited hashes string.
    #[must_use]
    pub fn hashes(&self) -> Cow<'_, str> {
        self.text(Field::Hashes)
    }

    /// Search scope marker and similar context tags.
    #[must_use]
    pub fn context(&self) -> Cow<'_, str> {
        self.text(Field::Context)
    }

    /// Cover image URLs at increasing resolutions; empty when there is none.
    #[must_use]
    pub fn cover_urls(&self) -> Vec<String> {
        let covers = self.text(Field::CoverUrl);
        if covers.is_empty() {
            return Vec::new();
        }

        covers.split(',').map(str::to_owned).collect()
    }

    fn integer(&self, field: Field) -> Option<i64> {
        match self.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tuple(len: usize) -> Vec<Value> {
        let mut fields = vec![Value::from(""); len];
        fields[Field::Id.position()] = json!(456_239_017);
        fields[Field::OwnerId.position()] = json!("-2001");
        fields[Field::Duration.position()] = json!(215);
        fields[Field::CoverUrl.position()] = json!("https://a/80.jpg,https://a/150.jpg");
        fields
    }

    #[test]
    fn positions_round_trip_through_names() {
        for field in Field::ALL {
            assert_eq!(Field::from_position(field.position()), Some(field));
        }
        assert_eq!(Field::from_position(7), None);
        assert_eq!(Field::from_position(23), None);
        assert_eq!(Field::Hashes.name(), "HASHES");
    }

    #[test]
    fn rejects_short_tuples() {
        let err = AudioRecord::try_from(tuple(REQUIRED_LEN - 1)).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::ShortRecord {
                len: 14,
                required: 15
            }
        ));

        let decoded: Result<AudioRecord, _> = serde_json::from_value(json!([1, 2, 3]));
        assert!(decoded.is_err());
    }

    #[test]
    fn typed_accessors() {
        let record = AudioRecord::try_from(tuple(30)).unwrap();
        assert_eq!(record.id(), Some(456_239_017));
        assert_eq!(record.owner_id(), Some(-2001));
        assert_eq!(record.duration(), 215);
        assert_eq!(
            record.cover_urls(),
            vec!["https://a/80.jpg".to_owned(), "https://a/150.jpg".to_owned()]
        );
        assert_eq!(record.text(Field::OwnerId), "-2001");
        assert!(record.get(Field::UmaQueryUrl).is_some());
    }

    #[test]
    fn empty_cover_is_empty_list() {
        let mut fields = tuple(REQUIRED_LEN);
        fields[Field::CoverUrl.position()] = json!("");
        let record = AudioRecord::try_from(fields).unwrap();
        assert!(record.cover_urls().is_empty());
        assert_eq!(record.get(Field::UmaQueryUrl), None);
    }

    #[test]
    fn serializes_back_to_array() {
        let fields = tuple(REQUIRED_LEN);
        let record = AudioRecord::try_from(fields.clone()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), Value::Array(fields));
    }
}

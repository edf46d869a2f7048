//! Playable tracks as handed to callers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};

use crate::{
    error::{Error, Result},
    normalize::Normalizer,
    protocol::{AudioRecord, OwnerId},
    scrape,
};

/// A resolved track with a playable URL and unescaped metadata.
///
/// Serializes with the duration in whole seconds.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub owner_id: OwnerId,

    /// Cover images at increasing resolutions, possibly none.
    pub track_covers: Vec<String>,

    pub url: String,
    pub artist: String,
    pub title: String,

    #[serde_as(as = "DurationSeconds<u64>")]
    pub duration: Duration,
}

impl Track {
    /// Builds a track from a resolved record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no numeric ID or owner ID, or if
    /// its URL cannot be normalized.
    pub fn from_record(record: &AudioRecord, normalizer: &Normalizer) -> Result<Self> {
        let id = record
            .id()
            .ok_or_else(|| Error::data_loss("audio record without numeric id"))?;
        let owner_id = record
            .owner_id()
            .ok_or_else(|| Error::data_loss(format!("audio record {id} without numeric owner id")))?;

        let (artist, title) = scrape::track_info(&record.performer(), &record.title());

        Ok(Self {
            id,
            owner_id,
            track_covers: record.cover_urls(),
            url: normalizer.normalize(&record.url())?,
            artist,
            title,
            duration: Duration::from_secs(record.duration()),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(url: &str) -> AudioRecord {
        serde_json::from_value(json!([
            456, "-7", url, "Hey &amp; Ho ", "<b>Ramones</b>", 142, 0, 0, "", "", 0, "", "",
            "a/b/c/d/e/f", "https://i/1.jpg,https://i/2.jpg"
        ]))
        .unwrap()
    }

    #[test]
    fn builds_track_from_record() {
        let normalizer = Normalizer::new(1, true);
        let track = Track::from_record(&record("https://cs1/abc/audios/def/index.m3u8"), &normalizer)
            .unwrap();

        assert_eq!(track.id, 456);
        assert_eq!(track.owner_id, -7);
        assert_eq!(track.artist, "Ramones");
        assert_eq!(track.title, "Hey & Ho");
        assert_eq!(track.url, "https://cs1/abc/def.mp3");
        assert_eq!(track.duration, Duration::from_secs(142));
        assert_eq!(track.track_covers.len(), 2);
    }

    #[test]
    fn serializes_duration_as_seconds() {
        let track = Track::from_record(&record("https://cs1/a.mp3"), &Normalizer::new(1, false))
            .unwrap();
        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value["duration"], json!(142));
        assert_eq!(value["owner_id"], json!(-7));
    }
}

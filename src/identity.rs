//! Track identities: the key a batch resolve exchanges for a playable URL.

use std::fmt;

use crate::protocol::{AudioRecord, Field};

/// Position of the first hash token within the hashes field.
const HASH2_POSITION: usize = 2;

/// Position of the second hash token within the hashes field.
const HASH5_POSITION: usize = 5;

/// The four-part key of a track.
///
/// Only ever built with all four parts non-empty; it lives no longer than
/// the listing call that produced it.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TrackIdentity {
    pub owner_id: String,
    pub id: String,
    pub hash2: String,
    pub hash5: String,
}

impl TrackIdentity {
    /// Builds the identity of `record`, or `None` if any part is empty.
    #[must_use]
    pub fn from_record(record: &AudioRecord) -> Option<Self> {
        let hashes = record.hashes();
        let tokens: Vec<&str> = hashes.split('/').collect();
        let token = |position: usize| tokens.get(position).copied().unwrap_or_default();

        let identity = Self {
            owner_id: record.text(Field::OwnerId).into_owned(),
            id: record.text(Field::Id).into_owned(),
            hash2: token(HASH2_POSITION).to_owned(),
            hash5: token(HASH5_POSITION).to_owned(),
        };

        identity.is_valid().then_some(identity)
    }

    fn is_valid(&self) -> bool {
        !(self.owner_id.is_empty()
            || self.id.is_empty()
            || self.hash2.is_empty()
            || self.hash5.is_empty())
    }
}

/// Renders as `ownerId_id_hash2_hash5`, the form the resolve request takes.
impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.owner_id, self.id, self.hash2, self.hash5)
    }
}

/// Identities of `records` in order, dropping records without one.
///
/// Duplicates are kept: the same track may legitimately appear twice.
#[must_use]
pub fn scrap_ids<'a, I>(records: I) -> Vec<TrackIdentity>
where
    I: IntoIterator<Item = &'a AudioRecord>,
{
    records
        .into_iter()
        .filter_map(TrackIdentity::from_record)
        .collect()
}

//! Batch resolution of track identities into playable tracks.
//!
//! Listings only carry identities; the playable URL of a track has to be
//! requested with `act=reload_audio`, at most ten identities at a time. The
//! site blocks sessions that do this too fast, so consecutive batch requests
//! are spaced at least [`RELOAD_INTERVAL`] apart.
//!
//! Pacing state lives in the [`Resolver`], which each listing owns: two
//! listings running side by side pace independently.

use std::time::Duration;

use futures_util::Stream;
use tokio::time::Instant;

use crate::{
    catalog::{self, Once},
    error::Result,
    http::Transport,
    identity::TrackIdentity,
    normalize::Normalizer,
    protocol::{catalog::ReloadAudio, MOBILE_AUDIO_URL},
    track::Track,
};

/// Most identities a single resolve request may carry.
pub const BATCH_SIZE: usize = 10;

/// Minimum time between the completion of one resolve request and the
/// start of the next.
pub const RELOAD_INTERVAL: Duration = Duration::from_millis(1500);

/// Spaces out consecutive requests by a minimum interval.
///
/// The first request is never delayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Sleeps until the interval since the last [`mark`](Self::mark) passed.
    pub async fn wait(&self) {
        if let Some(last) = self.last {
            let deadline = last + self.interval;
            if deadline > Instant::now() {
                trace!(
                    "pacing resolve request for {:?}",
                    deadline - Instant::now()
                );
                tokio::time::sleep_until(deadline).await;
            }
        }
    }

    /// Records that a request just completed.
    pub fn mark(&mut self) {
        self.last = Some(Instant::now());
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(RELOAD_INTERVAL)
    }
}

/// Resolves identities into tracks, one paced request per batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolver {
    pacer: Pacer,
    normalizer: Normalizer,
}

impl Resolver {
    #[must_use]
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            pacer: Pacer::default(),
            normalizer,
        }
    }

    /// Resolves one batch of at most [`BATCH_SIZE`] identities.
    ///
    /// Tracks come back in the order of the response. An empty response
    /// envelope yields no tracks and is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the response is malformed, or a
    /// URL cannot be normalized.
    pub async fn resolve<T: Transport>(
        &mut self,
        http: &T,
        batch: &[TrackIdentity],
    ) -> Result<Vec<Track>> {
        debug_assert!(batch.len() <= BATCH_SIZE);
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let ids = batch
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        self.pacer.wait().await;
        let response = http
            .post(
                MOBILE_AUDIO_URL,
                vec![("act", "reload_audio".to_owned()), ("ids", ids)],
                true,
            )
            .await;
        self.pacer.mark();

        let records = response?.json::<ReloadAudio>()?.records()?;
        if records.is_empty() {
            debug!("resolve of {} tracks returned nothing", batch.len());
        }

        records
            .iter()
            .map(|record| Track::from_record(record, &self.normalizer))
            .collect()
    }
}

/// Streams the tracks of `ids`, resolved batch by batch through `resolver`.
///
/// Nothing is requested before the stream is polled.
pub fn scrap_tracks<T: Transport>(
    http: &T,
    ids: Vec<TrackIdentity>,
    resolver: Resolver,
) -> impl Stream<Item = Result<Track>> + '_ {
    catalog::tracks(http, Once::new(ids), resolver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_request_is_not_delayed() {
        let pacer = Pacer::default();
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_out_remaining_interval() {
        let mut pacer = Pacer::default();
        pacer.mark();
        let marked = Instant::now();

        tokio::time::advance(Duration::from_millis(500)).await;
        pacer.wait().await;
        assert_eq!(Instant::now() - marked, RELOAD_INTERVAL);

        pacer.mark();
        tokio::time::advance(Duration::from_secs(2)).await;
        let before = Instant::now();
        pacer.wait().await;
        assert_eq!(Instant::now(), before);
    }
}

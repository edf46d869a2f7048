//! Paginated listings of the audio section.
//!
//! Every listing is a lazy [`Stream`]: nothing is requested until the first
//! item is polled, and dropping the stream stops pagination without further
//! requests. Each source differs only in how it fetches a page and decides
//! that there are no more; that part implements the [`Pager`] trait. The
//! shared pipelines here turn pages into items:
//!
//! * [`tracks`] resolves the identities of a page in batches through one
//!   [`Resolver`], yielding tracks as their batch completes
//! * [`raw`] yields the audio tuples of a page as they are, with performer
//!   and title unescaped, without resolving or filtering anything
//!
//! A new page is only requested after everything from the previous one was
//! yielded.

pub mod albums;
pub mod listing;
pub mod news;
pub mod popular;
pub mod search;
pub mod updates;

pub use albums::Albums;
pub use listing::Listing;
pub use news::News;
pub use popular::Popular;
pub use search::Search;
pub use updates::Updates;

use std::{collections::VecDeque, future::Future};

use futures_util::{stream, Stream};
use serde_json::Value;

use crate::{
    error::Result,
    http::Transport,
    identity::TrackIdentity,
    protocol::{AudioRecord, Field},
    resolver::{Resolver, BATCH_SIZE},
    scrape,
    track::Track,
};

/// One fetched page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// All tuples of the page, for raw listings.
    pub records: Vec<AudioRecord>,

    /// Identities to resolve, for track listings.
    pub ids: Vec<TrackIdentity>,
}

impl Page {
    /// A page whose identities are those of `records`.
    #[must_use]
    pub fn from_records(records: Vec<AudioRecord>) -> Self {
        let ids = crate::identity::scrap_ids(&records);
        Self { records, ids }
    }
}

/// Source of pages for one listing.
pub trait Pager {
    /// Fetches the next page, or `None` when the listing is exhausted.
    ///
    /// A page without identities does not end the listing; returning it
    /// lets the pager skip pages. Once `None` was returned, it is returned
    /// again without requests.
    ///
    /// With `raw` set the caller only looks at the records of the page.
    fn next_page<T: Transport>(
        &mut self,
        http: &T,
        raw: bool,
    ) -> impl Future<Output = Result<Option<Page>>>;
}

/// Pager yielding a fixed set of identities once, without requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Once(Option<Vec<TrackIdentity>>);

impl Once {
    #[must_use]
    pub fn new(ids: Vec<TrackIdentity>) -> Self {
        Self(Some(ids))
    }
}

impl Pager for Once {
    async fn next_page<T: Transport>(&mut self, _http: &T, _raw: bool) -> Result<Option<Page>> {
        Ok(self.0.take().map(|ids| Page {
            records: Vec::new(),
            ids,
        }))
    }
}

struct TrackState<'a, T, P> {
    http: &'a T,
    pager: P,
    resolver: Resolver,
    pending: VecDeque<TrackIdentity>,
    ready: VecDeque<Track>,
}

/// Streams the resolved tracks of all pages of `pager`.
pub fn tracks<'a, T, P>(
    http: &'a T,
    pager: P,
    resolver: Resolver,
) -> impl Stream<Item = Result<Track>> + 'a
where
    T: Transport,
    P: Pager + 'a,
{
    let state = TrackState {
        http,
        pager,
        resolver,
        pending: VecDeque::new(),
        ready: VecDeque::new(),
    };

    stream::try_unfold(state, next_track)
}

async fn next_track<'a, T, P>(
    mut state: TrackState<'a, T, P>,
) -> Result<Option<(Track, TrackState<'a, T, P>)>>
where
    T: Transport,
    P: Pager,
{
    loop {
        if let Some(track) = state.ready.pop_front() {
            return Ok(Some((track, state)));
        }

        if !state.pending.is_empty() {
            let len = state.pending.len().min(BATCH_SIZE);
            let batch: Vec<_> = state.pending.drain(..len).collect();
            let tracks = state.resolver.resolve(state.http, &batch).await?;
            state.ready.extend(tracks);
            continue;
        }

        match state.pager.next_page(state.http, false).await? {
            Some(page) => state.pending.extend(page.ids),
            None => return Ok(None),
        }
    }
}

struct RawState<'a, T, P> {
    http: &'a T,
    pager: P,
    ready: VecDeque<AudioRecord>,
}

/// Streams the tuples of all pages of `pager` with performer and title
/// unescaped.
pub fn raw<'a, T, P>(http: &'a T, pager: P) -> impl Stream<Item = Result<AudioRecord>> + 'a
where
    T: Transport,
    P: Pager + 'a,
{
    let state = RawState {
        http,
        pager,
        ready: VecDeque::new(),
    };

    stream::try_unfold(state, next_record)
}

async fn next_record<'a, T, P>(
    mut state: RawState<'a, T, P>,
) -> Result<Option<(AudioRecord, RawState<'a, T, P>)>>
where
    T: Transport,
    P: Pager,
{
    loop {
        if let Some(record) = state.ready.pop_front() {
            return Ok(Some((record, state)));
        }

        match state.pager.next_page(state.http, true).await? {
            Some(page) => state.ready.extend(page.records.into_iter().map(unescape)),
            None => return Ok(None),
        }
    }
}

/// Replaces the HTML performer and title of `record` by their text.
fn unescape(mut record: AudioRecord) -> AudioRecord {
    let (performer, title) = scrape::track_info(&record.performer(), &record.title());
    record.set(Field::Performer, Value::String(performer));
    record.set(Field::Title, Value::String(title));
    record
}

/// Skips the first `offset` items of a listing, counted across pages.
///
/// Pages entirely before the offset are swallowed, the page that straddles
/// it is cut to its tail and later pages pass unchanged.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Skip {
    offset: usize,
    seen: usize,
}

impl Skip {
    #[must_use]
    pub fn new(offset: usize) -> Self {
        Self { offset, seen: 0 }
    }

    /// Counts `items` as seen and returns those at or past the offset.
    #[must_use]
    pub fn apply<I>(&mut self, mut items: Vec<I>) -> Vec<I> {
        let seen = self.seen;
        self.seen += items.len();

        if seen >= self.offset {
            items
        } else if self.seen >= self.offset {
            items.split_off(self.offset - seen)
        } else {
            Vec::new()
        }
    }

    /// Whether the offset was reached with the items seen so far.
    #[must_use]
    pub fn reached(&self) -> bool {
        self.seen >= self.offset
    }
}

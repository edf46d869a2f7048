//! Access to the audio section of one logged-in session.
//!
//! [`VkAudio`] is the entry point: it owns the transport and hands out lazy
//! listings. Listings borrow the transport, so several can be consumed side
//! by side; each paces its own resolve requests.
//!
//! # Example
//!
//! ```rust
//! use futures_util::TryStreamExt;
//! use vkaudio::{audio::VkAudio, config::Config, secrets::Secrets};
//!
//! let config = Config::with_secrets(Secrets::from_file("secrets.toml")?);
//! let vk = VkAudio::connect(&config).await?;
//!
//! let mut tracks = std::pin::pin!(vk.get_iter(None, None, None));
//! while let Some(track) = tracks.try_next().await? {
//!     println!("{} - {}", track.artist, track.title);
//! }
//! ```

use futures_util::{Stream, StreamExt, TryStreamExt};
use serde_json::Value;

use crate::{
    album::Album,
    catalog::{self, Albums, Listing, News, Popular, Search, Updates},
    config::Config,
    error::Result,
    http::{Client, Transport},
    identity::scrap_ids,
    normalize::Normalizer,
    protocol::{
        catalog::{SearchScope, Section},
        AudioRecord, OwnerId, UserId, AL_AUDIO_URL, DESKTOP_BASE_URL, MOBILE_BASE_URL,
    },
    resolver::{scrap_tracks, Resolver},
    scrape::{scrap_ids_from_html, scrap_owner_hash, ScrapeError},
    session,
    track::Track,
};

/// Root element of the track on a single track page.
const TRACK_PAGE_ROOT: &str = ".basisDefault";

/// Root element of the attached tracks on a wall post page.
const POST_ROOT: &str = ".audios_list";

pub struct VkAudio<T> {
    http: T,
    user_id: UserId,
    convert_m3u8_links: bool,
}

impl VkAudio<Client> {
    /// Logs in with the session in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be set up or the session
    /// warm-up request fails.
    pub async fn connect(config: &Config) -> Result<Self> {
        let http = session::connect(config).await?;
        Ok(Self::new(
            http,
            config.secrets.user_id,
            config.convert_m3u8_links,
        ))
    }
}

impl<T: Transport> VkAudio<T> {
    /// Wraps a transport that already carries the session of `user_id`.
    #[must_use]
    pub fn new(http: T, user_id: UserId, convert_m3u8_links: bool) -> Self {
        Self {
            http,
            user_id,
            convert_m3u8_links,
        }
    }

    #[must_use]
    pub fn http(&self) -> &T {
        &self.http
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.user_id, self.convert_m3u8_links)
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(self.normalizer())
    }

    fn tracks<P>(&self, pager: P) -> impl Stream<Item = Result<Track>> + '_
    where
        P: catalog::Pager + 'static,
    {
        catalog::tracks(&self.http, pager, self.resolver())
    }

    fn listing(
        &self,
        owner_id: Option<OwnerId>,
        album_id: Option<i64>,
        access_hash: Option<String>,
    ) -> Listing {
        Listing::new(owner_id.unwrap_or(self.user_id), album_id, access_hash)
    }

    /// Tracks of an owner, or of one of their albums.
    ///
    /// `owner_id` defaults to the session's user. Albums that are not public
    /// need their `access_hash`.
    pub fn get_iter(
        &self,
        owner_id: Option<OwnerId>,
        album_id: Option<i64>,
        access_hash: Option<String>,
    ) -> impl Stream<Item = Result<Track>> + '_ {
        self.tracks(self.listing(owner_id, album_id, access_hash))
    }

    /// Like [`get_iter`](Self::get_iter), but yields the unresolved tuples.
    pub fn get_iter_raw(
        &self,
        owner_id: Option<OwnerId>,
        album_id: Option<i64>,
        access_hash: Option<String>,
    ) -> impl Stream<Item = Result<AudioRecord>> + '_ {
        catalog::raw(&self.http, self.listing(owner_id, album_id, access_hash))
    }

    /// All tracks of [`get_iter`](Self::get_iter).
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::AccessDenied`] if the owner cannot be browsed,
    /// or the error of the first request that failed.
    pub async fn get(
        &self,
        owner_id: Option<OwnerId>,
        album_id: Option<i64>,
        access_hash: Option<String>,
    ) -> Result<Vec<Track>> {
        self.get_iter(owner_id, album_id, access_hash)
            .try_collect()
            .await
    }

    /// Albums of an owner, defaulting to the session's user.
    pub fn get_albums_iter(
        &self,
        owner_id: Option<OwnerId>,
    ) -> impl Stream<Item = Result<Album>> + '_ {
        Albums::new(owner_id.unwrap_or(self.user_id)).stream(&self.http)
    }

    /// All albums of [`get_albums_iter`](Self::get_albums_iter).
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::AccessDenied`] if the owner cannot be browsed.
    pub async fn get_albums(&self, owner_id: Option<OwnerId>) -> Result<Vec<Album>> {
        self.get_albums_iter(owner_id).try_collect().await
    }

    /// First page of a search within the audio of one owner.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::AccessDenied`] if the owner cannot be browsed.
    pub async fn search_user(&self, owner_id: Option<OwnerId>, query: &str) -> Result<Vec<Track>> {
        let owner_id = owner_id.unwrap_or(self.user_id);

        let mut form = catalog::search::section_form(owner_id, "search");
        form.push(("q", query.to_owned()));
        let payload: Value = self.http.post(AL_AUDIO_URL, form, true).await?.payload()?;

        let section =
            Section::from_payload(&payload)?.ok_or(ScrapeError::AccessDenied(owner_id))?;
        let ids = section
            .playlists
            .first()
            .map(|playlist| scrap_ids(&playlist.list))
            .unwrap_or_default();

        scrap_tracks(&self.http, ids, self.resolver()).try_collect().await
    }

    /// Searches the whole catalog, skipping the first `offset` results.
    pub fn search_iter(
        &self,
        query: &str,
        offset: usize,
        scope: SearchScope,
    ) -> impl Stream<Item = Result<Track>> + '_ {
        self.tracks(Search::new(self.user_id, query, offset, scope))
    }

    /// Like [`search_iter`](Self::search_iter), but yields the unresolved
    /// tuples of every page at or past the offset.
    pub fn search_iter_raw(
        &self,
        query: &str,
        offset: usize,
        scope: SearchScope,
    ) -> impl Stream<Item = Result<AudioRecord>> + '_ {
        catalog::raw(&self.http, Search::new(self.user_id, query, offset, scope))
    }

    /// At most `count` global search results after `offset`.
    pub fn search(
        &self,
        query: &str,
        count: usize,
        offset: usize,
    ) -> impl Stream<Item = Result<Track>> + '_ {
        self.search_iter(query, offset, SearchScope::Global)
            .take(count)
    }

    /// Recent additions of friends and followed communities.
    pub fn get_updates_iter(&self) -> impl Stream<Item = Result<Track>> + '_ {
        self.tracks(Updates::new(self.user_id))
    }

    /// The popular chart, skipping the first `offset` entries.
    pub fn get_popular_iter(&self, offset: usize) -> impl Stream<Item = Result<Track>> + '_ {
        self.tracks(Popular::new(offset))
    }

    /// New releases, skipping the first `offset` entries.
    pub fn get_news_iter(&self, offset: usize) -> impl Stream<Item = Result<Track>> + '_ {
        self.tracks(News::new(offset))
    }

    /// A single track from its page, or `None` if the page lists none.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MissingRoot`] if the page has no track, which
    /// is what the site serves for tracks that cannot be accessed.
    pub async fn get_audio_by_id(&self, owner_id: OwnerId, audio_id: i64) -> Result<Option<Track>> {
        let url = format!("{MOBILE_BASE_URL}/audio{owner_id}_{audio_id}");
        let response = self.http.get(&url, Vec::new(), false).await?;
        let ids = scrap_ids_from_html(&response.text, TRACK_PAGE_ROOT)?;

        let mut tracks = std::pin::pin!(scrap_tracks(&self.http, ids, self.resolver()));
        tracks.try_next().await
    }

    /// Tracks attached to a wall post.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MissingRoot`] if the post has no attachments
    /// or cannot be accessed.
    pub async fn get_post_audio(&self, owner_id: OwnerId, post_id: i64) -> Result<Vec<Track>> {
        let url = format!("{MOBILE_BASE_URL}/wall{owner_id}_{post_id}");
        let response = self.http.get(&url, Vec::new(), true).await?;
        let ids = scrap_ids_from_html(&response.text, POST_ROOT)?;

        scrap_tracks(&self.http, ids, self.resolver()).try_collect().await
    }

    /// Follows the audio of `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::AccessDenied`] if the owner's audio page does
    /// not offer following.
    pub async fn follow_user(&self, owner_id: OwnerId) -> Result<Value> {
        self.set_following(owner_id, "follow_owner").await
    }

    /// Stops following the audio of `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::AccessDenied`] if the owner's audio page does
    /// not offer following.
    pub async fn unfollow_user(&self, owner_id: OwnerId) -> Result<Value> {
        self.set_following(owner_id, "unfollow_owner").await
    }

    async fn set_following(&self, owner_id: OwnerId, act: &str) -> Result<Value> {
        let url = format!("{DESKTOP_BASE_URL}/audios{owner_id}");
        let page = self.http.get(&url, Vec::new(), true).await?;
        let hash = scrap_owner_hash(&page.text).ok_or(ScrapeError::AccessDenied(owner_id))?;

        let form = vec![
            ("al", "1".to_owned()),
            ("act", act.to_owned()),
            ("owner_id", owner_id.to_string()),
            ("hash", hash),
        ];
        self.http.post(AL_AUDIO_URL, form, true).await?.payload()
    }
}

//! Fast lookups over the library, computed off the interactive thread.
//!
//! The flat album and track collections are handed over once per session. Each is grouped on the
//! [`GroupingEngine`] thread, and the finished indices are picked up by [`MediaGroupings::poll`]
//! (from a UI loop) or [`MediaGroupings::settle`] (from async code). Until an index arrives its
//! lookups return nothing, and [`MediaGroupings::is_computing`] reports that work is outstanding.
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use icu_collator::CollatorBorrowed;
use vibin_state::{Album, Library, Track};

use crate::{
    activity::BackgroundActivity,
    config::GroupingsConfig,
    engine::GroupingEngine,
    grouping::{GroupingKind, GroupingPayload, GroupingRequest, GroupingResponse},
    store::IndexStore,
    tracker::PendingTracker,
};

/// Where an index is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// Never requested.
    Absent,
    /// Requested and not yet answered.
    Pending,
    /// Available for lookups.
    Ready,
    /// Requested, but the answer did not arrive in time.
    Unavailable,
}
impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStatus::Absent => "absent",
            IndexStatus::Pending => "pending",
            IndexStatus::Ready => "ready",
            IndexStatus::Unavailable => "unavailable",
        }
    }
}
impl std::fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct MediaGroupings {
    engine: GroupingEngine,
    tracker: PendingTracker,
    store: IndexStore,
    response_timeout: Option<Duration>,
    collator: Option<CollatorBorrowed<'static>>,
    albums_dispatched: bool,
    tracks_dispatched: bool,
}
impl MediaGroupings {
    pub const ACTIVITY_SOURCE: &str = "media groupings";

    pub fn new(config: &GroupingsConfig, activity: &BackgroundActivity) -> Self {
        Self {
            engine: GroupingEngine::new(),
            tracker: PendingTracker::with_activity(activity.source(Self::ACTIVITY_SOURCE)),
            store: IndexStore::new(),
            response_timeout: config.response_timeout(),
            collator: build_collator(),
            albums_dispatched: false,
            tracks_dispatched: false,
        }
    }

    /// Hands over the album collection. Only the first non-empty collection is grouped;
    /// use [`Self::refresh_albums`] after a refetch.
    pub fn set_albums(&mut self, albums: impl Into<Arc<[Album]>>) {
        if self.albums_dispatched {
            tracing::debug!("albums already grouped this session; ignoring");
            return;
        }
        self.albums_dispatched = self.dispatch_albums(albums.into());
    }

    /// Hands over the track collection. Only the first non-empty collection is grouped;
    /// use [`Self::refresh_tracks`] after a refetch.
    pub fn set_tracks(&mut self, tracks: impl Into<Arc<[Track]>>) {
        if self.tracks_dispatched {
            tracing::debug!("tracks already grouped this session; ignoring");
            return;
        }
        self.tracks_dispatched = self.dispatch_tracks(tracks.into());
    }

    /// Regroups a refetched album collection. The current index stays in place until the new
    /// one is ready.
    pub fn refresh_albums(&mut self, albums: impl Into<Arc<[Album]>>) {
        let dispatched = self.dispatch_albums(albums.into());
        self.albums_dispatched |= dispatched;
    }

    /// Regroups a refetched track collection. The current indices stay in place until the new
    /// ones are ready.
    pub fn refresh_tracks(&mut self, tracks: impl Into<Arc<[Track]>>) {
        let dispatched = self.dispatch_tracks(tracks.into());
        self.tracks_dispatched |= dispatched;
    }

    /// Hands over whichever collections the snapshot contains.
    pub fn load_library(&mut self, library: &Library) {
        if let Some(albums) = &library.albums {
            self.set_albums(albums.as_slice());
        }
        if let Some(tracks) = &library.tracks {
            self.set_tracks(tracks.as_slice());
        }
    }

    /// Applies every response the engine has finished, and gives up on requests that have
    /// waited longer than the configured timeout. Never blocks.
    ///
    /// Returns the number of responses applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Some(response) = self.engine.try_recv() {
            self.handle_response(response);
            applied += 1;
        }
        self.expire_timed_out(Instant::now());
        applied
    }

    /// Waits until nothing is outstanding, either because every response arrived or because the
    /// rest timed out.
    pub async fn settle(&mut self) {
        while self.tracker.is_computing() {
            let deadline = self
                .response_timeout
                .and_then(|timeout| self.tracker.next_deadline(timeout));

            let response = match deadline {
                Some(deadline) => {
                    let deadline = tokio::time::Instant::from_std(deadline);
                    let result = tokio::time::timeout_at(deadline, self.engine.recv()).await;
                    match result {
                        Ok(response) => response,
                        Err(_) => {
                            self.expire_timed_out(Instant::now());
                            continue;
                        }
                    }
                }
                None => self.engine.recv().await,
            };

            match response {
                Some(response) => self.handle_response(response),
                None => {
                    tracing::warn!(
                        "grouping engine stopped with {} requests outstanding",
                        self.tracker.len()
                    );
                    break;
                }
            }
        }
    }

    /// Stores a finished index and clears its request.
    pub fn handle_response(&mut self, response: GroupingResponse) {
        let (id, kind) = (response.id, response.kind());
        if self.tracker.remove(id).is_none() {
            tracing::debug!("response {id} ({kind}) was not pending");
        }
        if self.store.apply(response) {
            tracing::debug!("{kind} index ready");
        }
    }

    /// Albums whose artist name is `artist`, in library order.
    pub fn albums_by_artist_name(&self, artist: &str) -> &[Album] {
        self.store.albums_by_artist_name.get(artist)
    }

    /// Tracks whose artist name is `artist`, in library order.
    pub fn tracks_by_artist_name(&self, artist: &str) -> &[Track] {
        self.store.tracks_by_artist_name.get(artist)
    }

    /// Tracks on the album with ID `album_id`, in library order.
    pub fn tracks_by_album_id(&self, album_id: &str) -> &[Track] {
        self.store.tracks_by_album_id.get(album_id)
    }

    pub fn album_track_count(&self, album_id: &str) -> usize {
        self.tracks_by_album_id(album_id).len()
    }

    /// Whether any grouping is outstanding.
    pub fn is_computing(&self) -> bool {
        self.tracker.is_computing()
    }

    /// Labels of the outstanding groupings, in dispatch order.
    pub fn pending_labels(&self) -> Vec<&'static str> {
        self.tracker.pending_labels()
    }

    pub fn status(&self, kind: GroupingKind) -> IndexStatus {
        if self.tracker.is_pending(kind) {
            IndexStatus::Pending
        } else if self.store.is_ready(kind) {
            IndexStatus::Ready
        } else if self.store.is_unavailable(kind) {
            IndexStatus::Unavailable
        } else {
            IndexStatus::Absent
        }
    }

    /// The number of keys in the index for `kind`, if it is ready.
    pub fn group_count(&self, kind: GroupingKind) -> Option<usize> {
        match kind {
            GroupingKind::AlbumsByArtistName => {
                self.store.albums_by_artist_name.index().map(|index| index.len())
            }
            GroupingKind::TracksByArtistName => {
                self.store.tracks_by_artist_name.index().map(|index| index.len())
            }
            GroupingKind::TracksByAlbumId => {
                self.store.tracks_by_album_id.index().map(|index| index.len())
            }
        }
    }

    /// Every known artist name, collated for display. Artists without a name are left out.
    ///
    /// Taken from the album index when it is ready, otherwise from the track index.
    pub fn artist_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = match (
            self.store.albums_by_artist_name.index(),
            self.store.tracks_by_artist_name.index(),
        ) {
            (Some(index), _) => index.keys().collect(),
            (None, Some(index)) => index.keys().collect(),
            (None, None) => return vec![],
        };
        names.retain(|name| !name.is_empty());

        match &self.collator {
            Some(collator) => names.sort_by(|a, b| collator.compare(a, b).then_with(|| a.cmp(b))),
            None => names.sort_unstable(),
        }
        names
    }
}

/// Case-insensitive collation with numbers ordered by value, for artist listings.
fn build_collator() -> Option<CollatorBorrowed<'static>> {
    let mut collator_preferences = icu_collator::CollatorPreferences::default();
    collator_preferences.numeric_ordering =
        Some(icu_collator::preferences::CollationNumericOrdering::True);

    let mut collator_options = icu_collator::options::CollatorOptions::default();
    collator_options.strength = Some(icu_collator::options::Strength::Primary);

    icu_collator::Collator::try_new(collator_preferences, collator_options)
        .inspect_err(|e| {
            tracing::warn!("failed to create collator, falling back to byte order: {e}")
        })
        .ok()
}
impl MediaGroupings {
    fn dispatch_albums(&mut self, albums: Arc<[Album]>) -> bool {
        if albums.is_empty() {
            tracing::debug!("no albums to group");
            return false;
        }
        self.dispatch(GroupingPayload::AlbumsByArtistName(albums));
        true
    }

    fn dispatch_tracks(&mut self, tracks: Arc<[Track]>) -> bool {
        if tracks.is_empty() {
            tracing::debug!("no tracks to group");
            return false;
        }
        self.dispatch(GroupingPayload::TracksByArtistName(tracks.clone()));
        self.dispatch(GroupingPayload::TracksByAlbumId(tracks));
        true
    }

    fn dispatch(&mut self, payload: GroupingPayload) {
        let kind = payload.kind();
        let id = self.tracker.add(kind);
        self.store.record_dispatch(kind, id);
        tracing::debug!(
            "requesting {kind} over {} items as {id}",
            payload.item_count()
        );
        self.engine.send(GroupingRequest { id, payload });
    }

    fn expire_timed_out(&mut self, now: Instant) {
        let Some(timeout) = self.response_timeout else {
            return;
        };
        for request in self.tracker.expire(now, timeout) {
            tracing::warn!(
                "{} request {} got no response within {timeout:?}; giving up",
                request.kind,
                request.id
            );
            self.store.mark_unavailable(request.kind, request.id);
        }
    }
}

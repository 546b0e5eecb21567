use std::collections::HashMap;

use vibin_state::{Album, Track};

use crate::{
    grouping::{GroupedIndex, GroupingKind, GroupingResponse, GroupingResult},
    tracker::RequestId,
};

/// The state of one cached index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSlot<T> {
    /// Nothing has been computed yet.
    Absent,
    /// A complete index.
    Ready(GroupedIndex<T>),
    /// The computation was requested but did not finish in time.
    Unavailable,
}
impl<T> Default for IndexSlot<T> {
    fn default() -> Self {
        IndexSlot::Absent
    }
}
impl<T> IndexSlot<T> {
    /// The items under `key`, or nothing if the index is not ready.
    pub fn get(&self, key: &str) -> &[T] {
        match self {
            IndexSlot::Ready(index) => index.get(key),
            IndexSlot::Absent | IndexSlot::Unavailable => &[],
        }
    }

    pub fn index(&self) -> Option<&GroupedIndex<T>> {
        match self {
            IndexSlot::Ready(index) => Some(index),
            IndexSlot::Absent | IndexSlot::Unavailable => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, IndexSlot::Ready(_))
    }
}

/// The three cached indices, plus enough bookkeeping to reject out-of-date responses.
///
/// Each slot is only ever replaced with a complete index, never built up in place.
#[derive(Debug, Default)]
pub struct IndexStore {
    pub albums_by_artist_name: IndexSlot<Album>,
    pub tracks_by_artist_name: IndexSlot<Track>,
    pub tracks_by_album_id: IndexSlot<Track>,
    latest_requests: HashMap<GroupingKind, RequestId>,
}
impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes that `id` is now the newest request for `kind`.
    pub fn record_dispatch(&mut self, kind: GroupingKind, id: RequestId) {
        self.latest_requests.insert(kind, id);
    }

    pub fn latest_request(&self, kind: GroupingKind) -> Option<RequestId> {
        self.latest_requests.get(&kind).copied()
    }

    /// Stores the index carried by `response`, unless a newer request for the same kind has
    /// been dispatched since. Returns whether the index was stored.
    pub fn apply(&mut self, response: GroupingResponse) -> bool {
        let kind = response.kind();
        if let Some(latest) = self.latest_request(kind)
            && response.id < latest
        {
            tracing::debug!(
                "discarding stale {kind} response {} (latest is {latest})",
                response.id
            );
            return false;
        }

        match response.result {
            GroupingResult::AlbumsByArtistName(index) => {
                self.albums_by_artist_name = IndexSlot::Ready(index);
            }
            GroupingResult::TracksByArtistName(index) => {
                self.tracks_by_artist_name = IndexSlot::Ready(index);
            }
            GroupingResult::TracksByAlbumId(index) => {
                self.tracks_by_album_id = IndexSlot::Ready(index);
            }
        }
        true
    }

    /// Marks the slot for `kind` as unavailable after request `id` timed out.
    ///
    /// Only the newest request for a kind can do this, and a slot that already holds a complete
    /// index keeps it.
    pub fn mark_unavailable(&mut self, kind: GroupingKind, id: RequestId) {
        if self.latest_request(kind) != Some(id) {
            return;
        }
        fn downgrade<T>(slot: &mut IndexSlot<T>) {
            if !slot.is_ready() {
                *slot = IndexSlot::Unavailable;
            }
        }
        match kind {
            GroupingKind::AlbumsByArtistName => downgrade(&mut self.albums_by_artist_name),
            GroupingKind::TracksByArtistName => downgrade(&mut self.tracks_by_artist_name),
            GroupingKind::TracksByAlbumId => downgrade(&mut self.tracks_by_album_id),
        }
    }

    pub fn is_ready(&self, kind: GroupingKind) -> bool {
        match kind {
            GroupingKind::AlbumsByArtistName => self.albums_by_artist_name.is_ready(),
            GroupingKind::TracksByArtistName => self.tracks_by_artist_name.is_ready(),
            GroupingKind::TracksByAlbumId => self.tracks_by_album_id.is_ready(),
        }
    }

    pub fn is_unavailable(&self, kind: GroupingKind) -> bool {
        match kind {
            GroupingKind::AlbumsByArtistName => {
                matches!(self.albums_by_artist_name, IndexSlot::Unavailable)
            }
            GroupingKind::TracksByArtistName => {
                matches!(self.tracks_by_artist_name, IndexSlot::Unavailable)
            }
            GroupingKind::TracksByAlbumId => {
                matches!(self.tracks_by_album_id, IndexSlot::Unavailable)
            }
        }
    }
}

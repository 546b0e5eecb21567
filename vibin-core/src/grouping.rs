//! Grouping of flat library collections into keyed indices, and the messages used to request
//! that work from the [`GroupingEngine`](crate::engine::GroupingEngine).
use std::{collections::HashMap, sync::Arc};

use vibin_state::{Album, GroupKey, MediaItem, Track};

use crate::tracker::RequestId;

/// One of the fixed grouping computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupingKind {
    AlbumsByArtistName,
    TracksByArtistName,
    TracksByAlbumId,
}
impl GroupingKind {
    pub const ALL: [GroupingKind; 3] = [
        GroupingKind::AlbumsByArtistName,
        GroupingKind::TracksByArtistName,
        GroupingKind::TracksByAlbumId,
    ];

    /// The label used for this computation when reporting what is pending.
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingKind::AlbumsByArtistName => "allAlbumsByArtistName",
            GroupingKind::TracksByArtistName => "allTracksByArtistName",
            GroupingKind::TracksByAlbumId => "allTracksByAlbumId",
        }
    }
}
impl std::fmt::Display for GroupingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A mapping from group key to the items sharing that key.
///
/// Items under a key keep the order they had in the source collection. The index is built once
/// and never mutated afterwards; recomputation produces a new index.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedIndex<T> {
    groups: HashMap<GroupKey, Vec<T>>,
}
impl<T> Default for GroupedIndex<T> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }
}
impl<T: Clone> GroupedIndex<T> {
    /// Partitions `items` by `key` in a single pass.
    ///
    /// Items whose key is empty are grouped under the empty key.
    pub fn build(items: &[T], key: impl Fn(&T) -> &str) -> Self {
        let mut groups: HashMap<GroupKey, Vec<T>> = HashMap::new();
        let mut keyless = 0usize;
        for item in items {
            let key = key(item);
            if key.is_empty() {
                keyless += 1;
            }
            match groups.get_mut(key) {
                Some(group) => group.push(item.clone()),
                None => {
                    groups.insert(GroupKey::new(key), vec![item.clone()]);
                }
            }
        }
        if keyless > 0 {
            tracing::trace!("{keyless} items had no group key; grouped under the empty key");
        }
        Self { groups }
    }
}
impl<T> GroupedIndex<T> {
    /// The items grouped under `key`; empty if there are none.
    pub fn get(&self, key: &str) -> &[T] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The total number of items across all groups.
    pub fn item_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Every key, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(GroupKey::as_str)
    }

    /// Every key with its items, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.groups
            .iter()
            .map(|(key, items)| (key.as_str(), items.as_slice()))
    }
}

/// Groups albums by their artist name.
pub fn group_albums_by_artist_name(albums: &[Album]) -> GroupedIndex<Album> {
    GroupedIndex::build(albums, |album| album.artist_name())
}

/// Groups tracks by their artist name.
pub fn group_tracks_by_artist_name(tracks: &[Track]) -> GroupedIndex<Track> {
    GroupedIndex::build(tracks, |track| track.artist_name())
}

/// Groups tracks by the ID of the album they belong to.
pub fn group_tracks_by_album_id(tracks: &[Track]) -> GroupedIndex<Track> {
    GroupedIndex::build(tracks, Track::album_ref)
}

/// The collection a grouping request operates on.
///
/// The variant selects both the collection's type and the key the items are grouped by.
/// Collections are shared read-only; the caller keeps no way of mutating them.
#[derive(Debug, Clone)]
pub enum GroupingPayload {
    AlbumsByArtistName(Arc<[Album]>),
    TracksByArtistName(Arc<[Track]>),
    TracksByAlbumId(Arc<[Track]>),
}
impl GroupingPayload {
    /// The grouping this payload is for.
    pub fn kind(&self) -> GroupingKind {
        match self {
            GroupingPayload::AlbumsByArtistName(_) => GroupingKind::AlbumsByArtistName,
            GroupingPayload::TracksByArtistName(_) => GroupingKind::TracksByArtistName,
            GroupingPayload::TracksByAlbumId(_) => GroupingKind::TracksByAlbumId,
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            GroupingPayload::AlbumsByArtistName(albums) => albums.len(),
            GroupingPayload::TracksByArtistName(tracks)
            | GroupingPayload::TracksByAlbumId(tracks) => tracks.len(),
        }
    }

    /// Runs the grouping this payload describes.
    pub fn compute(&self) -> GroupingResult {
        match self {
            GroupingPayload::AlbumsByArtistName(albums) => {
                GroupingResult::AlbumsByArtistName(group_albums_by_artist_name(albums))
            }
            GroupingPayload::TracksByArtistName(tracks) => {
                GroupingResult::TracksByArtistName(group_tracks_by_artist_name(tracks))
            }
            GroupingPayload::TracksByAlbumId(tracks) => {
                GroupingResult::TracksByAlbumId(group_tracks_by_album_id(tracks))
            }
        }
    }
}

/// A finished index, tagged with the grouping that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupingResult {
    AlbumsByArtistName(GroupedIndex<Album>),
    TracksByArtistName(GroupedIndex<Track>),
    TracksByAlbumId(GroupedIndex<Track>),
}
impl GroupingResult {
    /// The grouping that produced this result.
    pub fn kind(&self) -> GroupingKind {
        match self {
            GroupingResult::AlbumsByArtistName(_) => GroupingKind::AlbumsByArtistName,
            GroupingResult::TracksByArtistName(_) => GroupingKind::TracksByArtistName,
            GroupingResult::TracksByAlbumId(_) => GroupingKind::TracksByAlbumId,
        }
    }

    /// The number of distinct keys in the index.
    pub fn group_count(&self) -> usize {
        match self {
            GroupingResult::AlbumsByArtistName(index) => index.len(),
            GroupingResult::TracksByArtistName(index) | GroupingResult::TracksByAlbumId(index) => {
                index.len()
            }
        }
    }
}

/// Sent to the engine to request a grouping.
#[derive(Debug, Clone)]
pub struct GroupingRequest {
    pub id: RequestId,
    pub payload: GroupingPayload,
}

/// Sent back by the engine once a grouping is complete.
#[derive(Debug, Clone)]
pub struct GroupingResponse {
    pub id: RequestId,
    pub result: GroupingResult,
}
impl GroupingResponse {
    /// The grouping that produced this response.
    pub fn kind(&self) -> GroupingKind {
        self.result.kind()
    }
}

/// Computes the response for a request. This is all the engine does.
pub fn compute_grouped_index(request: &GroupingRequest) -> GroupingResponse {
    GroupingResponse {
        id: request.id,
        result: request.payload.compute(),
    }
}

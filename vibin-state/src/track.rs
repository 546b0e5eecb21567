use serde::{Deserialize, Serialize};

use crate::{AlbumId, MediaItem, null_as_default};

/// A track ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);
impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        TrackId(id.to_string())
    }
}

/// A track, as the media player reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// The track ID
    pub id: TrackId,
    /// The track title
    pub title: String,
    /// The track artist; empty if the player did not report one
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist: String,
    /// The ID of the album this track belongs to
    #[serde(
        rename = "album",
        alias = "albumId",
        default,
        deserialize_with = "null_as_default"
    )]
    pub album_id: AlbumId,
    /// The album title, if reported alongside the reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_title: Option<String>,
    /// The track number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    /// The disc number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,
    /// The duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}
impl MediaItem for Track {
    fn id(&self) -> &str {
        &self.id.0
    }

    fn artist_name(&self) -> &str {
        &self.artist
    }
}
impl Track {
    /// The album reference, as a plain string.
    pub fn album_ref(&self) -> &str {
        &self.album_id.0
    }
}

use serde::{Deserialize, Serialize};

use crate::{ArtistId, MediaItem, null_as_default};

/// An album ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub String);
impl std::fmt::Display for AlbumId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<&str> for AlbumId {
    fn from(id: &str) -> Self {
        AlbumId(id.to_string())
    }
}

/// An album, as the media player reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    /// The album ID
    pub id: AlbumId,
    /// The album title
    pub title: String,
    /// The album artist name; empty if the player did not report one
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist: String,
    /// The artist ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<ArtistId>,
    /// The release year of the album
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// The genre of the album
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// The number of tracks in the album
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_count: Option<u32>,
}
impl MediaItem for Album {
    fn id(&self) -> &str {
        &self.id.0
    }

    fn artist_name(&self) -> &str {
        &self.artist
    }
}

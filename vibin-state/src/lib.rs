//! Representations of the media player's library, as handed over by the data-fetch layer.
//!
//! Separated out so that the grouping subsystem and the command-line front end agree on one model.
#![deny(missing_docs)]

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

mod album;
pub use album::{Album, AlbumId};

mod track;
pub use track::{Track, TrackId};

mod artist;
pub use artist::ArtistId;

/// The key that a grouped index is addressed by: an artist name or an album ID.
///
/// Artist names are not unique per artist; two artists sharing a display name share a key.
pub type GroupKey = smol_str::SmolStr;

/// Something that lives in the library and can be grouped.
pub trait MediaItem: Clone + Send + Sync + 'static {
    /// The item's unique ID.
    fn id(&self) -> &str;
    /// The denormalized artist name; empty if unknown.
    fn artist_name(&self) -> &str;
}

/// A snapshot of the library's flat collections.
///
/// Either collection may be absent if it has not been fetched yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    /// All albums, in the order the player reported them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albums: Option<Vec<Album>>,
    /// All tracks, in the order the player reported them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<Track>>,
}
impl Library {
    /// Parses a library snapshot from JSON.
    pub fn from_json_str(json: &str) -> LibraryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a library snapshot from disk.
    pub fn load(path: impl AsRef<Path>) -> LibraryResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let library = Self::from_json_str(&contents)?;
        tracing::info!(
            "loaded library from {}: {} albums, {} tracks",
            path.display(),
            library.albums.as_ref().map_or(0, Vec::len),
            library.tracks.as_ref().map_or(0, Vec::len),
        );
        Ok(library)
    }
}

#[derive(Debug)]
/// An error that can occur when loading a library snapshot.
pub enum LibraryError {
    /// The snapshot could not be read.
    Io(std::io::Error),
    /// The snapshot was not valid JSON, or did not match the expected shape.
    Deserialization(serde_json::Error),
}
impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(e) => write!(f, "I/O error: {e}"),
            LibraryError::Deserialization(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}
impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LibraryError::Io(e) => Some(e),
            LibraryError::Deserialization(e) => Some(e),
        }
    }
}
impl From<std::io::Error> for LibraryError {
    fn from(e: std::io::Error) -> Self {
        LibraryError::Io(e)
    }
}
impl From<serde_json::Error> for LibraryError {
    fn from(e: serde_json::Error) -> Self {
        LibraryError::Deserialization(e)
    }
}
/// A result type for library loading.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Players occasionally send `null` where a string is expected; treat it as the default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_library() {
        let library = Library::from_json_str(
            r#"{
                "albums": [{"id": "a1", "artist": "Bowie", "title": "Ziggy Stardust", "year": 1972}],
                "tracks": [
                    {"id": "t1", "artist": "Bowie", "album": "a1", "title": "Five Years"},
                    {"id": "t2", "artist": "Bowie", "albumId": "a1", "title": "Soul Love", "trackNumber": 2}
                ]
            }"#,
        )
        .unwrap();

        let albums = library.albums.unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].id, AlbumId::from("a1"));
        assert_eq!(albums[0].year, Some(1972));

        let tracks = library.tracks.unwrap();
        assert_eq!(tracks[0].album_ref(), "a1");
        assert_eq!(tracks[1].album_id, AlbumId::from("a1"));
        assert_eq!(tracks[1].track_number, Some(2));
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let library = Library::from_json_str(
            r#"{"tracks": [{"id": "t1", "artist": null, "title": "Untitled"}]}"#,
        )
        .unwrap();

        assert!(library.albums.is_none());
        let tracks = library.tracks.unwrap();
        assert_eq!(tracks[0].artist_name(), "");
        assert_eq!(tracks[0].album_ref(), "");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = Library::from_json_str("{\"albums\": 5}").unwrap_err();
        assert!(matches!(err, LibraryError::Deserialization(_)));
        assert!(err.to_string().starts_with("Deserialization error"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Library::load("/nonexistent/vibin/library.json").unwrap_err();
        assert!(matches!(err, LibraryError::Io(_)));
    }
}

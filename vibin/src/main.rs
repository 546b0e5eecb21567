use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use vibin_core::{
    IndexStatus, MediaGroupings, activity::BackgroundActivity, config::Config,
    grouping::GroupingKind,
};
use vibin_state::Library;

/// Look up grouped albums and tracks from a library snapshot.
#[derive(Parser)]
#[command(name = "vibin", version)]
struct Args {
    /// The library snapshot to read; defaults to `general.library_path` from the config.
    #[arg(long)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Albums by an artist, in library order.
    AlbumsByArtist { artist: String },
    /// Tracks by an artist, in library order.
    TracksByArtist { artist: String },
    /// Tracks on an album, in library order.
    TracksByAlbum { album_id: String },
    /// Every artist name, collated.
    Artists,
    /// The state of each index.
    Stats,
}
impl Command {
    fn required_kind(&self) -> Option<GroupingKind> {
        match self {
            Command::AlbumsByArtist { .. } => Some(GroupingKind::AlbumsByArtistName),
            Command::TracksByArtist { .. } => Some(GroupingKind::TracksByArtistName),
            Command::TracksByAlbum { .. } => Some(GroupingKind::TracksByAlbumId),
            Command::Artists | Command::Stats => None,
        }
    }
}

#[derive(Serialize)]
struct IndexStats {
    kind: &'static str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load and save config at startup
    let config = Config::load().context("Failed to load config")?;
    config.save().context("Failed to save config")?;

    let library_path = args
        .library
        .clone()
        .unwrap_or_else(|| config.general.library_path.clone());
    let library = Library::load(&library_path)
        .with_context(|| format!("Failed to load library from {library_path:?}"))?;

    let activity = BackgroundActivity::new();
    let mut groupings = MediaGroupings::new(&config.groupings, &activity);
    groupings.load_library(&library);
    groupings.settle().await;

    if let Some(kind) = args.command.required_kind() {
        match groupings.status(kind) {
            IndexStatus::Ready => {}
            IndexStatus::Absent => {
                tracing::warn!("{kind} was not computed; the library has no matching collection")
            }
            status => anyhow::bail!("{kind} is {status}"),
        }
    }

    let output = match &args.command {
        Command::AlbumsByArtist { artist } => {
            serde_json::to_string_pretty(groupings.albums_by_artist_name(artist))?
        }
        Command::TracksByArtist { artist } => {
            serde_json::to_string_pretty(groupings.tracks_by_artist_name(artist))?
        }
        Command::TracksByAlbum { album_id } => {
            serde_json::to_string_pretty(groupings.tracks_by_album_id(album_id))?
        }
        Command::Artists => serde_json::to_string_pretty(&groupings.artist_names())?,
        Command::Stats => {
            let stats: Vec<IndexStats> = GroupingKind::ALL
                .iter()
                .map(|&kind| IndexStats {
                    kind: kind.as_str(),
                    status: groupings.status(kind).as_str(),
                    groups: groupings.group_count(kind),
                })
                .collect();
            serde_json::to_string_pretty(&stats)?
        }
    };
    println!("{output}");

    Ok(())
}

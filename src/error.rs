use std::path::PathBuf;

/// Non-fatal conditions raised while resolving or playing a playlist.
///
/// None of these stop the signage loop. They are logged and handed to the
/// UI as [`crate::sequencer::Notice::Error`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("No active media to play")]
    EmptyPlaylist,

    #[error("Failed to load {path}: {reason}")]
    AssetLoadFailure { path: PathBuf, reason: String },

    #[error("Malformed schedule on media {id}: {reason}")]
    MalformedSchedule { id: u64, reason: String },

    #[error("Video renderer failed on {path}: {reason}")]
    RendererFailure { path: PathBuf, reason: String },
}

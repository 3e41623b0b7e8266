use anyhow::{anyhow, Result};
use std::path::Path;

use crate::media::{DisplayMode, ScreenGeometry, ScreenTarget, Size};

/// Where the video backend is in the current stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoStatus {
    Idle,
    Playing,
    EndOfStream,
    Failed(String),
}

/// The single output window the sequencer draws into.
pub trait Surface {
    /// Ask for a borderless surface on `screen`. Placement is best effort.
    fn open(&mut self, screen: &ScreenTarget);

    /// Show a still image scaled for `mode`, returning its native size.
    fn render_image(&mut self, path: &Path, mode: DisplayMode, screen: &ScreenGeometry) -> Result<Size>;

    fn resize(&mut self, size: Size);

    /// Hide whatever is currently shown.
    fn clear(&mut self);

    fn close(&mut self);
}

/// Video backend. Completion is reported through [`VideoRenderer::poll`].
pub trait VideoRenderer {
    fn render_video(&mut self, path: &Path, mode: DisplayMode, muted: bool) -> Result<()>;

    fn set_muted(&mut self, muted: bool);

    fn poll(&mut self) -> VideoStatus;

    fn stop_video(&mut self);
}

/// Stand-in used when the binary is built without GStreamer. Every video
/// fails to load, so playlists fall through to their images.
#[derive(Debug, Default)]
pub struct NoVideo;

impl VideoRenderer for NoVideo {
    fn render_video(&mut self, path: &Path, _mode: DisplayMode, _muted: bool) -> Result<()> {
        Err(anyhow!("video playback is not available in this build ({})", path.display()))
    }

    fn set_muted(&mut self, _muted: bool) {}

    fn poll(&mut self) -> VideoStatus {
        VideoStatus::Idle
    }

    fn stop_video(&mut self) {}
}

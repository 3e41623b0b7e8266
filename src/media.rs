use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions accepted by the upload flow, grouped by how they are played.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

pub const DEFAULT_IMAGE_DWELL: u32 = 5;
pub const MAX_IMAGE_DWELL: u32 = 3600;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MediaKind::Image => "Image",
            MediaKind::Video => "Video",
            MediaKind::Other => "Other",
        };
        f.write_str(label)
    }
}

/// Schedule fields as typed by the operator.
///
/// Dates are `dd/mm/yyyy` and times `HH:MM`. They are kept as text so a
/// record with a bad value still round-trips through the catalog; parsing
/// happens in [`crate::schedule`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub start_date: String,
    pub start_time: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl ScheduleEntry {
    pub fn starting(date: &str, time: &str) -> Self {
        Self {
            start_date: date.to_string(),
            start_time: time.to_string(),
            end_date: None,
            end_time: None,
        }
    }

    pub fn until(mut self, date: &str, time: &str) -> Self {
        self.end_date = Some(date.to_string());
        self.end_time = Some(time.to_string());
        self
    }

    pub fn describe(&self) -> String {
        let end = match (&self.end_date, &self.end_time) {
            (Some(date), Some(time)) => format!("{} {}", date, time),
            (Some(date), None) => date.clone(),
            _ => "no end".to_string(),
        };
        format!("{} {} → {}", self.start_date, self.start_time, end)
    }
}

/// One uploaded asset as stored in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: u64,
    pub name: String,
    pub kind: MediaKind,
    pub source_path: PathBuf,
    /// Display time for images. Videos ignore it.
    pub dwell_seconds: u32,
    /// Informational length of a video, never used for sequencing.
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub schedule: Option<ScheduleEntry>,
}

impl MediaRecord {
    pub fn is_playable(&self) -> bool {
        matches!(self.kind, MediaKind::Image | MediaKind::Video)
    }

    /// How long the item holds the screen: dwell for images, the recorded
    /// length for videos, `-` when unknown.
    pub fn length_label(&self) -> String {
        match (self.kind, self.duration_seconds) {
            (MediaKind::Image, _) => format!("{}s", self.dwell_seconds),
            (MediaKind::Video, Some(secs)) => format!("{}:{:02}", secs / 60, secs % 60),
            _ => "-".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Stretch to the whole screen, ignoring aspect ratio.
    #[default]
    Fullscreen,
    /// Keep the source aspect ratio and size.
    Original,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Fullscreen => f.write_str("Fullscreen"),
            DisplayMode::Original => f.write_str("Original"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }
}

/// Output chosen by the operator. The core only requests placement on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenTarget {
    pub index: usize,
    pub name: String,
    pub geometry: ScreenGeometry,
}

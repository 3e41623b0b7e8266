pub mod app;
pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod media;
pub mod render;
pub mod schedule;
pub mod sequencer;
#[cfg(feature = "gstreamer")]
pub mod video_player;

pub use catalog::{Catalog, CatalogProvider};
pub use config::Config;
pub use error::PlaybackError;
pub use media::{DisplayMode, MediaKind, MediaRecord, ScheduleEntry, ScreenGeometry, ScreenTarget, Size};
pub use schedule::{resolve, resolve_active, Resolution};
pub use sequencer::{Event, Notice, PlaybackOptions, PlaybackState, Sequencer};

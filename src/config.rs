use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::media::{DisplayMode, ScreenGeometry, ScreenTarget, DEFAULT_IMAGE_DWELL};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub playback: PlaybackConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
    pub screens: Vec<ScreenConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "./digital_signage.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub muted: bool,
    pub display_mode: DisplayMode,
    pub default_image_dwell: u32,
    pub screen: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            muted: true,
            display_mode: DisplayMode::Fullscreen,
            default_image_dwell: DEFAULT_IMAGE_DWELL,
            screen: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub max_lines: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "signage_player.log".to_string(),
            max_lines: 10000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_width: 800.0,
            window_height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScreenConfig {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Config {
    /// Screens the operator can pick from. Falls back to a single 1920x1080
    /// output at the origin when none are configured.
    pub fn screen_targets(&self) -> Vec<ScreenTarget> {
        if self.screens.is_empty() {
            return vec![ScreenTarget {
                index: 0,
                name: "Screen 1".to_string(),
                geometry: ScreenGeometry::default(),
            }];
        }
        self.screens
            .iter()
            .enumerate()
            .map(|(index, s)| ScreenTarget {
                index,
                name: s.name.clone(),
                geometry: ScreenGeometry {
                    x: s.x,
                    y: s.y,
                    width: s.width,
                    height: s.height,
                },
            })
            .collect()
    }

    /// Selected screen, or the first one if the index is out of range.
    pub fn screen_target(&self, index: usize) -> ScreenTarget {
        let mut targets = self.screen_targets();
        if index < targets.len() {
            targets.swap_remove(index)
        } else {
            warn!("Screen {} not configured, using {}", index, targets[0].name);
            targets.swap_remove(0)
        }
    }

    /// Catalog location, with relative paths taken from `base_dir`.
    pub fn catalog_path(&self, base_dir: &Path) -> PathBuf {
        let path = PathBuf::from(&self.catalog.path);
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }
}

pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
    exe_dir().join("config.toml")
}

/// Read `path`, falling back to defaults if it is missing or unparseable.
pub fn load_config(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(config_str) => match toml::from_str(&config_str) {
            Ok(config) => {
                info!("Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                error!("Failed to parse config {}: {}", path.display(), e);
                Config::default()
            }
        },
        Err(_) => {
            warn!("Config file {} not found, using defaults", path.display());
            Config::default()
        }
    }
}

pub fn save_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    let toml_str = toml::to_string(config)?;
    fs::write(path, toml_str)?;
    info!("Config saved to {}", path.display());
    Ok(())
}

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::media::{MediaKind, MediaRecord, ScheduleEntry, MAX_IMAGE_DWELL};
use crate::schedule::resolve_active;

/// Read side of the media catalog as seen by the player.
pub trait CatalogProvider {
    fn list_all(&self) -> Vec<MediaRecord>;

    fn list_active(&self, now: NaiveDateTime) -> Vec<MediaRecord> {
        resolve_active(&self.list_all(), now)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    next_id: u64,
    media: BTreeMap<u64, MediaRecord>,
}

/// Flat keyed media table persisted as a JSON file.
///
/// Every mutation is written through immediately. Ids come from a counter
/// stored with the table, so a deleted id is never handed out again.
#[derive(Debug)]
pub struct Catalog {
    path: Option<PathBuf>,
    next_id: u64,
    media: BTreeMap<u64, MediaRecord>,
}

impl Catalog {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            next_id: 1,
            media: BTreeMap::new(),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Catalog {} not found, starting empty", path.display());
            return Ok(Self {
                path: Some(path.to_path_buf()),
                ..Self::in_memory()
            });
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let file: CatalogFile = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;

        // Guard against a hand-edited file whose counter lags its records.
        let highest = file.media.keys().next_back().copied().unwrap_or(0);
        let next_id = file.next_id.max(highest + 1);

        info!("Loaded {} media records from {}", file.media.len(), path.display());
        Ok(Self {
            path: Some(path.to_path_buf()),
            next_id,
            media: file.media,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = CatalogFile {
            next_id: self.next_id,
            media: self.media.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&MediaRecord> {
        self.media.get(&id)
    }

    pub fn create(
        &mut self,
        name: &str,
        kind: MediaKind,
        source_path: &Path,
        dwell_seconds: u32,
        duration_seconds: Option<u64>,
    ) -> Result<u64> {
        let id = self.next_id;
        self.next_id += 1;
        self.media.insert(
            id,
            MediaRecord {
                id,
                name: name.to_string(),
                kind,
                source_path: source_path.to_path_buf(),
                dwell_seconds: dwell_seconds.clamp(1, MAX_IMAGE_DWELL),
                duration_seconds,
                schedule: None,
            },
        );
        self.save()?;
        Ok(id)
    }

    /// Register an existing file, classifying it by extension.
    pub fn add_file(&mut self, path: &Path, default_dwell: u32) -> Result<u64> {
        let abs_path = dunce::canonicalize(path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        let name = abs_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("No file name in {}", abs_path.display()))?
            .to_string();
        let kind = MediaKind::from_path(&abs_path);
        if kind == MediaKind::Other {
            warn!("{} is not a supported image or video, it will never play", name);
        }
        let duration = match kind {
            MediaKind::Video => video_duration(&abs_path),
            _ => None,
        };
        let id = self.create(&name, kind, &abs_path, default_dwell, duration)?;
        info!("Added {} as {} with id {}", name, kind, id);
        Ok(id)
    }

    /// Add every supported image and video in `dir`, in file-name order.
    pub fn import_directory(&mut self, dir: &Path, default_dwell: u32) -> Result<Vec<u64>> {
        if !dir.exists() {
            return Err(anyhow!("Media directory does not exist: {}", dir.display()));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && MediaKind::from_path(p) != MediaKind::Other)
            .collect();
        files.sort();

        let mut ids = Vec::with_capacity(files.len());
        for file in &files {
            ids.push(self.add_file(file, default_dwell)?);
        }
        Ok(ids)
    }

    pub fn update_schedule(&mut self, id: u64, schedule: Option<ScheduleEntry>) -> Result<()> {
        let record = self
            .media
            .get_mut(&id)
            .ok_or_else(|| anyhow!("No media with id {}", id))?;
        record.schedule = schedule;
        self.save()
    }

    pub fn update_dwell(&mut self, id: u64, seconds: u32) -> Result<()> {
        let record = self
            .media
            .get_mut(&id)
            .ok_or_else(|| anyhow!("No media with id {}", id))?;
        record.dwell_seconds = seconds.clamp(1, MAX_IMAGE_DWELL);
        self.save()
    }

    /// Remove the given ids, returning how many existed.
    pub fn delete(&mut self, ids: &[u64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let removed = ids.iter().filter(|id| self.media.remove(*id).is_some()).count();
        self.save()?;
        Ok(removed)
    }
}

#[cfg(feature = "gstreamer")]
fn video_duration(path: &Path) -> Option<u64> {
    match crate::video_player::read_duration(path) {
        Ok(duration) => duration,
        Err(e) => {
            warn!("Could not read the length of {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(not(feature = "gstreamer"))]
fn video_duration(_path: &Path) -> Option<u64> {
    None
}

impl CatalogProvider for Catalog {
    fn list_all(&self) -> Vec<MediaRecord> {
        self.media.values().cloned().collect()
    }
}

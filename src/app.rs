use eframe::egui;
use egui_extras::{Column, TableBuilder};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::catalog::{Catalog, CatalogProvider};
use crate::config::Config;
use crate::display::PlayerSurface;
use crate::media::{DisplayMode, MediaRecord, ScheduleEntry, ScreenTarget, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::sequencer::{Notice, PlaybackOptions, Sequencer};

#[cfg(feature = "gstreamer")]
pub type AppVideo = crate::video_player::GstVideoRenderer;
#[cfg(not(feature = "gstreamer"))]
pub type AppVideo = crate::render::NoVideo;

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

/// Form state for editing one record's schedule and dwell.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEditor {
    pub id: u64,
    pub start_date: String,
    pub start_time: String,
    pub has_end: bool,
    pub end_date: String,
    pub end_time: String,
    pub dwell_seconds: u32,
}

impl ScheduleEditor {
    pub fn for_record(record: &MediaRecord, now: chrono::NaiveDateTime) -> Self {
        let today = now.format(DATE_FORMAT).to_string();
        let time = now.format(TIME_FORMAT).to_string();
        match &record.schedule {
            Some(s) => Self {
                id: record.id,
                start_date: s.start_date.clone(),
                start_time: s.start_time.clone(),
                has_end: s.end_date.as_deref().is_some_and(|d| !d.trim().is_empty()),
                end_date: s.end_date.clone().unwrap_or_else(|| today.clone()),
                end_time: s.end_time.clone().unwrap_or_else(|| time.clone()),
                dwell_seconds: record.dwell_seconds,
            },
            None => Self {
                id: record.id,
                start_date: today.clone(),
                start_time: time.clone(),
                has_end: false,
                end_date: today,
                end_time: time,
                dwell_seconds: record.dwell_seconds,
            },
        }
    }

    /// Build the entry to store. A blank start date clears the schedule.
    pub fn to_entry(&self) -> Result<Option<ScheduleEntry>, String> {
        if self.start_date.trim().is_empty() {
            return Ok(None);
        }
        let mut entry = ScheduleEntry::starting(self.start_date.trim(), self.start_time.trim());
        if self.has_end {
            entry = entry.until(self.end_date.trim(), self.end_time.trim());
        }
        entry.window()?;
        Ok(Some(entry))
    }
}

/// Operator console: catalog table, playback controls and the player viewport.
pub struct SignageApp {
    config: Config,
    catalog: Catalog,
    sequencer: Sequencer<PlayerSurface, AppVideo>,
    screens: Vec<ScreenTarget>,
    screen_index: usize,
    display_mode: DisplayMode,
    muted: bool,
    selected: BTreeSet<u64>,
    editor: Option<ScheduleEditor>,
    show_active_only: bool,
    message: Option<String>,
}

impl SignageApp {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        let (tx, rx) = watch::channel(None);
        let surface = PlayerSurface::new(rx);
        #[cfg(feature = "gstreamer")]
        let video = AppVideo::new(tx);
        #[cfg(not(feature = "gstreamer"))]
        let video = {
            drop(tx);
            AppVideo::default()
        };

        let screens = config.screen_targets();
        let screen_index = config.playback.screen.min(screens.len().saturating_sub(1));
        let muted = config.playback.muted;
        let display_mode = config.playback.display_mode;
        Self {
            sequencer: Sequencer::new(surface, video, muted),
            config,
            catalog,
            screens,
            screen_index,
            display_mode,
            muted,
            selected: BTreeSet::new(),
            editor: None,
            show_active_only: false,
            message: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sequencer(&self) -> &Sequencer<PlayerSurface, AppVideo> {
        &self.sequencer
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn select(&mut self, id: u64) {
        self.selected.insert(id);
    }

    pub fn start_playback(&mut self) {
        let Some(screen) = self.screens.get(self.screen_index).cloned() else {
            self.message = Some("No screen configured".to_string());
            return;
        };
        info!("Play requested on {} ({})", screen.name, self.display_mode);
        let options = PlaybackOptions {
            display_mode: self.display_mode,
            screen,
        };
        let local_now = chrono::Local::now().naive_local();
        self.sequencer.play(&self.catalog, local_now, options, Instant::now());
        self.process_notices();
    }

    pub fn stop_playback(&mut self) {
        self.sequencer.stop();
        self.process_notices();
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.sequencer.set_muted(self.muted);
    }

    pub fn add_files(&mut self, files: &[PathBuf]) {
        let mut added = 0;
        for file in files {
            match self.catalog.add_file(file, self.config.playback.default_image_dwell) {
                Ok(_) => added += 1,
                Err(e) => {
                    error!("Failed to add {}: {}", file.display(), e);
                    self.message = Some(format!("Failed to add {}: {}", file.display(), e));
                }
            }
        }
        if added > 0 {
            self.message = Some(format!("Added {} file(s)", added));
        }
    }

    pub fn delete_selected(&mut self) {
        if self.selected.is_empty() {
            self.message = Some("Select at least one item to delete".to_string());
            return;
        }
        let ids: Vec<u64> = self.selected.iter().copied().collect();
        match self.catalog.delete(&ids) {
            Ok(removed) => {
                self.selected.clear();
                if self.editor.as_ref().is_some_and(|e| ids.contains(&e.id)) {
                    self.editor = None;
                }
                self.message = Some(format!("Deleted {} item(s)", removed));
            }
            Err(e) => self.message = Some(format!("Delete failed: {}", e)),
        }
    }

    pub fn open_editor(&mut self, id: u64) {
        if let Some(record) = self.catalog.get(id) {
            self.editor = Some(ScheduleEditor::for_record(record, chrono::Local::now().naive_local()));
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut ScheduleEditor> {
        self.editor.as_mut()
    }

    pub fn save_editor(&mut self) {
        let Some(editor) = self.editor.clone() else {
            return;
        };
        let entry = match editor.to_entry() {
            Ok(entry) => entry,
            Err(e) => {
                self.message = Some(format!("Invalid schedule: {}", e));
                return;
            }
        };
        let result = self
            .catalog
            .update_schedule(editor.id, entry)
            .and_then(|_| self.catalog.update_dwell(editor.id, editor.dwell_seconds));
        match result {
            Ok(()) => {
                self.editor = None;
                self.message = Some("Schedule saved".to_string());
            }
            Err(e) => self.message = Some(format!("Failed to save schedule: {}", e)),
        }
    }

    fn process_notices(&mut self) {
        for notice in self.sequencer.drain_notices() {
            match notice {
                Notice::Started => self.message = Some("Playing".to_string()),
                Notice::Stopped => self.message = Some("Stopped".to_string()),
                Notice::NothingToPlay => {
                    self.message = Some("No scheduled media to show".to_string());
                }
                Notice::Error(e) => {
                    warn!("{}", e);
                    self.message = Some(e.to_string());
                }
            }
        }
    }

    fn pick_files(&mut self) {
        if let Some(files) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .add_filter("Videos", VIDEO_EXTENSIONS)
            .pick_files()
        {
            self.add_files(&files);
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if self.is_playing() {
                if ui.button("Stop").clicked() {
                    self.stop_playback();
                }
            } else if ui.button("Play").clicked() {
                self.start_playback();
            }

            let mute_label = if self.muted { "Unmute" } else { "Mute" };
            if ui.button(mute_label).clicked() {
                self.toggle_mute();
            }

            ui.separator();
            ui.add_enabled_ui(!self.is_playing(), |ui| {
                egui::ComboBox::from_label("Mode")
                    .selected_text(self.display_mode.to_string())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.display_mode, DisplayMode::Fullscreen, "Fullscreen");
                        ui.selectable_value(&mut self.display_mode, DisplayMode::Original, "Original");
                    });

                let current = self
                    .screens
                    .get(self.screen_index)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                egui::ComboBox::from_label("Screen")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for screen in &self.screens {
                            ui.selectable_value(&mut self.screen_index, screen.index, screen.name.as_str());
                        }
                    });
            });
        });

        ui.horizontal(|ui| {
            if ui.button("Add files...").clicked() {
                self.pick_files();
            }
            if ui.button("Delete selected").clicked() {
                self.delete_selected();
            }
            ui.checkbox(&mut self.show_active_only, "Active now only");
        });
    }

    fn table(&mut self, ui: &mut egui::Ui) {
        let now = chrono::Local::now().naive_local();
        let records: Vec<MediaRecord> = if self.show_active_only {
            crate::schedule::resolve_active(&self.catalog.list_all(), now)
        } else {
            self.catalog.list_all()
        };
        let current_id = self.sequencer.current_item().map(|r| r.id);
        let mut edit_request = None;

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::remainder().at_least(160.0))
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto().at_least(200.0))
            .column(Column::auto())
            .header(20.0, |mut header| {
                for title in ["", "ID", "Name", "Type", "Length", "Schedule", ""] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for record in &records {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            let mut checked = self.selected.contains(&record.id);
                            if ui.checkbox(&mut checked, "").changed() {
                                if checked {
                                    self.selected.insert(record.id);
                                } else {
                                    self.selected.remove(&record.id);
                                }
                            }
                        });
                        row.col(|ui| {
                            ui.label(record.id.to_string());
                        });
                        row.col(|ui| {
                            if current_id == Some(record.id) {
                                ui.strong(format!("▶ {}", record.name));
                            } else {
                                ui.label(record.name.as_str());
                            }
                        });
                        row.col(|ui| {
                            ui.label(record.kind.to_string());
                        });
                        row.col(|ui| {
                            ui.label(record.length_label());
                        });
                        row.col(|ui| {
                            let text = record
                                .schedule
                                .as_ref()
                                .map(ScheduleEntry::describe)
                                .unwrap_or_else(|| "always".to_string());
                            ui.label(text);
                        });
                        row.col(|ui| {
                            if ui.small_button("Edit").clicked() {
                                edit_request = Some(record.id);
                            }
                        });
                    });
                }
            });

        if let Some(id) = edit_request {
            self.open_editor(id);
        }
    }

    fn editor_window(&mut self, ctx: &egui::Context) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let mut save = false;
        let mut cancel = false;
        egui::Window::new(format!("Schedule item {}", editor.id))
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("schedule_grid").num_columns(2).show(ui, |ui| {
                    ui.label("Start date (dd/mm/yyyy):");
                    ui.text_edit_singleline(&mut editor.start_date);
                    ui.end_row();
                    ui.label("Start time (HH:MM):");
                    ui.text_edit_singleline(&mut editor.start_time);
                    ui.end_row();
                    ui.label("End:");
                    ui.checkbox(&mut editor.has_end, "Stop showing after");
                    ui.end_row();
                    if editor.has_end {
                        ui.label("End date (dd/mm/yyyy):");
                        ui.text_edit_singleline(&mut editor.end_date);
                        ui.end_row();
                        ui.label("End time (HH:MM):");
                        ui.text_edit_singleline(&mut editor.end_time);
                        ui.end_row();
                    }
                    ui.label("Image dwell (s):");
                    ui.add(egui::DragValue::new(&mut editor.dwell_seconds).range(1..=crate::media::MAX_IMAGE_DWELL));
                    ui.end_row();
                });
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        save = true;
                    }
                    if ui.button("Clear schedule").clicked() {
                        editor.start_date.clear();
                        save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });
        if save {
            self.save_editor();
        } else if cancel {
            self.editor = None;
        }
    }
}

impl eframe::App for SignageApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sequencer.tick(Instant::now());
        self.process_notices();

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let status = match self.sequencer.current_item() {
                    Some(record) => format!("Now showing: {}", record.name),
                    None => format!("{:?}", self.sequencer.state()),
                };
                ui.label(status);
                if let Some(msg) = &self.message {
                    ui.separator();
                    ui.label(msg);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Signage Player");
            ui.separator();
            self.controls(ui);
            ui.separator();
            self.table(ui);
        });

        self.editor_window(ctx);

        if self.sequencer.surface_mut().show(ctx) {
            info!("Player window closed by operator");
            self.stop_playback();
        }

        if self.is_playing() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_millis(500));
        }
    }
}

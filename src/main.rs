use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use eframe::egui;
use log::{info, warn};
use std::path::{Path, PathBuf};

use signage_player::app::SignageApp;
use signage_player::config::{default_config_path, load_config};
use signage_player::logging::{setup_logging, trim_log};
use signage_player::{resolve, Catalog, CatalogProvider, MediaRecord, ScheduleEntry};

#[derive(Parser)]
#[command(name = "signage_player", version, about = "Scheduled digital signage player")]
struct Cli {
    /// Config file to use instead of config.toml next to the executable
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start playback as soon as the console opens
    #[arg(long)]
    play: bool,

    /// Index of the configured screen to play on
    #[arg(long)]
    screen: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the catalog
    List {
        /// Only records whose schedule is active right now
        #[arg(long)]
        active: bool,
    },
    /// Add media files to the catalog
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Add every image and video in a directory
    Import { dir: PathBuf },
    /// Delete records by id
    Remove {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Set or clear the schedule of a record
    Schedule {
        id: u64,
        #[arg(long, required_unless_present = "clear")]
        start_date: Option<String>,
        #[arg(long, default_value = "00:00")]
        start_time: String,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long, requires = "end_date")]
        end_time: Option<String>,
        #[arg(long, conflicts_with_all = ["start_date", "end_date"])]
        clear: bool,
    },
    /// Set how long an image stays on screen
    Dwell { id: u64, seconds: u32 },
}

fn format_record(record: &MediaRecord) -> String {
    let schedule = record
        .schedule
        .as_ref()
        .map(ScheduleEntry::describe)
        .unwrap_or_else(|| "always".to_string());
    format!(
        "{:>4}  {:<6} {:>6}  {:<40} {}",
        record.id,
        record.kind,
        record.length_label(),
        record.name,
        schedule
    )
}

fn run_command(catalog: &mut Catalog, command: Command, default_dwell: u32) -> Result<Vec<String>> {
    let mut out = Vec::new();
    match command {
        Command::List { active } => {
            let now = chrono::Local::now().naive_local();
            let records = if active {
                let resolution = resolve(&catalog.list_all(), now);
                for e in &resolution.malformed {
                    out.push(format!("warning: {}", e));
                }
                resolution.active
            } else {
                catalog.list_all()
            };
            if records.is_empty() {
                out.push("No media".to_string());
            }
            out.extend(records.iter().map(format_record));
        }
        Command::Add { files } => {
            for file in files {
                let id = catalog.add_file(&file, default_dwell)?;
                out.push(format!("Added {} as {}", file.display(), id));
            }
        }
        Command::Import { dir } => {
            let ids = catalog.import_directory(&dir, default_dwell)?;
            out.push(format!("Imported {} file(s) from {}", ids.len(), dir.display()));
        }
        Command::Remove { ids } => {
            let removed = catalog.delete(&ids)?;
            out.push(format!("Removed {} of {} record(s)", removed, ids.len()));
        }
        Command::Schedule {
            id,
            start_date,
            start_time,
            end_date,
            end_time,
            clear,
        } => {
            let entry = match (clear, start_date) {
                (true, _) | (false, None) => None,
                (false, Some(start_date)) => {
                    let mut entry = ScheduleEntry::starting(&start_date, &start_time);
                    if let Some(end_date) = end_date {
                        entry = entry.until(&end_date, end_time.as_deref().unwrap_or("00:00"));
                    }
                    entry
                        .window()
                        .map_err(|e| anyhow!("Invalid schedule: {}", e))?;
                    Some(entry)
                }
            };
            let text = entry
                .as_ref()
                .map(ScheduleEntry::describe)
                .unwrap_or_else(|| "always".to_string());
            catalog.update_schedule(id, entry)?;
            out.push(format!("Record {} scheduled: {}", id, text));
        }
        Command::Dwell { id, seconds } => {
            catalog.update_dwell(id, seconds)?;
            let applied = catalog.get(id).map(|r| r.dwell_seconds).unwrap_or(seconds);
            out.push(format!("Record {} dwell set to {}s", id, applied));
        }
    }
    Ok(out)
}

fn set_gstreamer_plugin_path() {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            // Portable builds ship their plugins next to the binary.
            let gstreamer_plugin_path = exe_dir.join("lib").join("gstreamer-1.0");
            if gstreamer_plugin_path.exists() {
                info!("Found bundled GStreamer plugins at: {}", gstreamer_plugin_path.display());
                std::env::set_var("GST_PLUGIN_PATH", gstreamer_plugin_path);
            } else {
                warn!("Bundled GStreamer plugin directory not found. Relying on system-wide installation.");
            }
        }
    }
}

fn run_gui(config: signage_player::Config, catalog: Catalog, autoplay: bool) -> Result<()> {
    set_gstreamer_plugin_path();
    #[cfg(feature = "gstreamer")]
    {
        if let Err(e) = gstreamer::init() {
            log::error!("Failed to initialize GStreamer, videos will be skipped: {}", e);
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.ui.window_width, config.ui.window_height]),
        ..Default::default()
    };

    eframe::run_native(
        "Signage Player",
        options,
        Box::new(move |_cc| {
            let mut app = SignageApp::new(config, catalog);
            if autoplay {
                app.start_playback();
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("GUI failed: {}", e))
}

fn config_base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path);
    if let Some(screen) = cli.screen {
        config.playback.screen = screen;
    }

    if let Err(e) = setup_logging(&config.logging) {
        eprintln!("Failed to set up logging: {}", e);
    }
    trim_log(&config.logging);
    info!("Starting Signage Player");

    let catalog_path = config.catalog_path(&config_base_dir(&config_path));
    let mut catalog = Catalog::open(&catalog_path)?;
    info!("Catalog {} holds {} record(s)", catalog_path.display(), catalog.len());

    match cli.command {
        Some(command) => {
            for line in run_command(&mut catalog, command, config.playback.default_image_dwell)? {
                println!("{}", line);
            }
            Ok(())
        }
        None => run_gui(config, catalog, cli.play),
    }
}

use anyhow::Result;
use log::{error, info};
use std::fs;
use std::path::Path;

use crate::config::LoggingConfig;

pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .chain(fern::log_file(&config.file)?)
        .apply()?;
    Ok(())
}

/// Keep only the last `max_lines` lines of the log file.
pub fn trim_log(config: &LoggingConfig) {
    let log_path = Path::new(&config.file);
    let Ok(content) = fs::read_to_string(log_path) else {
        return;
    };
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= config.max_lines {
        return;
    }
    let start = lines.len() - config.max_lines;
    let trimmed = lines[start..].join("\n");
    if fs::write(log_path, trimmed + "\n").is_ok() {
        info!("Trimmed log file to {} lines", config.max_lines);
    } else {
        error!("Failed to trim log file");
    }
}

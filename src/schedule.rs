use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::warn;

use crate::error::PlaybackError;
use crate::media::{MediaRecord, ScheduleEntry};

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];

/// Parsed form of a [`ScheduleEntry`]. Both ends are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl ScheduleWindow {
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        if now < self.start {
            return false;
        }
        match self.end {
            Some(end) => now <= end,
            None => true,
        }
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| format!("unrecognised date '{}'", text))
}

fn parse_time(text: Option<&str>) -> Result<NaiveTime, String> {
    let text = text.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Ok(NaiveTime::MIN);
    }
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| format!("unrecognised time '{}'", text))
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

impl ScheduleEntry {
    /// Parse the entry into a window. A blank start date means the entry
    /// carries no schedule at all.
    pub fn window(&self) -> Result<Option<ScheduleWindow>, String> {
        if self.start_date.trim().is_empty() {
            return Ok(None);
        }
        let start = parse_date(&self.start_date)?.and_time(parse_time(Some(self.start_time.as_str()))?);

        let end = if is_blank(self.end_date.as_deref()) {
            if !is_blank(self.end_time.as_deref()) {
                return Err("end time given without an end date".to_string());
            }
            None
        } else {
            let date = parse_date(self.end_date.as_deref().unwrap_or_default())?;
            Some(date.and_time(parse_time(self.end_time.as_deref())?))
        };

        Ok(Some(ScheduleWindow { start, end }))
    }
}

/// Whether `record` should play at `now`. Errors only for unparseable
/// schedules; callers decide what to do with them.
pub fn is_active(record: &MediaRecord, now: NaiveDateTime) -> Result<bool, PlaybackError> {
    let Some(entry) = &record.schedule else {
        return Ok(true);
    };
    match entry.window() {
        Ok(Some(window)) => Ok(window.contains(now)),
        Ok(None) => Ok(true),
        Err(reason) => Err(PlaybackError::MalformedSchedule {
            id: record.id,
            reason,
        }),
    }
}

/// Outcome of filtering a catalog at one instant.
#[derive(Debug, Default)]
pub struct Resolution {
    pub active: Vec<MediaRecord>,
    pub malformed: Vec<PlaybackError>,
}

/// Filter `catalog` down to the records whose window contains `now`,
/// keeping catalog order. Malformed schedules fail open.
pub fn resolve(catalog: &[MediaRecord], now: NaiveDateTime) -> Resolution {
    let mut resolution = Resolution::default();
    for record in catalog {
        match is_active(record, now) {
            Ok(true) => resolution.active.push(record.clone()),
            Ok(false) => {}
            Err(e) => {
                warn!("{}, treating '{}' as active", e, record.name);
                resolution.active.push(record.clone());
                resolution.malformed.push(e);
            }
        }
    }
    resolution
}

pub fn resolve_active(catalog: &[MediaRecord], now: NaiveDateTime) -> Vec<MediaRecord> {
    resolve(catalog, now).active
}

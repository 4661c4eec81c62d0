#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tirelog_contracts::artifact::StrokePoint;
use tirelog_contracts::auth::Role;
use tirelog_contracts::tire::{TireCategory, TireCondition, TireFields, TireRecord};
use tirelog_contracts::TimestampMs;

pub fn default_store_path() -> PathBuf {
    if let Ok(explicit) = env::var("TIRELOG_STORE_PATH") {
        return PathBuf::from(explicit);
    }
    if let Ok(xdg_data_home) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data_home).join("tirelog").join("store.json");
    }
    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("tirelog")
            .join("store.json");
    }
    PathBuf::from(".tirelog").join("store.json")
}

pub fn now() -> TimestampMs {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1)
        .max(1);
    TimestampMs(ms)
}

/// Flags shared by every command, split from the positional arguments.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedArgs {
    pub positional: Vec<String>,
    pub fields: TireFields,
    pub role: Option<Role>,
    pub pin: Option<String>,
    pub query: Option<String>,
    pub condition: Option<TireCondition>,
    pub category: Option<TireCategory>,
}

pub fn parse_args(args: &[String]) -> Result<ParsedArgs, String> {
    let mut out = ParsedArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(flag) = arg.strip_prefix("--") else {
            out.positional.push(arg.clone());
            continue;
        };
        let value = iter
            .next()
            .ok_or_else(|| format!("flag --{flag} requires a value"))?
            .clone();
        match flag {
            "dot" => out.fields.dot = Some(value),
            "brand" => out.fields.brand = Some(value),
            "model" => out.fields.model = Some(value),
            "size" => out.fields.size = Some(value),
            "location" => out.fields.location = Some(value),
            "position" => out.fields.position = Some(value),
            "notes" => out.fields.notes = Some(value),
            "category" => {
                out.fields.category = Some(
                    TireCategory::parse(&value)
                        .ok_or_else(|| format!("unknown category '{value}'"))?,
                );
                out.category = out.fields.category;
            }
            "condition" => {
                out.fields.condition = Some(
                    TireCondition::parse(&value)
                        .ok_or_else(|| format!("unknown condition '{value}'"))?,
                );
                out.condition = out.fields.condition;
            }
            "role" => {
                out.role =
                    Some(Role::parse(&value).ok_or_else(|| format!("unknown role '{value}'"))?);
            }
            "pin" => out.pin = Some(value),
            "query" => out.query = Some(value),
            _ => return Err(format!("unknown flag --{flag}")),
        }
    }
    Ok(out)
}

/// Parses a signature stroke file: one `x,y` pair per line, blank lines
/// ignored.
pub fn parse_stroke_points(raw: &str) -> Result<Vec<StrokePoint>, String> {
    let mut points = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (x, y) = line
            .split_once(',')
            .ok_or_else(|| format!("line {}: expected 'x,y'", lineno + 1))?;
        let x: f32 = x
            .trim()
            .parse()
            .map_err(|_| format!("line {}: invalid x coordinate", lineno + 1))?;
        let y: f32 = y
            .trim()
            .parse()
            .map_err(|_| format!("line {}: invalid y coordinate", lineno + 1))?;
        points.push(StrokePoint::new(x, y));
    }
    Ok(points)
}

pub fn format_record(record: &TireRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}  {} {}  {}  [{}]  {} {}\n",
        record.id.as_str(),
        record.brand,
        record.model,
        record.size,
        record.condition.label(),
        record.location,
        record.position,
    ));
    out.push_str(&format!(
        "  category: {}  dot: {}  photos: {}  updated: {}\n",
        record.category.label(),
        record.dot,
        record.photos.len(),
        record.updated_at.0,
    ));
    if !record.notes.is_empty() {
        out.push_str(&format!("  notes: {}\n", record.notes));
    }
    out.push_str("  history:\n");
    for event in &record.history {
        out.push_str(&format!("    [{}] {}\n", event.at.0, event.note));
    }
    out
}

pub fn format_row(record: &TireRecord) -> String {
    format!(
        "{}  {} {}  {}  [{}]  {} {}",
        record.id.as_str(),
        record.brand,
        record.model,
        record.size,
        record.condition.label(),
        record.location,
        record.position,
    )
}

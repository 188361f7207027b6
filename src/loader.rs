//! Load reference tables from a directory of JSON files.
//!
//! Expected layout:
//!   {dir}/dynasties.json        Vec<Dynasty>
//!   {dir}/rulers.json           Vec<Ruler>
//!   {dir}/eras.json             Vec<Era>
//!   {dir}/dynasty_names.json    Vec<NameEntry>   (optional)
//!   {dir}/ruler_names.json      Vec<NameEntry>   (optional)
//!   {dir}/lunar/**/*.json       Vec<LunarMonth>  (any number of files)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use era_types::LunarMonth;

use crate::error::{ResolveError, Result};
use crate::tables::ReferenceTables;

/// One alias row of a name → ID lookup table.
#[derive(Debug, Clone, Deserialize)]
pub struct NameEntry {
    pub name: String,
    pub id: u32,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ResolveError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn required<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(ResolveError::MissingTable(path));
    }
    read_json(&path)
}

fn optional_names(dir: &Path, name: &str) -> Result<Vec<(String, u32)>> {
    let path = dir.join(name);
    if !path.is_file() {
        debug!(path = %path.display(), "no alias table");
        return Ok(Vec::new());
    }
    let rows: Vec<NameEntry> = read_json(&path)?;
    Ok(rows.into_iter().map(|e| (e.name, e.id)).collect())
}

/// Every `*.json` file under `dir/lunar`, in path order.
fn lunar_files(dir: &Path) -> Vec<PathBuf> {
    let root = dir.join("lunar");
    if !root.is_dir() {
        warn!(path = %root.display(), "no lunar directory, day-level dates cannot be solved");
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(&root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}

pub fn load_tables(dir: &Path) -> Result<ReferenceTables> {
    let dynasties = required(dir, "dynasties.json")?;
    let rulers = required(dir, "rulers.json")?;
    let eras = required(dir, "eras.json")?;
    let dynasty_names = optional_names(dir, "dynasty_names.json")?;
    let ruler_names = optional_names(dir, "ruler_names.json")?;

    let mut lunar: Vec<LunarMonth> = Vec::new();
    for path in lunar_files(dir) {
        let rows: Vec<LunarMonth> = read_json(&path)?;
        if rows.is_empty() {
            warn!(path = %path.display(), "empty lunar table");
        }
        for m in &rows {
            if m.last_day_jdn - m.new_moon_jdn + 1 != m.days as i64 {
                warn!(
                    stream = m.calendar_stream,
                    year = m.year,
                    month = m.month,
                    "month length disagrees with its JDN range"
                );
            }
        }
        lunar.extend(rows);
    }

    let tables = ReferenceTables::new(dynasties, rulers, eras, lunar, dynasty_names, ruler_names)?;
    let s = tables.summary();
    info!(
        dynasties = s.dynasties,
        rulers = s.rulers,
        eras = s.eras,
        lunar_years = s.lunar_years,
        "reference tables loaded"
    );
    Ok(tables)
}

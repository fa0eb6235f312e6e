use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{PrepError, Result};
use crate::models::RawDump;

/// Read every `*.json` file under `dir` as JSON lines of [`RawDump`].
pub fn read_dump_lists(dir: &Path) -> Result<Vec<RawDump>> {
    let mut dumps = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| PrepError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let content = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        let before = dumps.len();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let dump = serde_json::from_str(line).map_err(|source| PrepError::Record {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })?;
            dumps.push(dump);
        }
        debug!("Read {} records from {}", dumps.len() - before, path.display());
    }

    info!("Loaded {} raw dumps from {}", dumps.len(), dir.display());
    Ok(dumps)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| PrepError::json(path, e))
}

/// Write `value` as JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
    }
    let json = serde_json::to_string(value).map_err(|e| PrepError::json(path, e))?;
    fs::write(path, json).map_err(|e| PrepError::io(path, e))
}

const CREATE_SOURCE_CODE: &str = "CREATE TABLE IF NOT EXISTS source_code (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_name TEXT NOT NULL,
    path TEXT NOT NULL,
    identifier_name TEXT NOT NULL,
    copies TEXT NOT NULL,
    size INTEGER NOT NULL,
    content TEXT NOT NULL,
    license TEXT NOT NULL
)";

/// Insert all dumps into the `source_code` table in one transaction.
pub fn export_sqlite(path: &Path, dumps: &[RawDump]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
    }

    let mut conn = Connection::open(path)?;
    conn.execute(CREATE_SOURCE_CODE, [])?;

    let tx = conn.transaction()?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO source_code (repo_name, path, identifier_name, copies, size, content, license)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for dump in dumps {
            insert.execute(params![
                dump.repo_name,
                dump.path,
                dump.identifier_name(),
                dump.copies,
                dump.size,
                dump.content,
                dump.license,
            ])?;
        }
    }
    tx.commit()?;

    info!("Inserted {} rows into {}", dumps.len(), path.display());
    Ok(dumps.len())
}

fn string_column<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

/// Write all dumps as one record batch in the Arrow IPC file (Feather v2)
/// format.
pub fn export_arrow(path: &Path, dumps: &[RawDump]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("repo_name", DataType::Utf8, false),
        Field::new("path", DataType::Utf8, false),
        Field::new("identifier_name", DataType::Utf8, false),
        Field::new("copies", DataType::Utf8, false),
        Field::new("size", DataType::Int64, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("license", DataType::Utf8, false),
    ]));

    let identifiers: Vec<String> = dumps.iter().map(RawDump::identifier_name).collect();
    let columns: Vec<ArrayRef> = vec![
        string_column(dumps.iter().map(|d| d.repo_name.as_str())),
        string_column(dumps.iter().map(|d| d.path.as_str())),
        string_column(identifiers.iter().map(String::as_str)),
        string_column(dumps.iter().map(|d| d.copies.as_str())),
        Arc::new(Int64Array::from_iter_values(dumps.iter().map(|d| d.size))),
        string_column(dumps.iter().map(|d| d.content.as_str())),
        string_column(dumps.iter().map(|d| d.license.as_str())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
    let mut writer = FileWriter::try_new(file, &schema)?;
    writer.write(&batch)?;
    writer.finish()?;

    info!("Wrote {} rows into {}", dumps.len(), path.display());
    Ok(dumps.len())
}

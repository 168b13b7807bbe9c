//! Table writer.
//!
//! Serializes a [`Table`] header first, in the column and record order it was
//! loaded with, reproducing delimiter, line ending and BOM. Saving goes through
//! a temporary file in the destination directory that is renamed over the
//! destination, so a failed write never leaves a truncated table behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{TableError, TableResult};
use crate::models::{LineEnding, Table};
use crate::parser::UTF8_BOM;

/// Write `table` as delimited text to `out`.
pub fn write_table<W: Write>(table: &Table, mut out: W) -> std::io::Result<()> {
    let format = table.format();
    if format.bom {
        out.write_all(UTF8_BOM)?;
    }

    let terminator = match format.line_ending {
        LineEnding::Lf => csv::Terminator::Any(b'\n'),
        LineEnding::CrLf => csv::Terminator::CRLF,
    };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter)
        .terminator(terminator)
        .from_writer(out);

    writer.write_record(table.headers())?;
    for record in table.records() {
        writer.write_record(record.values())?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize `table` to bytes.
pub fn table_to_bytes(table: &Table) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_table(table, &mut buf);
    buf
}

/// Atomically replace `path` with the serialized table.
///
/// Permissions of an existing destination are carried over to the new file.
pub fn save_table<P: AsRef<Path>>(table: &Table, path: P) -> TableResult<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    write_table(table, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| TableError::Io(e.error))?;
    Ok(())
}

/// Copy `path` next to itself as `<stem>_backup_<timestamp>.<ext>`.
pub fn backup_file<P: AsRef<Path>>(path: P) -> TableResult<PathBuf> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_backup_{}.{}", stem, timestamp, ext),
        None => format!("{}_backup_{}", stem, timestamp),
    };
    let backup = path.with_file_name(name);
    fs::copy(path, &backup)?;
    Ok(backup)
}

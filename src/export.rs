use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One record per row, no header line.
    Csv,
    CsvWithHeader,
    /// Indented array of objects keyed by header.
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv | Self::CsvWithHeader => "csv",
            Self::Json => "json",
        }
    }
}

/// Write `rows` to `path`, replacing any existing file.
pub fn export<S: AsRef<str>>(
    headers: &[S],
    rows: &[Vec<String>],
    path: &Path,
    format: ExportFormat,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    match format {
        ExportFormat::Csv => write_csv::<S>(None, rows, path)?,
        ExportFormat::CsvWithHeader => write_csv(Some(headers), rows, path)?,
        ExportFormat::Json => write_json(headers, rows, path)?,
    }

    info!(path = %path.display(), rows = rows.len(), ?format, "exported rows");
    Ok(())
}

fn write_csv<S: AsRef<str>>(headers: Option<&[S]>, rows: &[Vec<String>], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)?;
    if let Some(headers) = headers {
        writer.write_record(headers.iter().map(AsRef::as_ref))?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|e| Error::io(path, e))
}

fn write_json<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>], path: &Path) -> Result<()> {
    let objects: Vec<JsonRow<'_, S>> = rows
        .iter()
        .map(|cells| JsonRow { headers, cells })
        .collect();

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &objects).map_err(Error::Encode)?;
    writer.write_all(b"\n").map_err(|e| Error::io(path, e))?;
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Serializes as a map in column order.
struct JsonRow<'a, S> {
    headers: &'a [S],
    cells: &'a [String],
}

impl<S: AsRef<str>> Serialize for JsonRow<'_, S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (header, cell) in self.headers.iter().zip(self.cells) {
            map.serialize_entry(header.as_ref(), cell)?;
        }
        map.end()
    }
}

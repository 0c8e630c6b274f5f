// src/load/mod.rs
pub mod raw_table;

use csv::ReaderBuilder;
use std::{
    fmt,
    fs::File,
    io::{BufReader, Cursor, Read},
    path::PathBuf,
};
use tracing::{debug, instrument};

use crate::error::{AihError, Result};
pub use raw_table::RawTable;

/// Where a table is read from.
pub enum Source {
    /// A file on disk.
    Path(PathBuf),
    /// Any readable byte stream, e.g. an upload; `name` identifies it in errors.
    Stream {
        name: String,
        reader: Box<dyn Read + Send>,
    },
}

impl Source {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn stream(name: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self::Stream {
            name: name.into(),
            reader: Box::new(reader),
        }
    }

    /// Stream source over an in-memory buffer.
    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::stream(name, Cursor::new(data.into()))
    }

    /// Identifier used in error messages and logs.
    pub fn name(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Stream { name, .. } => name.clone(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Stream { name, .. } => f.debug_struct("Stream").field("name", name).finish(),
        }
    }
}

/// Read a delimited table with a header row from `source`.
///
/// Fails with `SourceNotFound` for an absent path and `ParseFailure` for ragged
/// rows, undecodable bytes or a missing header row.
#[instrument(level = "debug", skip(source), fields(source = %source.name()))]
pub fn load(source: Source, separator: char) -> Result<RawTable> {
    let delimiter = separator_byte(separator)?;
    match source {
        Source::Path(path) => {
            if !path.is_file() {
                return Err(AihError::SourceNotFound { path });
            }
            let origin = path.display().to_string();
            let file = File::open(&path).map_err(|e| AihError::parse_failure(&origin, e))?;
            read_table(origin, BufReader::new(file), delimiter)
        }
        Source::Stream { name, reader } => read_table(name, reader, delimiter),
    }
}

fn separator_byte(separator: char) -> Result<u8> {
    if separator.is_ascii() && separator != '\n' && separator != '\r' && separator != '"' {
        Ok(separator as u8)
    } else {
        Err(AihError::InvalidSeparator(separator))
    }
}

fn read_table<R: Read>(origin: String, reader: R, delimiter: u8) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| AihError::parse_failure(&origin, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(AihError::parse_failure(&origin, "no header row"));
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            AihError::parse_failure(&origin, format!("record {}: {}", idx + 1, e))
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(origin = %origin, columns = headers.len(), rows = rows.len(), "loaded table");
    Ok(RawTable {
        origin,
        headers,
        rows,
    })
}

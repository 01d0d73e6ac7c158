//! Loading a delimited facility file into a raw [`Table`].
//!
//! Load failures are the only fatal errors in the pipeline; everything
//! downstream degrades to informational notices instead.

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_8};
use log::debug;
use thiserror::Error;

use crate::{
    data::{Table, cell_from_raw},
    io_utils,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{name} has no header row")]
    MissingHeader { name: String },

    #[error("malformed record in {name}: {source}")]
    Malformed {
        name: String,
        #[source]
        source: csv::Error,
    },

    #[error("{name} line {line}: text is not valid {encoding}")]
    Decode {
        name: String,
        line: u64,
        encoding: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct SourceOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }
}

/// Reads the raw bytes of `path`; `-` reads standard input.
pub fn read_source(path: &Path) -> Result<Vec<u8>, LoadError> {
    let to_error = |source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    };
    if io_utils::is_dash(path) {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf).map_err(to_error)?;
        Ok(buf)
    } else {
        fs::read(path).map_err(to_error)
    }
}

/// Parses `bytes` into a table. Header names are kept exactly as written;
/// trimming them is the normalizer's job.
pub fn parse_table(name: &str, bytes: &[u8], options: SourceOptions) -> Result<Table, LoadError> {
    let mut reader = io_utils::open_csv_reader(bytes, options.delimiter);
    let malformed = |source| LoadError::Malformed {
        name: name.to_string(),
        source,
    };

    let header_record = reader.byte_headers().map_err(malformed)?.clone();
    if header_record.is_empty() {
        return Err(LoadError::MissingHeader {
            name: name.to_string(),
        });
    }
    let decode_error = |line: u64| LoadError::Decode {
        name: name.to_string(),
        line,
        encoding: options.encoding.name(),
    };
    let headers =
        io_utils::decode_header_record(&header_record, options.encoding).map_err(|_| decode_error(1))?;

    let mut table = Table::new(headers);
    for record in reader.byte_records() {
        let record = record.map_err(malformed)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let decoded =
            io_utils::decode_record(&record, options.encoding).map_err(|_| decode_error(line))?;
        table
            .rows
            .push(decoded.iter().map(|raw| cell_from_raw(raw)).collect());
    }
    debug!("Parsed {name}: {table}");
    Ok(table)
}

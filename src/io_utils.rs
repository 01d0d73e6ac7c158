//! I/O helpers for delimited text: delimiter resolution, encodings, and the
//! reader/writer builders every stage shares.
//!
//! - **Delimiter resolution**: `.tsv` → tab, anything else → comma, unless overridden.
//! - **Encoding**: input decoding and output transcoding via `encoding_rs`,
//!   defaulting to UTF-8 (facility exports from municipal portals are often `shift_jis`).
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn csv_writer<W>(writer: W, delimiter: u8) -> csv::Writer<W>
where
    W: Write,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

/// Flushes an in-memory CSV writer and returns its UTF-8 contents.
pub fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV output: {}", err.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Decodes one field exactly as written. No BOM sniffing happens here, so a
/// U+FEFF inside a cell survives and invalid bytes are always an error.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| anyhow!("Failed to decode text with encoding {}", encoding.name()))
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Decodes the header record, dropping a UTF-8 BOM from the first field only.
pub fn decode_header_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>> {
    record
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let field = match field.strip_prefix(UTF8_BOM) {
                Some(rest) if idx == 0 && encoding == UTF_8 => rest,
                _ => field,
            };
            decode_bytes(field, encoding)
        })
        .collect()
}

/// Encodes UTF-8 text for output, optionally prefixed with a UTF-8 BOM.
pub fn encode_text(text: &str, encoding: &'static Encoding, bom: bool) -> Result<Vec<u8>> {
    let (encoded, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(anyhow!(
            "Failed to encode text using {}",
            encoding.name()
        ));
    }
    let mut bytes = Vec::with_capacity(encoded.len() + UTF8_BOM.len());
    if bom && encoding == UTF_8 {
        bytes.extend_from_slice(UTF8_BOM);
    }
    bytes.extend_from_slice(encoded.as_ref());
    Ok(bytes)
}

/// Writes `bytes` to `path`, or stdout when the path is `-`.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut writer: Box<dyn Write> = if is_dash(path) {
        Box::new(io::stdout().lock())
    } else {
        Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        ))
    };
    writer
        .write_all(bytes)
        .with_context(|| format!("Writing output to {path:?}"))?;
    writer.flush()?;
    Ok(())
}

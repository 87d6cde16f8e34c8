//! Persistence for enriched delay records.
//!
//! Writes the results CSV, optionally gzip-compressed, and reads it back for
//! re-aggregation.

use csv::{ReaderBuilder, WriterBuilder};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::EnrichedDelayRecord;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Serializes records as CSV with a header row into `writer`.
pub fn write_records<W: Write>(name: &str, writer: W, records: &[EnrichedDelayRecord]) -> Result<W> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for record in records {
        writer.serialize(record).map_err(|e| Error::csv(name, e))?;
    }
    writer.flush().map_err(|e| Error::io(name, e))?;

    writer
        .into_inner()
        .map_err(|e| Error::io(name, e.into_error()))
}

/// Writes the results file at `path`, replacing any previous one.
///
/// With `gzip` the CSV is compressed; the path is used as given.
pub fn write_results(path: &str, records: &[EnrichedDelayRecord], gzip: bool) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(path, e))?;
        }
    }

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    if gzip {
        let encoder = write_records(path, GzEncoder::new(file, Compression::default()), records)?;
        encoder.finish().map_err(|e| Error::io(path, e))?;
    } else {
        write_records(path, file, records)?;
    }

    info!(path, records = records.len(), gzip, "Results written");
    Ok(())
}

/// Reads a results CSV, plain or gzip-compressed.
pub fn read_results(name: &str, bytes: &[u8]) -> Result<Vec<EnrichedDelayRecord>> {
    let decompressed;
    let csv_bytes = if bytes.starts_with(&GZIP_MAGIC) {
        let mut buf = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut buf)
            .map_err(|e| Error::io(name, e))?;
        decompressed = buf;
        decompressed.as_slice()
    } else {
        bytes
    };

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(csv_bytes);
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: EnrichedDelayRecord = result.map_err(|e| Error::csv(name, e))?;
        records.push(record);
    }

    debug!(name, records = records.len(), "Results read");
    Ok(records)
}

/// Renders any serializable value as pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::json(std::any::type_name::<T>(), e))
}

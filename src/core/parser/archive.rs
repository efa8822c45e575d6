use crate::core::format;
use crate::domain::model::{FileFormat, Table};
use crate::utils::error::{PrepError, Result};
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Decompress a gzip stream, sniff what the payload looks like, and
/// re-dispatch to the matching parser.
pub fn parse_gzip(bytes: &[u8]) -> Result<Table> {
    let mut decoder = GzDecoder::new(bytes);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| PrepError::parse("gzip", e))?;

    let format = sniff_format(&decompressed);
    tracing::debug!("gzip payload sniffed as {}", format);
    super::parse_bytes(format, "gzip payload", &decompressed)
}

/// Walk a zip archive and parse the first entry with a supported extension.
pub fn parse_zip(bytes: &[u8]) -> Result<Table> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut archive = ZipArchive::new(cursor).map_err(|e| PrepError::parse("zip", e))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| PrepError::parse("zip", e))?;
        if !entry.is_file() {
            continue;
        }

        let name = entry.name().to_string();
        let format = format::detect(&name, "");
        if is_dispatchable(format) {
            tracing::debug!("zip entry '{}' selected as {}", name, format);
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|e| PrepError::parse("zip", e))?;
            return super::parse_bytes(format, &name, &content);
        }
    }

    Err(PrepError::parse(
        "zip",
        anyhow::anyhow!("archive contains no entry with a supported extension"),
    ))
}

fn is_dispatchable(format: FileFormat) -> bool {
    matches!(
        format,
        FileFormat::Csv
            | FileFormat::Tsv
            | FileFormat::Excel
            | FileFormat::Json
            | FileFormat::Xml
            | FileFormat::Yaml
            | FileFormat::Toml
            | FileFormat::Ini
            | FileFormat::Log
    )
}

/// Cheap shape sniff for extension-less content: JSON/XML by first byte,
/// then delimiter counts on the first line, plain text otherwise.
fn sniff_format(bytes: &[u8]) -> FileFormat {
    let text = super::decode_text(bytes);
    let trimmed = text.trim_start();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return FileFormat::Json;
    }
    if trimmed.starts_with('<') {
        return FileFormat::Xml;
    }

    let first_line = trimmed.lines().next().unwrap_or("");
    if first_line.contains('\t') {
        return FileFormat::Tsv;
    }
    if first_line.contains(',') {
        return FileFormat::Csv;
    }

    FileFormat::Log
}

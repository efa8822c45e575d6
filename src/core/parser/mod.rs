pub mod archive;
pub mod delimited;
pub mod excel;
pub mod log;
pub mod structured;
pub mod xml;

use crate::domain::model::{FileFormat, FileInput, Table};
use crate::utils::error::{PrepError, Result};

/// Parse a file's raw bytes according to its detected format.
pub fn parse_file(format: FileFormat, input: &FileInput) -> Result<Table> {
    parse_bytes(format, &input.name, &input.bytes)
}

pub(crate) fn parse_bytes(format: FileFormat, name: &str, bytes: &[u8]) -> Result<Table> {
    tracing::debug!("Parsing {} as {}", name, format);
    match format {
        FileFormat::Csv => delimited::parse(bytes, b','),
        FileFormat::Tsv => delimited::parse(bytes, b'\t'),
        FileFormat::Excel => excel::parse(bytes),
        FileFormat::Json => structured::parse_json(bytes),
        FileFormat::Yaml => structured::parse_yaml(bytes),
        // INI files are close enough to TOML that the same reader covers the
        // common case; anything it rejects surfaces as a parse error.
        FileFormat::Toml | FileFormat::Ini => structured::parse_toml(bytes),
        FileFormat::Xml => xml::parse(bytes),
        FileFormat::Log => log::parse(bytes),
        FileFormat::Gzip => archive::parse_gzip(bytes),
        FileFormat::Zip => archive::parse_zip(bytes),
        // Recognized but deliberately not decoded: fabricating rows for
        // binary columnar files would be worse than refusing them.
        FileFormat::Parquet
        | FileFormat::Numpy
        | FileFormat::Pickle
        | FileFormat::Hdf5
        | FileFormat::Feather
        | FileFormat::Arrow
        | FileFormat::Avro
        | FileFormat::Orc => Err(PrepError::UnsupportedFormat {
            format: format!("{} (binary columnar formats are not decoded)", format),
        }),
        FileFormat::Unknown => Err(PrepError::UnsupportedFormat {
            format: "unknown".to_string(),
        }),
    }
}

/// Decode raw bytes to text, tolerating a UTF-8/UTF-16 BOM and invalid
/// sequences (replaced, not fatal).
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    text.into_owned()
}

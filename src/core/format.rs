use crate::domain::model::FileFormat;

/// Priority-ordered extension table. First suffix match wins, so compound
/// suffixes like `.tar.gz` must come before their tails.
const EXTENSION_TABLE: &[(&str, FileFormat)] = &[
    (".tar.gz", FileFormat::Gzip),
    (".tgz", FileFormat::Gzip),
    (".csv", FileFormat::Csv),
    (".tsv", FileFormat::Tsv),
    (".tab", FileFormat::Tsv),
    (".xlsx", FileFormat::Excel),
    (".xlsm", FileFormat::Excel),
    (".xls", FileFormat::Excel),
    (".jsonl", FileFormat::Json),
    (".ndjson", FileFormat::Json),
    (".json", FileFormat::Json),
    (".xml", FileFormat::Xml),
    (".yaml", FileFormat::Yaml),
    (".yml", FileFormat::Yaml),
    (".toml", FileFormat::Toml),
    (".ini", FileFormat::Ini),
    (".cfg", FileFormat::Ini),
    (".log", FileFormat::Log),
    (".txt", FileFormat::Log),
    (".out", FileFormat::Log),
    (".gz", FileFormat::Gzip),
    (".zip", FileFormat::Zip),
    (".parquet", FileFormat::Parquet),
    (".pq", FileFormat::Parquet),
    (".npy", FileFormat::Numpy),
    (".npz", FileFormat::Numpy),
    (".pkl", FileFormat::Pickle),
    (".pickle", FileFormat::Pickle),
    (".h5", FileFormat::Hdf5),
    (".hdf5", FileFormat::Hdf5),
    (".feather", FileFormat::Feather),
    (".arrow", FileFormat::Arrow),
    (".ipc", FileFormat::Arrow),
    (".avro", FileFormat::Avro),
    (".orc", FileFormat::Orc),
];

/// MIME fallback, substring matched. Specific entries before generic ones:
/// `text/csv` must hit `csv` before `text/` could mean anything else.
const MIME_TABLE: &[(&str, FileFormat)] = &[
    ("csv", FileFormat::Csv),
    ("tab-separated", FileFormat::Tsv),
    ("spreadsheet", FileFormat::Excel),
    ("ms-excel", FileFormat::Excel),
    ("json", FileFormat::Json),
    ("xml", FileFormat::Xml),
    ("yaml", FileFormat::Yaml),
    ("toml", FileFormat::Toml),
    ("gzip", FileFormat::Gzip),
    ("zip", FileFormat::Zip),
    ("parquet", FileFormat::Parquet),
    ("avro", FileFormat::Avro),
    ("text/plain", FileFormat::Log),
];

/// Detect a file's format from its name and declared MIME type.
///
/// The extension is consulted first; the MIME type is only a fallback, so a
/// misleading MIME never overrides a recognized extension.
pub fn detect(file_name: &str, mime: &str) -> FileFormat {
    let name = file_name.to_lowercase();
    for (suffix, format) in EXTENSION_TABLE {
        if name.ends_with(suffix) {
            return *format;
        }
    }

    let mime = mime.to_lowercase();
    if !mime.is_empty() {
        for (needle, format) in MIME_TABLE {
            if mime.contains(needle) {
                return *format;
            }
        }
    }

    FileFormat::Unknown
}

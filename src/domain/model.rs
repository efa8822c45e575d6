use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One row of a parsed table. Key order is not meaningful here; the owning
/// [`Table`] carries the ordered field list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// Ordered records plus the ordered field-name list. Fields may exist that no
/// record populates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub records: Vec<Record>,
    pub fields: Vec<String>,
}

impl Table {
    pub fn new(fields: Vec<String>, records: Vec<Record>) -> Self {
        Self { records, fields }
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Recognized input formats. Detection maps file extension first, MIME type
/// second; see `core::format::detect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Tsv,
    Excel,
    Json,
    Xml,
    Yaml,
    Toml,
    Log,
    Ini,
    Gzip,
    Zip,
    Parquet,
    Numpy,
    Pickle,
    Hdf5,
    Feather,
    Arrow,
    Avro,
    Orc,
    Unknown,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Excel => "excel",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Log => "log",
            Self::Ini => "ini",
            Self::Gzip => "gzip",
            Self::Zip => "zip",
            Self::Parquet => "parquet",
            Self::Numpy => "numpy",
            Self::Pickle => "pickle",
            Self::Hdf5 => "hdf5",
            Self::Feather => "feather",
            Self::Arrow => "arrow",
            Self::Avro => "avro",
            Self::Orc => "orc",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of inferred field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Date,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldStats {
    pub name: String,
    pub type_guess: FieldType,
    pub unique_count: usize,
    pub missing_count: usize,
    pub numeric: Option<NumericSummary>,
}

/// Read-only summary of a parsed table. Built once after parsing; replaced
/// wholesale, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub fields: Vec<FieldStats>,
    pub size_bytes: usize,
    pub source_format: FileFormat,
    pub sample: Vec<Record>,
}

/// Date layouts the plan builder can pin down. `Auto` means the applier tries
/// the whole known-format list per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePattern {
    Auto,
    Iso,
    MonthDayYear,
    DayMonthYearDot,
    DayMonthYearDash,
    MonthDayYearShort,
}

impl DatePattern {
    /// Detection order matters: more specific layouts come before the
    /// permissive short-year form.
    pub const DETECTABLE: [Self; 5] = [
        Self::Iso,
        Self::MonthDayYear,
        Self::DayMonthYearDot,
        Self::DayMonthYearDash,
        Self::MonthDayYearShort,
    ];

    pub fn regex_source(&self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            Self::Iso => Some(r"^\d{4}-\d{2}-\d{2}$"),
            Self::MonthDayYear => Some(r"^\d{1,2}/\d{1,2}/\d{4}$"),
            Self::DayMonthYearDot => Some(r"^\d{1,2}\.\d{1,2}\.\d{4}$"),
            Self::DayMonthYearDash => Some(r"^\d{1,2}-\d{1,2}-\d{4}$"),
            Self::MonthDayYearShort => Some(r"^\d{1,2}/\d{1,2}/\d{2,4}$"),
        }
    }

    pub fn chrono_format(&self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            Self::Iso => Some("%Y-%m-%d"),
            Self::MonthDayYear => Some("%m/%d/%Y"),
            Self::DayMonthYearDot => Some("%d.%m.%Y"),
            Self::DayMonthYearDash => Some("%d-%m-%Y"),
            Self::MonthDayYearShort => Some("%m/%d/%y"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeMethod {
    Mean,
    Median,
    Mode,
}

/// One declarative normalization operation. Matched exhaustively by the
/// applier; constructing a plan never mutates existing transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Transform {
    SetType {
        field: String,
        to: FieldType,
    },
    ParseDate {
        field: String,
        pattern: DatePattern,
    },
    NormalizeDecimal {
        field: String,
        decimal: char,
        thousands: char,
    },
    Trim {
        field: String,
    },
    RegexReplace {
        field: String,
        pattern: String,
        replacement: String,
    },
    DropDuplicates {
        subset: Option<Vec<String>>,
    },
    Impute {
        field: String,
        method: ImputeMethod,
    },
    Clip {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl Transform {
    /// The field a transform targets, if it targets exactly one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::SetType { field, .. }
            | Self::ParseDate { field, .. }
            | Self::NormalizeDecimal { field, .. }
            | Self::Trim { field }
            | Self::RegexReplace { field, .. }
            | Self::Impute { field, .. }
            | Self::Clip { field, .. } => Some(field),
            Self::DropDuplicates { .. } => None,
        }
    }
}

/// Before/after sample explaining one tracked transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub field: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlanStats {
    pub row_count: usize,
    pub column_count: usize,
    pub transform_count: usize,
    pub duplicates_removed: bool,
}

/// Ordered transforms plus preview samples and summary stats. Built once per
/// cleaning session; consumed by the applier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformPlan {
    pub items: Vec<Transform>,
    pub preview: Vec<PreviewEntry>,
    pub stats: PlanStats,
}

/// A file handed to the batch engine: name, declared MIME type and raw bytes.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileStatus {
    Completed {
        profile: DataProfile,
        plan: TransformPlan,
        output_path: Option<String>,
    },
    Error {
        message: String,
    },
}

/// Per-file result of a batch run. One file failing never affects the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, FileStatus::Completed { .. })
    }
}

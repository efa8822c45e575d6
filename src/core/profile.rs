use crate::domain::model::{
    DataProfile, FieldStats, FieldType, FileFormat, NumericSummary, Table,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashSet;

/// All-integer fields whose unique-to-total ratio exceeds this are treated as
/// identifiers (strings), not measures.
const IDENTIFIER_RATIO: f64 = 0.8;

const BOOLEAN_TOKENS: &[&str] = &["true", "false", "1", "0", "yes", "no"];

/// Build the read-only profile consumed by downstream tooling: per-field
/// stats plus table-level counts and a leading record sample.
pub fn build_profile(
    table: &Table,
    size_bytes: usize,
    source_format: FileFormat,
    sample_rows: usize,
) -> DataProfile {
    let fields = table
        .fields
        .iter()
        .map(|field| field_stats(table, field))
        .collect();

    DataProfile {
        row_count: table.row_count(),
        column_count: table.column_count(),
        fields,
        size_bytes,
        source_format,
        sample: table.records.iter().take(sample_rows).cloned().collect(),
    }
}

fn field_stats(table: &Table, field: &str) -> FieldStats {
    let mut missing = 0usize;
    let mut present: Vec<String> = Vec::new();

    for record in &table.records {
        match value_text(record.get(field)) {
            Some(text) => present.push(text),
            None => missing += 1,
        }
    }

    let unique = present
        .iter()
        .map(|s| s.as_str())
        .collect::<HashSet<_>>()
        .len();

    let type_guess = guess_type(&present, unique);
    let numeric = match type_guess {
        FieldType::Integer | FieldType::Number => numeric_summary(&present),
        _ => None,
    };

    FieldStats {
        name: field.to_string(),
        type_guess,
        unique_count: unique,
        missing_count: missing,
        numeric,
    }
}

/// Ordered type inference over a field's non-missing values. The numeric
/// check runs before the date check: numeric strings would otherwise be
/// swallowed by a permissive date parser.
pub fn guess_type(values: &[String], unique_count: usize) -> FieldType {
    if values.is_empty() {
        return FieldType::String;
    }

    let numbers: Option<Vec<f64>> = values.iter().map(|v| plain_number(v)).collect();
    if let Some(numbers) = numbers {
        let all_integral = numbers.iter().all(|n| n.fract() == 0.0);
        let ratio = unique_count as f64 / values.len() as f64;
        if all_integral && ratio > IDENTIFIER_RATIO {
            // High-cardinality integers are usually identifiers, not measures.
            return FieldType::String;
        }
        return if all_integral {
            FieldType::Integer
        } else {
            FieldType::Number
        };
    }

    if values.iter().all(|v| parse_any_date(v).is_some()) {
        return FieldType::Date;
    }

    if values
        .iter()
        .all(|v| BOOLEAN_TOKENS.contains(&v.trim().to_lowercase().as_str()))
    {
        return FieldType::Boolean;
    }

    FieldType::String
}

/// Strict numeric conversion (no separator stripping; that is the plan
/// builder's looser territory).
pub(crate) fn plain_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Try every known date layout; datetime layouts are truncated to their date.
pub(crate) fn parse_any_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }

    None
}

/// Text rendering of a cell, `None` when the cell counts as missing (null or
/// empty string).
pub(crate) fn value_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            if s.is_empty() {
                None
            } else {
                Some(s.clone())
            }
        }
        Some(other) => Some(other.to_string()),
    }
}

fn numeric_summary(values: &[String]) -> Option<NumericSummary> {
    let mut numbers: Vec<f64> = values.iter().filter_map(|v| plain_number(v)).collect();
    if numbers.is_empty() {
        return None;
    }

    numbers.sort_by(|a, b| a.total_cmp(b));
    let count = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / count;
    let median = if numbers.len() % 2 == 1 {
        numbers[numbers.len() / 2]
    } else {
        (numbers[numbers.len() / 2 - 1] + numbers[numbers.len() / 2]) / 2.0
    };
    let variance = numbers.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / count;

    Some(NumericSummary {
        min: numbers[0],
        max: numbers[numbers.len() - 1],
        mean,
        median,
        std: variance.sqrt(),
    })
}

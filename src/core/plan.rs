use crate::core::profile::{parse_any_date, value_text};
use crate::domain::model::{
    DatePattern, FieldType, PlanStats, PreviewEntry, Record, Table, Transform, TransformPlan,
};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// How many values per field the heuristics look at.
const VALUE_SAMPLE: usize = 100;
/// Share of sampled values that must be numeric for a field to qualify.
const NUMERIC_THRESHOLD: f64 = 0.7;
/// Share of sampled values that must be date-like for a field to qualify.
const DATE_THRESHOLD: f64 = 0.5;
/// How many values the date-pattern vote considers.
const PATTERN_SAMPLE: usize = 50;
/// Share of votes a single pattern needs before it beats `auto`.
const PATTERN_DOMINANCE: f64 = 0.8;
/// How many rows the duplicate scan serializes.
const DUPLICATE_SAMPLE: usize = 1000;

/// Build a normalization plan for a table. Deterministic: the same table
/// always produces the same plan. Never fails; fields that qualify for no
/// heuristic simply receive fewer transforms.
pub fn build_plan(table: &Table) -> TransformPlan {
    let mut items: Vec<Transform> = Vec::new();
    let mut preview: Vec<PreviewEntry> = Vec::new();

    for field in &table.fields {
        let samples = sample_values(table, field);

        if looks_like_number(&samples) {
            let (decimal, thousands) = detect_locale(&samples);
            items.push(Transform::NormalizeDecimal {
                field: field.clone(),
                decimal,
                thousands,
            });
            items.push(Transform::SetType {
                field: field.clone(),
                to: FieldType::Number,
            });
            if let Some(first) = samples.first() {
                if let Some(number) = locale_number(first, decimal, thousands) {
                    preview.push(PreviewEntry {
                        field: field.clone(),
                        before: first.clone(),
                        after: format_number(number),
                    });
                }
            }
        } else if let Some(pattern) = looks_like_date(&samples) {
            items.push(Transform::ParseDate {
                field: field.clone(),
                pattern,
            });
            items.push(Transform::SetType {
                field: field.clone(),
                to: FieldType::Date,
            });
            if let Some(first) = samples.first() {
                if let Some(date) = parse_with_pattern(first, pattern) {
                    preview.push(PreviewEntry {
                        field: field.clone(),
                        before: first.clone(),
                        after: date.format("%Y-%m-%d").to_string(),
                    });
                }
            }
        }

        // Idempotent whitespace stripping applies to every field.
        items.push(Transform::Trim {
            field: field.clone(),
        });
    }

    let duplicates_removed = has_duplicate_rows(table);
    if duplicates_removed {
        items.push(Transform::DropDuplicates { subset: None });
    }

    let stats = PlanStats {
        row_count: table.row_count(),
        column_count: table.column_count(),
        transform_count: items.len(),
        duplicates_removed,
    };

    TransformPlan {
        items,
        preview,
        stats,
    }
}

fn sample_values(table: &Table, field: &str) -> Vec<String> {
    table
        .records
        .iter()
        .filter_map(|record| value_text(record.get(field)))
        .take(VALUE_SAMPLE)
        .collect()
}

fn looks_like_number(samples: &[String]) -> bool {
    if samples.is_empty() {
        return false;
    }
    let numeric = samples.iter().filter(|s| loose_number(s).is_some()).count();
    numeric as f64 / samples.len() as f64 >= NUMERIC_THRESHOLD
}

/// Forgiving numeric conversion used only to decide whether a field is
/// numeric at all. Tries the grouped-thousands reading first, then the
/// European comma-decimal reading.
pub(crate) fn loose_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let grouped: String = raw.chars().filter(|c| !matches!(c, ',' | ' ')).collect();
    if let Some(number) = grouped.parse::<f64>().ok().filter(|n| n.is_finite()) {
        return Some(number);
    }

    let european: String = raw
        .chars()
        .filter(|c| !matches!(c, '.' | ' '))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    european.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Convert one raw value with known separators.
pub(crate) fn locale_number(raw: &str, decimal: char, thousands: char) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != thousands && *c != ' ')
        .map(|c| if c == decimal { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn decimal_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\d{1,2}$").expect("decimal comma pattern compiles"))
}

fn decimal_dot_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.\d{1,2}$").expect("decimal dot pattern compiles"))
}

/// Vote on the decimal separator by counting separators sitting in decimal
/// position (trailing, followed by one or two digits); separators grouping
/// three digits are thousands marks and carry no vote. Ties fall back to the
/// dot-decimal default.
pub(crate) fn detect_locale(samples: &[String]) -> (char, char) {
    let mut commas = 0usize;
    let mut dots = 0usize;

    for sample in samples.iter().take(VALUE_SAMPLE) {
        let trimmed = sample.trim();
        if decimal_comma_re().is_match(trimmed) {
            commas += 1;
        }
        if decimal_dot_re().is_match(trimmed) {
            dots += 1;
        }
    }

    if commas > dots {
        (',', '.')
    } else {
        ('.', ',')
    }
}

fn pattern_regexes() -> &'static Vec<(DatePattern, Regex)> {
    static REGEXES: OnceLock<Vec<(DatePattern, Regex)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        DatePattern::DETECTABLE
            .iter()
            .map(|pattern| {
                let source = pattern
                    .regex_source()
                    .expect("detectable patterns carry a regex");
                (
                    *pattern,
                    Regex::new(source).expect("date pattern compiles"),
                )
            })
            .collect()
    })
}

/// Date qualification plus dominant-pattern detection. Returns the pattern to
/// parse with, or `None` when the field is not date-like at all.
fn looks_like_date(samples: &[String]) -> Option<DatePattern> {
    if samples.is_empty() {
        return None;
    }

    let date_like = samples
        .iter()
        .filter(|s| {
            parse_any_date(s).is_some()
                || pattern_regexes().iter().any(|(_, re)| re.is_match(s.trim()))
        })
        .count();
    if (date_like as f64 / samples.len() as f64) < DATE_THRESHOLD {
        return None;
    }

    let votes: Vec<&String> = samples.iter().take(PATTERN_SAMPLE).collect();
    for (pattern, re) in pattern_regexes() {
        let matched = votes.iter().filter(|s| re.is_match(s.trim())).count();
        if matched as f64 / votes.len() as f64 > PATTERN_DOMINANCE {
            return Some(*pattern);
        }
    }

    Some(DatePattern::Auto)
}

/// Parse with the plan's pinned layout, falling back to the full format list.
pub(crate) fn parse_with_pattern(raw: &str, pattern: DatePattern) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(format) = pattern.chrono_format() {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    parse_any_date(raw)
}

/// Canonical row serialization used for duplicate detection: values rendered
/// in field order, so key order inside a record never matters.
pub(crate) fn canonical_row(record: &Record, fields: &[String]) -> String {
    let values: Vec<&serde_json::Value> = fields
        .iter()
        .map(|field| record.get(field).unwrap_or(&serde_json::Value::Null))
        .collect();
    serde_json::to_string(&values).unwrap_or_default()
}

fn has_duplicate_rows(table: &Table) -> bool {
    let mut seen = HashSet::new();
    for record in table.records.iter().take(DUPLICATE_SAMPLE) {
        if !seen.insert(canonical_row(record, &table.fields)) {
            return true;
        }
    }
    false
}

pub(crate) fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

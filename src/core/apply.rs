use crate::core::plan::{canonical_row, parse_with_pattern};
use crate::core::profile::{parse_any_date, plain_number};
use crate::domain::model::{FieldType, ImputeMethod, Table, Transform, TransformPlan};
use crate::utils::error::{PrepError, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Apply a plan's transforms, in order, to a table. Ordering matters: the
/// builder emits normalize-then-retype (and parse-then-retype) pairs whose
/// second half assumes the first already ran.
pub fn apply_plan(table: &Table, plan: &TransformPlan) -> Result<Table> {
    let mut out = table.clone();
    for transform in &plan.items {
        apply_transform(&mut out, transform)?;
    }
    Ok(out)
}

fn apply_transform(table: &mut Table, transform: &Transform) -> Result<()> {
    match transform {
        Transform::Trim { field } => {
            for_each_string(table, field, |s| s.trim().to_string());
        }
        Transform::NormalizeDecimal {
            field,
            decimal,
            thousands,
        } => {
            let (decimal, thousands) = (*decimal, *thousands);
            mutate_field(table, field, |value| {
                if let Value::String(s) = value {
                    let cleaned: String = s
                        .trim()
                        .chars()
                        .filter(|c| *c != thousands && *c != ' ')
                        .map(|c| if c == decimal { '.' } else { c })
                        .collect();
                    if cleaned.parse::<f64>().map(|n| n.is_finite()).unwrap_or(false) {
                        return Some(Value::String(cleaned));
                    }
                }
                None
            });
        }
        Transform::SetType { field, to } => {
            let to = *to;
            mutate_field(table, field, move |value| coerce(value, to));
        }
        Transform::ParseDate { field, pattern } => {
            let pattern = *pattern;
            mutate_field(table, field, move |value| {
                if let Value::String(s) = value {
                    if let Some(date) = parse_with_pattern(s, pattern) {
                        return Some(Value::String(date.format("%Y-%m-%d").to_string()));
                    }
                }
                // Values the pattern cannot read stay untouched.
                None
            });
        }
        Transform::RegexReplace {
            field,
            pattern,
            replacement,
        } => {
            let re = Regex::new(pattern).map_err(|e| PrepError::ProcessingError {
                message: format!("invalid replace pattern for field '{}': {}", field, e),
            })?;
            for_each_string(table, field, |s| re.replace_all(s, replacement.as_str()).into_owned());
        }
        Transform::DropDuplicates { subset } => {
            let key_fields: Vec<String> = match subset {
                Some(fields) => fields.clone(),
                None => table.fields.clone(),
            };
            let mut seen = HashSet::new();
            // First occurrence wins.
            table
                .records
                .retain(|record| seen.insert(canonical_row(record, &key_fields)));
        }
        Transform::Impute { field, method } => {
            impute_field(table, field, *method);
        }
        Transform::Clip { field, min, max } => {
            let (min, max) = (*min, *max);
            mutate_field(table, field, move |value| {
                let number = value.as_f64()?;
                let mut clipped = number;
                if let Some(low) = min {
                    clipped = clipped.max(low);
                }
                if let Some(high) = max {
                    clipped = clipped.min(high);
                }
                (clipped != number)
                    .then(|| serde_json::Number::from_f64(clipped).map(Value::Number))
                    .flatten()
            });
        }
    }
    Ok(())
}

/// Run a fallible rewrite over one field of every record. The closure
/// returns `Some(new_value)` to replace, `None` to leave the cell alone.
fn mutate_field<F>(table: &mut Table, field: &str, rewrite: F)
where
    F: Fn(&Value) -> Option<Value>,
{
    for record in &mut table.records {
        if let Some(value) = record.data.get(field) {
            if let Some(updated) = rewrite(value) {
                record.data.insert(field.to_string(), updated);
            }
        }
    }
}

fn for_each_string<F>(table: &mut Table, field: &str, rewrite: F)
where
    F: Fn(&str) -> String,
{
    mutate_field(table, field, |value| {
        if let Value::String(s) = value {
            let updated = rewrite(s);
            if updated != *s {
                return Some(Value::String(updated));
            }
        }
        None
    });
}

/// Type coercion semantics: convertible values convert, everything else
/// becomes null rather than keeping a value that lies about its type.
fn coerce(value: &Value, to: FieldType) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    match to {
        FieldType::Number => match value {
            Value::Number(_) => None,
            Value::String(s) => Some(
                plain_number(s)
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            ),
            Value::Bool(b) => Some(Value::from(if *b { 1.0 } else { 0.0 })),
            _ => Some(Value::Null),
        },
        FieldType::Integer => match value {
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    None
                } else {
                    Some(
                        n.as_f64()
                            .map(|f| Value::from(f.round() as i64))
                            .unwrap_or(Value::Null),
                    )
                }
            }
            Value::String(s) => Some(
                plain_number(s)
                    .map(|f| Value::from(f.round() as i64))
                    .unwrap_or(Value::Null),
            ),
            Value::Bool(b) => Some(Value::from(i64::from(*b))),
            _ => Some(Value::Null),
        },
        FieldType::Date => match value {
            Value::String(s) => match parse_any_date(s) {
                Some(date) => {
                    let iso = date.format("%Y-%m-%d").to_string();
                    (iso != *s).then_some(Value::String(iso))
                }
                None => Some(Value::Null),
            },
            _ => Some(Value::Null),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => None,
            Value::String(s) => Some(match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Value::Bool(true),
                "false" | "no" | "0" => Value::Bool(false),
                _ => Value::Null,
            }),
            Value::Number(n) => Some(match n.as_f64() {
                Some(f) if f == 1.0 => Value::Bool(true),
                Some(f) if f == 0.0 => Value::Bool(false),
                _ => Value::Null,
            }),
            _ => Some(Value::Null),
        },
        FieldType::String => match value {
            Value::String(_) => None,
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => Some(Value::Null),
        },
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

fn impute_field(table: &mut Table, field: &str, method: ImputeMethod) {
    let fill = match method {
        ImputeMethod::Mean | ImputeMethod::Median => {
            let mut numbers: Vec<f64> = table
                .records
                .iter()
                .filter_map(|r| r.get(field))
                .filter_map(|v| match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => plain_number(s),
                    _ => None,
                })
                .collect();
            if numbers.is_empty() {
                return;
            }
            numbers.sort_by(|a, b| a.total_cmp(b));
            let filled = match method {
                ImputeMethod::Mean => numbers.iter().sum::<f64>() / numbers.len() as f64,
                _ => {
                    if numbers.len() % 2 == 1 {
                        numbers[numbers.len() / 2]
                    } else {
                        (numbers[numbers.len() / 2 - 1] + numbers[numbers.len() / 2]) / 2.0
                    }
                }
            };
            match serde_json::Number::from_f64(filled) {
                Some(n) => Value::Number(n),
                None => return,
            }
        }
        ImputeMethod::Mode => {
            // Most frequent non-missing value; ties keep the one seen first.
            let mut counts: Vec<(&Value, usize)> = Vec::new();
            for record in &table.records {
                let value = match record.get(field) {
                    Some(v) if !is_missing(Some(v)) => v,
                    _ => continue,
                };
                match counts.iter_mut().find(|(v, _)| *v == value) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((value, 1)),
                }
            }
            let mut best: Option<(&Value, usize)> = None;
            for (value, count) in counts {
                if best.map(|(_, c)| count > c).unwrap_or(true) {
                    best = Some((value, count));
                }
            }
            match best {
                Some((value, _)) => value.clone(),
                None => return,
            }
        }
    };

    for record in &mut table.records {
        if is_missing(record.get(field)) {
            record.data.insert(field.to_string(), fill.clone());
        }
    }
}

/// Serialize a table back to CSV text. Values containing a comma, quote or
/// newline are double-quoted with inner quotes doubled; nulls become the
/// empty string.
pub fn to_csv(table: &Table) -> String {
    let mut lines = Vec::with_capacity(table.records.len() + 1);
    lines.push(
        table
            .fields
            .iter()
            .map(|f| escape_csv(f))
            .collect::<Vec<_>>()
            .join(","),
    );

    for record in &table.records {
        let line = table
            .fields
            .iter()
            .map(|field| match record.get(field) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => escape_csv(s),
                Some(other) => escape_csv(&other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    lines.join("\n")
}

fn escape_csv(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::delimited;
    use crate::core::plan::build_plan;
    use crate::domain::model::{DatePattern, PlanStats};

    fn plan_of(items: Vec<Transform>) -> TransformPlan {
        TransformPlan {
            items,
            preview: Vec::new(),
            stats: PlanStats::default(),
        }
    }

    #[test]
    fn test_trim_strips_whitespace() {
        let table = delimited::parse(b"name\n  John  \n", b',').unwrap();
        let plan = plan_of(vec![Transform::Trim {
            field: "name".into(),
        }]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(out.records[0].get("name"), Some(&Value::String("John".into())));
    }

    #[test]
    fn test_normalize_then_retype_yields_numbers() {
        let table = delimited::parse(b"amount\n1,234.56\nn/a\n", b',').unwrap();
        let plan = plan_of(vec![
            Transform::NormalizeDecimal {
                field: "amount".into(),
                decimal: '.',
                thousands: ',',
            },
            Transform::SetType {
                field: "amount".into(),
                to: FieldType::Number,
            },
        ]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(out.records[0].get("amount"), Some(&Value::from(1234.56)));
        // Values that never become numeric are nulled by the retype.
        assert_eq!(out.records[1].get("amount"), Some(&Value::Null));
    }

    #[test]
    fn test_european_decimal_normalization() {
        let table = delimited::parse(b"amount\n1.234,56\n", b',').unwrap();
        let plan = plan_of(vec![Transform::NormalizeDecimal {
            field: "amount".into(),
            decimal: ',',
            thousands: '.',
        }]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(
            out.records[0].get("amount"),
            Some(&Value::String("1234.56".into()))
        );
    }

    #[test]
    fn test_parse_date_pinned_and_auto() {
        let table = delimited::parse(b"a,b\n02/15/2023,15.02.2023\n", b',').unwrap();
        let plan = plan_of(vec![
            Transform::ParseDate {
                field: "a".into(),
                pattern: DatePattern::MonthDayYear,
            },
            Transform::ParseDate {
                field: "b".into(),
                pattern: DatePattern::Auto,
            },
        ]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(
            out.records[0].get("a"),
            Some(&Value::String("2023-02-15".into()))
        );
        assert_eq!(
            out.records[0].get("b"),
            Some(&Value::String("2023-02-15".into()))
        );
    }

    #[test]
    fn test_parse_date_leaves_unreadable_values() {
        let table = delimited::parse(b"a\nnot-a-date\n", b',').unwrap();
        let plan = plan_of(vec![Transform::ParseDate {
            field: "a".into(),
            pattern: DatePattern::Iso,
        }]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(
            out.records[0].get("a"),
            Some(&Value::String("not-a-date".into()))
        );
    }

    #[test]
    fn test_drop_duplicates_keeps_first() {
        let table = delimited::parse(b"a,b\n1,x\n2,y\n1,x\n", b',').unwrap();
        let plan = plan_of(vec![Transform::DropDuplicates { subset: None }]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.records[0].get("b"), Some(&Value::String("x".into())));
        assert_eq!(out.records[1].get("b"), Some(&Value::String("y".into())));
    }

    #[test]
    fn test_drop_duplicates_with_subset() {
        let table = delimited::parse(b"a,b\n1,x\n1,y\n2,z\n", b',').unwrap();
        let plan = plan_of(vec![Transform::DropDuplicates {
            subset: Some(vec!["a".into()]),
        }]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn test_impute_mean_and_mode() {
        let table = delimited::parse(b"n,s\n10,x\n,x\n30,\n", b',').unwrap();
        let plan = plan_of(vec![
            Transform::SetType {
                field: "n".into(),
                to: FieldType::Number,
            },
            Transform::Impute {
                field: "n".into(),
                method: ImputeMethod::Mean,
            },
            Transform::Impute {
                field: "s".into(),
                method: ImputeMethod::Mode,
            },
        ]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(out.records[1].get("n"), Some(&Value::from(20.0)));
        assert_eq!(out.records[2].get("s"), Some(&Value::String("x".into())));
    }

    #[test]
    fn test_clip_bounds_numbers() {
        let table = delimited::parse(b"v\n5\n50\n500\n", b',').unwrap();
        let plan = plan_of(vec![
            Transform::SetType {
                field: "v".into(),
                to: FieldType::Number,
            },
            Transform::Clip {
                field: "v".into(),
                min: Some(10.0),
                max: Some(100.0),
            },
        ]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(out.records[0].get("v"), Some(&Value::from(10.0)));
        assert_eq!(out.records[1].get("v"), Some(&Value::from(50.0)));
        assert_eq!(out.records[2].get("v"), Some(&Value::from(100.0)));
    }

    #[test]
    fn test_regex_replace() {
        let table = delimited::parse(b"s\nab12cd\n", b',').unwrap();
        let plan = plan_of(vec![Transform::RegexReplace {
            field: "s".into(),
            pattern: r"\d+".into(),
            replacement: "#".into(),
        }]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(out.records[0].get("s"), Some(&Value::String("ab#cd".into())));
    }

    #[test]
    fn test_invalid_regex_is_processing_error() {
        let table = delimited::parse(b"s\nx\n", b',').unwrap();
        let plan = plan_of(vec![Transform::RegexReplace {
            field: "s".into(),
            pattern: "(".into(),
            replacement: "".into(),
        }]);
        let err = apply_plan(&table, &plan).unwrap_err();
        assert!(matches!(err, PrepError::ProcessingError { .. }));
    }

    #[test]
    fn test_set_type_boolean_and_string() {
        let table = delimited::parse(b"flag,id\nYes,7\nno,8\n", b',').unwrap();
        let plan = plan_of(vec![Transform::SetType {
            field: "flag".into(),
            to: FieldType::Boolean,
        }]);
        let out = apply_plan(&table, &plan).unwrap();
        assert_eq!(out.records[0].get("flag"), Some(&Value::Bool(true)));
        assert_eq!(out.records[1].get("flag"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_to_csv_escaping_and_nulls() {
        let mut table = delimited::parse(b"a,b\nplain,\"x,y\"\n", b',').unwrap();
        table.records[0]
            .data
            .insert("a".to_string(), Value::Null);
        let csv = to_csv(&table);
        assert_eq!(csv, "a,b\n,\"x,y\"");
    }

    #[test]
    fn test_to_csv_quotes_are_doubled() {
        let table = delimited::parse(b"a\n\"say \"\"hi\"\"\"\n", b',').unwrap();
        assert_eq!(to_csv(&table), "a\n\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_built_plan_round_trip() {
        let table = delimited::parse(
            b"name,amount,day\n  Ada  ,\"1,234.56\",2023-01-01\nBea,2.5,2023-02-15\n  Ada  ,\"1,234.56\",2023-01-01\n",
            b',',
        )
        .unwrap();
        let plan = build_plan(&table);
        let out = apply_plan(&table, &plan).unwrap();

        // Duplicate row dropped, names trimmed, amounts numeric, dates ISO.
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.records[0].get("name"), Some(&Value::String("Ada".into())));
        assert_eq!(out.records[0].get("amount"), Some(&Value::from(1234.56)));
        assert_eq!(
            out.records[0].get("day"),
            Some(&Value::String("2023-01-01".into()))
        );
    }
}

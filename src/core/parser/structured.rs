use crate::domain::model::{Record, Table};
use crate::utils::error::{PrepError, Result};
use serde_json::Value;
use std::collections::HashMap;

/// JSON reader. A root array maps element-per-record; a root object is
/// searched for its first array-valued property; any other object becomes a
/// one-record table. Newline-delimited JSON is accepted as a fallback when
/// the document as a whole does not parse.
pub fn parse_json(bytes: &[u8]) -> Result<Table> {
    let text = super::decode_text(bytes);
    let trimmed = text.trim();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(root) => table_from_value("json", root),
        Err(err) => parse_json_lines(trimmed).ok_or_else(|| PrepError::parse("json", err))?,
    }
}

/// One JSON object per line (`.jsonl` / `.ndjson`). All-or-nothing: a single
/// bad line disqualifies the whole file.
fn parse_json_lines(text: &str) -> Option<Result<Table>> {
    let mut items = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        items.push(serde_json::from_str::<Value>(line).ok()?);
    }
    if items.is_empty() {
        return None;
    }
    Some(table_from_items("json", items))
}

pub fn parse_yaml(bytes: &[u8]) -> Result<Table> {
    let text = super::decode_text(bytes);
    let root: Value = serde_yaml::from_str(&text).map_err(|e| PrepError::parse("yaml", e))?;
    table_from_value("yaml", root)
}

pub fn parse_toml(bytes: &[u8]) -> Result<Table> {
    let text = super::decode_text(bytes);
    let root: toml::Value = text.parse().map_err(|e| PrepError::parse("toml", e))?;
    table_from_value("toml", toml_to_json(root))
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Array-discovery heuristic shared by JSON, YAML and TOML.
pub(crate) fn table_from_value(format: &str, root: Value) -> Result<Table> {
    match root {
        Value::Array(items) => table_from_items(format, items),
        Value::Object(mut map) => {
            let array_key = map
                .iter()
                .find_map(|(k, v)| v.is_array().then(|| k.clone()));
            if let Some(key) = array_key {
                if let Some(Value::Array(items)) = map.remove(&key) {
                    return table_from_items(format, items);
                }
            }
            // No array anywhere: the object itself is the single record.
            table_from_items(format, vec![Value::Object(map)])
        }
        _ => Err(PrepError::empty(format)),
    }
}

fn table_from_items(format: &str, items: Vec<Value>) -> Result<Table> {
    if items.is_empty() {
        return Err(PrepError::empty(format));
    }

    let mut fields: Vec<String> = Vec::new();
    let mut records = Vec::new();

    for item in items {
        let mut data = HashMap::new();
        match item {
            Value::Object(map) => {
                for (key, value) in map {
                    if !fields.contains(&key) {
                        fields.push(key.clone());
                    }
                    data.insert(key, scalarize(value));
                }
            }
            other => {
                if !fields.iter().any(|f| f == "value") {
                    fields.push("value".to_string());
                }
                data.insert("value".to_string(), scalarize(other));
            }
        }
        records.push(Record { data });
    }

    Ok(Table::new(fields, records))
}

/// Nested structures are kept as their JSON text so every cell stays scalar.
fn scalarize(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_array_of_objects() {
        let table = parse_json(br#"[{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]"#).unwrap();
        assert_eq!(table.fields, vec!["a", "b"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.records[1].get("a"), Some(&Value::from(2)));
    }

    #[test]
    fn test_root_object_with_array_property() {
        let table =
            parse_json(br#"{"meta": "x", "rows": [{"id": 1}, {"id": 2}], "other": [1]}"#).unwrap();
        assert_eq!(table.fields, vec!["id"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_root_object_without_array_wraps_single_record() {
        let table = parse_json(br#"{"id": 1, "name": "solo"}"#).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.fields, vec!["id", "name"]);
    }

    #[test]
    fn test_scalar_array_uses_value_field() {
        let table = parse_json(b"[1, 2, 3]").unwrap();
        assert_eq!(table.fields, vec!["value"]);
        assert_eq!(table.records[0].get("value"), Some(&Value::from(1)));
    }

    #[test]
    fn test_json_lines_fallback() {
        let table = parse_json(b"{\"a\": 1}\n{\"a\": 2}\n{\"a\": 3}").unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.fields, vec!["a"]);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_json(b"{not json").unwrap_err();
        assert!(matches!(err, PrepError::Parse { ref format, .. } if format == "json"));
    }

    #[test]
    fn test_empty_array_is_empty_result() {
        let err = parse_json(b"[]").unwrap_err();
        assert!(matches!(err, PrepError::EmptyResult { .. }));
    }

    #[test]
    fn test_nested_values_are_stringified() {
        let table = parse_json(br#"[{"a": {"x": 1}}]"#).unwrap();
        assert_eq!(
            table.records[0].get("a"),
            Some(&Value::String("{\"x\":1}".into()))
        );
    }

    #[test]
    fn test_yaml_list() {
        let table = parse_yaml(b"- a: 1\n  b: two\n- a: 2\n  b: three\n").unwrap();
        assert_eq!(table.fields, vec!["a", "b"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.records[0].get("b"), Some(&Value::String("two".into())));
    }

    #[test]
    fn test_yaml_document_with_nested_list() {
        let table = parse_yaml(b"title: test\nitems:\n  - id: 1\n  - id: 2\n").unwrap();
        assert_eq!(table.fields, vec!["id"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_toml_array_of_tables() {
        let text = b"[[servers]]\nname = \"alpha\"\nport = 8001\n\n[[servers]]\nname = \"beta\"\nport = 8002\n";
        let table = parse_toml(text).unwrap();
        assert_eq!(table.fields, vec!["name", "port"]);
        assert_eq!(table.records[1].get("port"), Some(&Value::from(8002)));
    }

    #[test]
    fn test_toml_flat_document_wraps_single_record() {
        let table = parse_toml(b"name = \"solo\"\ncount = 3\n").unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.records[0].get("count"), Some(&Value::from(3)));
    }
}

use crate::domain::model::{Record, Table};
use crate::utils::error::{PrepError, Result};
use serde_json::Value;
use std::collections::HashMap;

/// CSV/TSV reader. Header row becomes the field list; the first malformed
/// row aborts the whole file (no partial results).
pub fn parse(bytes: &[u8], delimiter: u8) -> Result<Table> {
    let format = if delimiter == b'\t' { "tsv" } else { "csv" };
    let text = super::decode_text(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let fields: Vec<String> = reader
        .headers()
        .map_err(|e| PrepError::parse(format, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if fields.iter().all(|f| f.is_empty()) {
        return Err(PrepError::empty(format));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| PrepError::parse(format, e))?;
        let mut data = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            let value = row
                .get(i)
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null);
            data.insert(field.clone(), value);
        }
        records.push(Record { data });
    }

    if records.is_empty() {
        return Err(PrepError::empty(format));
    }

    Ok(Table::new(fields, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_round_trip() {
        let table = parse(b"a,b\n1,2\n3,4", b',').unwrap();
        assert_eq!(table.fields, vec!["a", "b"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.records[0].get("a"), Some(&Value::String("1".into())));
        assert_eq!(table.records[0].get("b"), Some(&Value::String("2".into())));
        assert_eq!(table.records[1].get("a"), Some(&Value::String("3".into())));
        assert_eq!(table.records[1].get("b"), Some(&Value::String("4".into())));
    }

    #[test]
    fn test_tsv_delimiter() {
        let table = parse(b"name\tcity\nAda\tLondon", b'\t').unwrap();
        assert_eq!(table.fields, vec!["name", "city"]);
        assert_eq!(
            table.records[0].get("city"),
            Some(&Value::String("London".into()))
        );
    }

    #[test]
    fn test_quoted_values_keep_commas() {
        let table = parse(b"a,b\n\"x,y\",2", b',').unwrap();
        assert_eq!(table.records[0].get("a"), Some(&Value::String("x,y".into())));
    }

    #[test]
    fn test_ragged_row_aborts_file() {
        let err = parse(b"a,b\n1,2\n3,4,5", b',').unwrap_err();
        assert!(matches!(err, PrepError::Parse { ref format, .. } if format == "csv"));
    }

    #[test]
    fn test_header_only_is_empty_result() {
        let err = parse(b"a,b\n", b',').unwrap_err();
        assert!(matches!(err, PrepError::EmptyResult { .. }));
    }

    #[test]
    fn test_empty_input_is_empty_result() {
        let err = parse(b"", b',').unwrap_err();
        assert!(matches!(err, PrepError::EmptyResult { .. }));
    }
}

use crate::domain::model::{Record, Table};
use crate::utils::error::{PrepError, Result};
use calamine::{Data, DataType, Reader, Xlsx};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;

/// XLSX reader: first sheet only, first row as headers.
pub fn parse(bytes: &[u8]) -> Result<Table> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook: Xlsx<_> = Xlsx::new(cursor).map_err(|e| PrepError::parse("excel", e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PrepError::parse("excel", anyhow::anyhow!("workbook contains no sheets")))?
        .map_err(|e| PrepError::parse("excel", e))?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| PrepError::empty("excel"))?;

    let fields: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let label = cell.as_string().unwrap_or_default();
            if label.trim().is_empty() {
                format!("column_{}", i + 1)
            } else {
                label
            }
        })
        .collect();

    let mut records = Vec::new();
    for row in rows {
        let mut data = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            let value = row.get(i).map(cell_value).unwrap_or(Value::Null);
            data.insert(field.clone(), value);
        }
        records.push(Record { data });
    }

    if records.is_empty() {
        return Err(PrepError::empty("excel"));
    }

    Ok(Table::new(fields, records))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        // Dates, durations and error cells keep their display form.
        other => Value::String(format!("{}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_with_parse_error() {
        let err = parse(b"definitely not a zip container").unwrap_err();
        assert!(matches!(err, PrepError::Parse { ref format, .. } if format == "excel"));
    }

    #[test]
    fn test_cell_value_mapping() {
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Int(7)), Value::from(7));
        assert_eq!(cell_value(&Data::Bool(true)), Value::Bool(true));
        assert_eq!(
            cell_value(&Data::String("x".into())),
            Value::String("x".into())
        );
        assert_eq!(cell_value(&Data::Float(1.5)), Value::from(1.5));
    }
}

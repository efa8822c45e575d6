use crate::domain::model::{Record, Table};
use crate::utils::error::{PrepError, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

// ISO datetimes, Apache common-log stamps, syslog stamps and slashed dates.
const TIMESTAMP_PATTERN: &str = r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2})?|\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2}(?: [+-]\d{4})?|\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}|\d{4}/\d{2}/\d{2}\s+\d{2}:\d{2}:\d{2}";

const LEVEL_PATTERN: &str = r"(?i)\b(ERROR|WARN(?:ING)?|INFO|DEBUG|TRACE)\b";

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern compiles"))
}

fn level_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LEVEL_PATTERN).expect("level pattern compiles"))
}

/// Plain-text log reader: one record per non-blank line, with best-effort
/// timestamp and level extraction. What remains after stripping both becomes
/// the message.
pub fn parse(bytes: &[u8]) -> Result<Table> {
    let text = super::decode_text(bytes);

    let fields: Vec<String> = ["line", "timestamp", "level", "message", "raw"]
        .iter()
        .map(|f| f.to_string())
        .collect();

    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let timestamp = timestamp_re().find(line).map(|m| m.as_str().to_string());
        let level = level_re()
            .find(line)
            .map(|m| m.as_str().to_uppercase());

        let mut message = line.to_string();
        if let Some(ts) = &timestamp {
            message = message.replacen(ts.as_str(), "", 1);
        }
        if let Some(range) = level_re().find(&message).map(|m| m.range()) {
            message.replace_range(range, "");
        }
        let message = message
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | '[' | ']' | '|'))
            .to_string();

        let mut data = HashMap::new();
        data.insert("line".to_string(), Value::from(index + 1));
        data.insert(
            "timestamp".to_string(),
            timestamp.map(Value::String).unwrap_or(Value::Null),
        );
        data.insert(
            "level".to_string(),
            level.map(Value::String).unwrap_or(Value::Null),
        );
        data.insert("message".to_string(), Value::String(message));
        data.insert("raw".to_string(), Value::String(line.to_string()));
        records.push(Record { data });
    }

    if records.is_empty() {
        return Err(PrepError::empty("log"));
    }

    Ok(Table::new(fields, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_and_level() {
        let table = parse(b"2023-04-01 12:30:45 ERROR connection refused\n").unwrap();
        let record = &table.records[0];
        assert_eq!(record.get("line"), Some(&Value::from(1)));
        assert_eq!(
            record.get("timestamp"),
            Some(&Value::String("2023-04-01 12:30:45".into()))
        );
        assert_eq!(record.get("level"), Some(&Value::String("ERROR".into())));
        assert_eq!(
            record.get("message"),
            Some(&Value::String("connection refused".into()))
        );
    }

    #[test]
    fn test_bracketed_level_lowercase() {
        let table = parse(b"[warn] disk almost full\n").unwrap();
        let record = &table.records[0];
        assert_eq!(record.get("level"), Some(&Value::String("WARN".into())));
        assert_eq!(
            record.get("message"),
            Some(&Value::String("disk almost full".into()))
        );
    }

    #[test]
    fn test_line_without_metadata() {
        let table = parse(b"just some text\n").unwrap();
        let record = &table.records[0];
        assert_eq!(record.get("timestamp"), Some(&Value::Null));
        assert_eq!(record.get("level"), Some(&Value::Null));
        assert_eq!(record.get("raw"), Some(&Value::String("just some text".into())));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let table = parse(b"first\n\n\nsecond\n").unwrap();
        assert_eq!(table.row_count(), 2);
        // Line numbers refer to the source file, not the record index.
        assert_eq!(table.records[1].get("line"), Some(&Value::from(4)));
    }

    #[test]
    fn test_empty_file_is_empty_result() {
        let err = parse(b"").unwrap_err();
        assert!(matches!(err, PrepError::EmptyResult { .. }));
    }
}

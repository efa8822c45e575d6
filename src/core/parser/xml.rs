use crate::domain::model::{Record, Table};
use crate::utils::error::{PrepError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use std::collections::HashMap;

/// Structural inference for arbitrary XML: the most frequent non-root tag is
/// taken as the row element, and each instance becomes one record built from
/// its child elements (tag name -> text content).
pub fn parse(bytes: &[u8]) -> Result<Table> {
    let text = super::decode_text(bytes);
    let (root, row_tag) = infer_row_tag(&text)?;
    tracing::debug!("XML row element inferred as <{}> under <{}>", row_tag, root);
    collect_rows(&text, &row_tag)
}

/// First pass: count start tags over the whole document. Ties keep the tag
/// seen first.
fn infer_row_tag(text: &str) -> Result<(String, String)> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut root: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if root.is_none() {
                    root = Some(name.clone());
                }
                match counts.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((name, 1)),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(PrepError::parse("xml", e)),
            Ok(_) => {}
        }
    }

    let root = root.ok_or_else(|| PrepError::empty("xml"))?;

    let mut row_tag: Option<&str> = None;
    let mut best = 0;
    for (name, count) in &counts {
        if *name != root && *count > best {
            best = *count;
            row_tag = Some(name);
        }
    }

    let row_tag = row_tag.ok_or_else(|| PrepError::empty("xml"))?.to_string();
    Ok((root, row_tag))
}

/// Second pass: one record per row-element instance. Text nested deeper than
/// one level is folded into the nearest direct child.
fn collect_rows(text: &str, row_tag: &str) -> Result<Table> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut fields: Vec<String> = Vec::new();
    let mut records: Vec<Record> = Vec::new();
    let mut current: Option<HashMap<String, Value>> = None;
    let mut child: Option<String> = None;
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if current.is_none() {
                    if name == row_tag {
                        current = Some(HashMap::new());
                    }
                } else if child.is_none() {
                    child = Some(name);
                    text_buf.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(record) = current.as_mut() {
                    if child.is_none() {
                        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        if !fields.contains(&name) {
                            fields.push(name.clone());
                        }
                        record.insert(name, Value::Null);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if current.is_some() && child.is_some() {
                    let chunk = t.unescape().map_err(|e| PrepError::parse("xml", e))?;
                    text_buf.push_str(&chunk);
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if child.as_deref() == Some(name.as_str()) {
                    if let Some(record) = current.as_mut() {
                        if !fields.contains(&name) {
                            fields.push(name.clone());
                        }
                        record.insert(name, Value::String(text_buf.trim().to_string()));
                    }
                    child = None;
                } else if child.is_none() && name == row_tag {
                    if let Some(record) = current.take() {
                        if !record.is_empty() {
                            records.push(Record { data: record });
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(PrepError::parse("xml", e)),
            Ok(_) => {}
        }
    }

    if records.is_empty() {
        return Err(PrepError::empty("xml"));
    }

    Ok(Table::new(fields, records))
}

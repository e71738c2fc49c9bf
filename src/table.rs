// src/table.rs

use csv::ReaderBuilder;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{io::Cursor, sync::Arc};

use crate::error::{ImporterError, Result};

/// One row of a table: named string fields in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite `name` in place, or append it as the last field.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            let name: String = k.into();
            record.set(&name, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A table as handed back to callers. Cloning is cheap: content is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Table {
    /// Whole file content, when parsing is disabled.
    Raw(Arc<str>),
    Rows(Arc<Vec<Record>>),
}

impl Table {
    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            Table::Rows(rows) => Some(rows.as_slice()),
            Table::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Table::Raw(text) => Some(text.as_ref()),
            Table::Rows(_) => None,
        }
    }

    /// True when both handles share the same underlying content.
    pub fn ptr_eq(&self, other: &Table) -> bool {
        match (self, other) {
            (Table::Raw(a), Table::Raw(b)) => Arc::ptr_eq(a, b),
            (Table::Rows(a), Table::Rows(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Header row plus every data row of a delimited table.
#[derive(Debug)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl ParsedTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Entry content as text. `table` names it in the error.
pub fn decode(table: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| ImporterError::Encoding(table.to_string()))
}

/// Parse comma-separated text whose first record holds the field names.
///
/// Short rows keep only the fields they have; extra trailing values are dropped.
/// Any malformed record fails the whole table.
pub fn parse_records(table: &str, text: &str) -> Result<ParsedTable> {
    let parse_err = |source: csv::Error| ImporterError::Parse {
        table: table.to_string(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()));

    let headers: Vec<String> = rdr
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(parse_err)?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.as_str(), v))
                .collect(),
        );
    }

    Ok(ParsedTable { headers, records })
}

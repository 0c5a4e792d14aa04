use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;

use crate::error::ValidationError;

pub const MAX_REPORTED_ERRORS: usize = 5;

/// A single uploaded row, keyed by header name in column order.
pub type Row = IndexMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn parse_csv(bytes: &[u8]) -> Result<Table, ValidationError> {
    parse_tabular(bytes, b',')
}

pub fn parse_tabular<R: Read>(reader: R, delimiter: u8) -> Result<Table, ValidationError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .from_reader(reader);
    let headers = match reader.headers() {
        Ok(record) => record.iter().map(|cell| cell.to_string()).collect::<Vec<_>>(),
        Err(err) => {
            return Err(ValidationError::MalformedCsv {
                total: 1,
                examples: vec![format!("invalid header row: {err}")],
            })
        }
    };
    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut total_errors = 0usize;
    for record in reader.records() {
        match record {
            Ok(record) => {
                if is_blank(&record) {
                    continue;
                }
                rows.push(to_row(&headers, &record));
            }
            Err(err) => {
                total_errors += 1;
                if errors.len() < MAX_REPORTED_ERRORS {
                    errors.push(err.to_string());
                }
            }
        }
    }
    if total_errors > 0 {
        return Err(ValidationError::MalformedCsv {
            total: total_errors,
            examples: errors,
        });
    }
    Ok(Table { headers, rows })
}

fn to_row(headers: &[String], record: &StringRecord) -> Row {
    headers
        .iter()
        .zip(record.iter())
        .map(|(header, cell)| (header.clone(), cell.to_string()))
        .collect()
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.is_empty())
}

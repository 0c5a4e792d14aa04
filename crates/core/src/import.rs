use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, ValidationError};
use crate::model::{NewParameterValue, NewResult, NewSubParameter, NewVariableSet};
use crate::tabular::{parse_csv, Row, Table};

pub const RESULTS_BATCH_SIZE: usize = 500;

pub const RESULT_COLUMNS: [&str; 6] = [
    "combinationKey",
    "year",
    "sccValue",
    "temperature",
    "damageCost",
    "gdpLoss",
];

pub const VARIABLE_COLUMNS: [&str; 8] = [
    "setName",
    "setDescription",
    "setOrder",
    "paramName",
    "paramOrder",
    "valueLabel",
    "value",
    "valueOrder",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Results,
    Variables,
}

impl ImportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportKind::Results => "results",
            ImportKind::Variables => "variables",
        }
    }

    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            ImportKind::Results => &RESULT_COLUMNS,
            ImportKind::Variables => &VARIABLE_COLUMNS,
        }
    }
}

impl FromStr for ImportKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim() {
            "results" => Ok(ImportKind::Results),
            "variables" => Ok(ImportKind::Variables),
            other => Err(ValidationError::UnsupportedKind(other.to_string())),
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write operations available to the import engine inside one transaction.
pub trait ImportTx {
    fn clear_results(&mut self) -> Result<usize>;
    fn insert_results(&mut self, batch: &[NewResult]) -> Result<usize>;
    /// Removes values, then sub-parameters, then sets. Returns the number of
    /// value rows removed.
    fn clear_catalog(&mut self) -> Result<usize>;
    fn insert_variable_set(&mut self, set: &NewVariableSet) -> Result<i64>;
    fn insert_sub_parameter(&mut self, parameter: &NewSubParameter) -> Result<i64>;
    fn insert_parameter_value(&mut self, value: &NewParameterValue) -> Result<i64>;
}

/// Runs `f` inside a transaction: commit on `Ok`, roll back on `Err`.
pub trait TransactionalStore {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn ImportTx) -> Result<T>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub set_name: String,
    pub set_description: Option<String>,
    pub set_order: i32,
    pub param_name: String,
    pub param_order: i32,
    pub value_label: String,
    pub value: f64,
    pub value_order: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCounts {
    pub sets: usize,
    pub parameters: usize,
    pub values: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub kind: ImportKind,
    pub count: usize,
    pub replaced: usize,
    pub catalog: Option<CatalogCounts>,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        match self.kind {
            ImportKind::Results => format!("imported {} visualization results", self.count),
            ImportKind::Variables => format!("imported {} variable definitions", self.count),
        }
    }
}

pub fn import_csv<S: TransactionalStore>(
    store: &S,
    kind: ImportKind,
    bytes: &[u8],
) -> Result<ImportSummary> {
    let table = parse_csv(bytes)?;
    import_table(store, kind, &table)
}

pub fn import_table<S: TransactionalStore>(
    store: &S,
    kind: ImportKind,
    table: &Table,
) -> Result<ImportSummary> {
    check_columns(kind, &table.rows)?;
    match kind {
        ImportKind::Results => {
            let rows = parse_result_rows(&table.rows)?;
            let (replaced, count) = store.transaction(|tx| replace_results(tx, &rows))?;
            info!(kind = %kind, count, replaced, "dataset replaced");
            Ok(ImportSummary {
                kind,
                count,
                replaced,
                catalog: None,
            })
        }
        ImportKind::Variables => {
            let rows = parse_variable_rows(&table.rows)?;
            let (replaced, counts) = store.transaction(|tx| replace_catalog(tx, &rows))?;
            info!(
                kind = %kind,
                count = counts.values,
                replaced,
                sets = counts.sets,
                parameters = counts.parameters,
                "dataset replaced"
            );
            Ok(ImportSummary {
                kind,
                count: counts.values,
                replaced,
                catalog: Some(counts),
            })
        }
    }
}

pub fn check_columns(kind: ImportKind, rows: &[Row]) -> std::result::Result<(), ValidationError> {
    let first = rows.first().ok_or(ValidationError::EmptyInput)?;
    let missing: Vec<String> = kind
        .required_columns()
        .iter()
        .filter(|col| !first.contains_key(**col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingColumns(missing))
    }
}

pub fn parse_result_rows(rows: &[Row]) -> std::result::Result<Vec<NewResult>, ValidationError> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let line = idx + 1;
            Ok(NewResult {
                combination_key: field(row, "combinationKey").to_string(),
                year: parse_int(line, "year", field(row, "year"))?,
                scc_value: parse_optional_float(line, "sccValue", field(row, "sccValue"))?,
                temperature: parse_optional_float(line, "temperature", field(row, "temperature"))?,
                damage_cost: parse_optional_float(line, "damageCost", field(row, "damageCost"))?,
                gdp_loss: parse_optional_float(line, "gdpLoss", field(row, "gdpLoss"))?,
            })
        })
        .collect()
}

pub fn parse_variable_rows(
    rows: &[Row],
) -> std::result::Result<Vec<VariableRecord>, ValidationError> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let line = idx + 1;
            let description = field(row, "setDescription");
            Ok(VariableRecord {
                set_name: field(row, "setName").to_string(),
                set_description: if description.is_empty() {
                    None
                } else {
                    Some(description.to_string())
                },
                set_order: parse_order(line, "setOrder", field(row, "setOrder"))?,
                param_name: field(row, "paramName").to_string(),
                param_order: parse_order(line, "paramOrder", field(row, "paramOrder"))?,
                value_label: field(row, "valueLabel").to_string(),
                value: parse_float(line, "value", field(row, "value"))?,
                value_order: parse_order(line, "valueOrder", field(row, "valueOrder"))?,
            })
        })
        .collect()
}

pub fn replace_results(tx: &mut dyn ImportTx, rows: &[NewResult]) -> Result<(usize, usize)> {
    let replaced = tx.clear_results()?;
    let mut inserted = 0;
    for (batch_idx, batch) in rows.chunks(RESULTS_BATCH_SIZE).enumerate() {
        inserted += tx.insert_results(batch)?;
        debug!(batch = batch_idx + 1, rows = batch.len(), "result batch inserted");
    }
    Ok((replaced, inserted))
}

/// Single ordered pass: sets and sub-parameters are identified by the first
/// row that names them; later rows never update their description or order.
pub fn replace_catalog(
    tx: &mut dyn ImportTx,
    rows: &[VariableRecord],
) -> Result<(usize, CatalogCounts)> {
    let replaced = tx.clear_catalog()?;
    let mut set_ids: HashMap<&str, i64> = HashMap::new();
    let mut param_ids: HashMap<(&str, &str), i64> = HashMap::new();
    let mut counts = CatalogCounts::default();
    for row in rows {
        let set_id = match set_ids.get(row.set_name.as_str()) {
            Some(id) => *id,
            None => {
                let id = tx.insert_variable_set(&NewVariableSet {
                    name: row.set_name.clone(),
                    description: row.set_description.clone(),
                    order: row.set_order,
                })?;
                set_ids.insert(row.set_name.as_str(), id);
                counts.sets += 1;
                id
            }
        };
        let param_key = (row.set_name.as_str(), row.param_name.as_str());
        let param_id = match param_ids.get(&param_key) {
            Some(id) => *id,
            None => {
                let id = tx.insert_sub_parameter(&NewSubParameter {
                    set_id,
                    name: row.param_name.clone(),
                    order: row.param_order,
                })?;
                param_ids.insert(param_key, id);
                counts.parameters += 1;
                id
            }
        };
        tx.insert_parameter_value(&NewParameterValue {
            sub_parameter_id: param_id,
            label: row.value_label.clone(),
            value: row.value,
            order: row.value_order,
        })?;
        counts.values += 1;
    }
    Ok((replaced, counts))
}

fn field<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

fn invalid(row: usize, column: &'static str, raw: &str) -> ValidationError {
    ValidationError::InvalidNumber {
        row,
        column,
        value: raw.to_string(),
    }
}

fn parse_int(row: usize, column: &'static str, raw: &str) -> std::result::Result<i32, ValidationError> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i32>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value.fract() == 0.0
                && value >= i32::MIN as f64
                && value <= i32::MAX as f64 =>
        {
            Ok(value as i32)
        }
        _ => Err(invalid(row, column, raw)),
    }
}

fn parse_order(row: usize, column: &'static str, raw: &str) -> std::result::Result<i32, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(0);
    }
    parse_int(row, column, raw)
}

fn parse_float(row: usize, column: &'static str, raw: &str) -> std::result::Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid(row, column, raw)),
    }
}

fn parse_optional_float(
    row: usize,
    column: &'static str,
    raw: &str,
) -> std::result::Result<Option<f64>, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_float(row, column, raw).map(Some)
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, Row as SqlRow, ToSql};
use tracing::debug;

use crate::error::Result;
use crate::import::{ImportTx, TransactionalStore};
use crate::model::{
    CatalogParameter, CatalogSet, DataCounts, NewParameterValue, NewResult, NewSubParameter,
    NewVariableSet, ParameterValue, SubParameter, VariableSet, VisualizationResult,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS variable_sets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        "order" INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS sub_parameters (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        set_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        "order" INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(set_id) REFERENCES variable_sets(id)
    );
    CREATE TABLE IF NOT EXISTS parameter_values (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sub_parameter_id INTEGER NOT NULL,
        label TEXT NOT NULL,
        value REAL NOT NULL,
        description TEXT,
        "order" INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(sub_parameter_id) REFERENCES sub_parameters(id)
    );
    CREATE TABLE IF NOT EXISTS visualization_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        combination_key TEXT NOT NULL,
        year INTEGER NOT NULL,
        scc_value REAL,
        temperature REAL,
        damage_cost REAL,
        gdp_loss REAL,
        metadata TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS chart_settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chart_key TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        x_label TEXT,
        y_label TEXT,
        unit TEXT,
        description TEXT,
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS pages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        content TEXT,
        published INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS admin_users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS admin_sessions (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        expires_at INTEGER NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(user_id) REFERENCES admin_users(id)
    );
    CREATE INDEX IF NOT EXISTS idx_sub_parameters_set ON sub_parameters(set_id);
    CREATE INDEX IF NOT EXISTS idx_parameter_values_param ON parameter_values(sub_parameter_id);
    CREATE INDEX IF NOT EXISTS idx_results_key_year ON visualization_results(combination_key, year);
    CREATE INDEX IF NOT EXISTS idx_sessions_user ON admin_sessions(user_id);
"#;

const RESULT_INSERT_COLUMNS: usize = 6;

#[derive(Clone, Debug)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    pub fn init(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn catalog(&self) -> Result<Vec<CatalogSet>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, name, description, "order" FROM variable_sets ORDER BY "order", id"#,
        )?;
        let sets = stmt
            .query_map([], |row| {
                Ok(VariableSet {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    order: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, set_id, name, description, "order" FROM sub_parameters ORDER BY "order", id"#,
        )?;
        let parameters = stmt
            .query_map([], |row| {
                Ok(SubParameter {
                    id: row.get(0)?,
                    set_id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    order: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, sub_parameter_id, label, value, description, "order"
               FROM parameter_values ORDER BY "order", id"#,
        )?;
        let mut values_by_param: HashMap<i64, Vec<ParameterValue>> = HashMap::new();
        let values = stmt.query_map([], |row| {
            Ok(ParameterValue {
                id: row.get(0)?,
                sub_parameter_id: row.get(1)?,
                label: row.get(2)?,
                value: row.get(3)?,
                description: row.get(4)?,
                order: row.get(5)?,
            })
        })?;
        for value in values {
            let value = value?;
            values_by_param
                .entry(value.sub_parameter_id)
                .or_default()
                .push(value);
        }

        let mut params_by_set: HashMap<i64, Vec<CatalogParameter>> = HashMap::new();
        for parameter in parameters {
            let values = values_by_param.remove(&parameter.id).unwrap_or_default();
            params_by_set
                .entry(parameter.set_id)
                .or_default()
                .push(CatalogParameter { parameter, values });
        }

        Ok(sets
            .into_iter()
            .map(|set| {
                let sub_parameters = params_by_set.remove(&set.id).unwrap_or_default();
                CatalogSet {
                    set,
                    sub_parameters,
                }
            })
            .collect())
    }

    pub fn results_for(&self, combination_key: &str) -> Result<Vec<VisualizationResult>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, combination_key, year, scc_value, temperature, damage_cost, gdp_loss,
                   metadata, created_at
            FROM visualization_results
            WHERE combination_key = ?1
            ORDER BY year ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([combination_key], result_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(combination = combination_key, rows = rows.len(), "results loaded");
        Ok(rows)
    }

    pub fn data_counts(&self) -> Result<DataCounts> {
        let conn = self.connection()?;
        let count = |table: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        };
        Ok(DataCounts {
            results: count("visualization_results")?,
            variables: count("variable_sets")?,
            parameters: count("sub_parameters")?,
            values: count("parameter_values")?,
        })
    }
}

impl TransactionalStore for Store {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn ImportTx) -> Result<T>,
    {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let out = {
            let mut sink = SqliteImportTx { conn: &tx };
            f(&mut sink)?
        };
        tx.commit()?;
        Ok(out)
    }
}

struct SqliteImportTx<'a> {
    conn: &'a Connection,
}

impl ImportTx for SqliteImportTx<'_> {
    fn clear_results(&mut self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM visualization_results", [])?)
    }

    fn insert_results(&mut self, batch: &[NewResult]) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["(?, ?, ?, ?, ?, ?)"; batch.len()].join(", ");
        let sql = format!(
            "INSERT INTO visualization_results \
             (combination_key, year, scc_value, temperature, damage_cost, gdp_loss) \
             VALUES {placeholders}"
        );
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(batch.len() * RESULT_INSERT_COLUMNS);
        for row in batch {
            values.push(&row.combination_key);
            values.push(&row.year);
            values.push(&row.scc_value);
            values.push(&row.temperature);
            values.push(&row.damage_cost);
            values.push(&row.gdp_loss);
        }
        Ok(self.conn.execute(&sql, params_from_iter(values))?)
    }

    fn clear_catalog(&mut self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM parameter_values", [])?;
        self.conn.execute("DELETE FROM sub_parameters", [])?;
        self.conn.execute("DELETE FROM variable_sets", [])?;
        Ok(removed)
    }

    fn insert_variable_set(&mut self, set: &NewVariableSet) -> Result<i64> {
        self.conn.execute(
            r#"INSERT INTO variable_sets (name, description, "order") VALUES (?1, ?2, ?3)"#,
            params![set.name, set.description, set.order],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_sub_parameter(&mut self, parameter: &NewSubParameter) -> Result<i64> {
        self.conn.execute(
            r#"INSERT INTO sub_parameters (set_id, name, "order") VALUES (?1, ?2, ?3)"#,
            params![parameter.set_id, parameter.name, parameter.order],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_parameter_value(&mut self, value: &NewParameterValue) -> Result<i64> {
        self.conn.execute(
            r#"INSERT INTO parameter_values (sub_parameter_id, label, value, "order")
               VALUES (?1, ?2, ?3, ?4)"#,
            params![value.sub_parameter_id, value.label, value.value, value.order],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

fn result_from_row(row: &SqlRow<'_>) -> rusqlite::Result<VisualizationResult> {
    Ok(VisualizationResult {
        id: row.get(0)?,
        combination_key: row.get(1)?,
        year: row.get(2)?,
        scc_value: row.get(3)?,
        temperature: row.get(4)?,
        damage_cost: row.get(5)?,
        gdp_loss: row.get(6)?,
        metadata: row.get(7)?,
        created_at: row.get(8)?,
    })
}

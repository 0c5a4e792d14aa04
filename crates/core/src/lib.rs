mod auth;
mod content;
mod error;
mod import;
mod model;
mod resolver;
mod seed;
mod store;
mod tabular;
mod templates;

pub use auth::{hash_password, new_session_token, verify_password, Session, HASH_ITERATIONS};
pub use error::{CoreError, Result, ValidationError};
pub use import::{
    check_columns, import_csv, import_table, parse_result_rows, parse_variable_rows,
    replace_catalog, replace_results, CatalogCounts, ImportKind, ImportSummary, ImportTx,
    TransactionalStore, VariableRecord, RESULTS_BATCH_SIZE, RESULT_COLUMNS, VARIABLE_COLUMNS,
};
pub use model::{
    AdminUser, CatalogParameter, CatalogSet, ChartSetting, ChartSettingUpdate, DataCounts,
    NewChartSetting, NewParameterValue, NewResult, NewSubParameter, NewVariableSet, Page,
    PageUpdate, ParameterValue, SubParameter, VariableSet, VisualizationResult,
};
pub use resolver::{
    default_selections, merge_selections, resolve_combination_key, Selections,
    COMBINATION_KEYS, DEFAULT_COMBINATION,
};
pub use seed::{demo_catalog, demo_results, seed_demo, SeedSummary, FIRST_YEAR, LAST_YEAR};
pub use store::Store;
pub use tabular::{parse_csv, parse_tabular, Row, Table, MAX_REPORTED_ERRORS};
pub use templates::{template_for, CsvTemplate};

use serde::Serialize;
use serde_json::{Map, Value};

/// Always rendered with 200; failures are reported in-band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Status {
    pub fn disconnected(error: impl Into<String>) -> Self {
        Self { connected: false, version: None, database: None, user: None, error: Some(error.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TableInfo {
    pub name: String,
    /// `n_live_tup` from the statistics collector; approximate and can lag.
    pub row_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tables {
    pub tables: Vec<TableInfo>,
}

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: u64,
    /// Wall-clock milliseconds.
    pub duration: u64,
}

impl QueryResult {
    /// Columns come from the first row's keys; no rows means no columns.
    pub fn new(rows: Vec<Row>, rows_affected: u64, duration: u64) -> Self {
        let columns = rows.first().map(|r| r.keys().cloned().collect()).unwrap_or_default();
        let row_count = if rows.is_empty() { rows_affected } else { rows.len() as u64 };
        Self { columns, rows, row_count, duration }
    }
}

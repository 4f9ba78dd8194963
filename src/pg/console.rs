//! Raw SQL console over a shared Postgres pool.
//!
//! Statements are forwarded exactly as typed. There is no parsing, no
//! whitelisting and no parameter binding: whoever can reach the endpoint can
//! run anything the configured role is allowed to run.

use std::time::{Duration, Instant};

use futures::TryStreamExt;
use serde_json::{Number, Value};
use sqlx::{
    postgres::{PgPoolOptions, PgRow, PgValueRef},
    Column as _, Decode, Either, PgPool, Postgres, Row as _, TypeInfo as _, ValueRef as _,
};
use tracing::instrument;

use super::types::{QueryResult, Row, Status, TableInfo};
use crate::errors::{AppError, AppResult};

const LIST_TABLES_SQL: &str = "SELECT relname::text AS name, n_live_tup AS row_count \
     FROM pg_stat_user_tables WHERE schemaname = 'public' ORDER BY relname";

const STATUS_SQL: &str = "SELECT version(), current_database()::text, current_user::text";

#[derive(Debug, Clone)]
pub struct Console {
    pool: Option<PgPool>,
}

impl Console {
    /// A console that reports `Unconfigured` and never opens a socket.
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Builds the shared pool. Connections are opened on first use, so an
    /// unreachable server does not prevent startup.
    #[instrument(skip_all, err)]
    pub fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(url)?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn is_configured(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> AppResult<&PgPool> {
        self.pool.as_ref().ok_or(AppError::Unconfigured)
    }

    pub async fn status(&self) -> Status {
        let Some(pool) = &self.pool else {
            return Status::disconnected(AppError::Unconfigured.to_string());
        };
        match sqlx::query_as::<_, (String, String, String)>(STATUS_SQL)
            .fetch_one(pool)
            .await
        {
            Ok((version, database, user)) => Status {
                connected: true,
                version: Some(version),
                database: Some(database),
                user: Some(user),
                error: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "database status check failed");
                Status::disconnected(err.to_string())
            }
        }
    }

    #[instrument(skip(self), err)]
    pub async fn list_tables(&self) -> AppResult<Vec<TableInfo>> {
        let pool = self.pool()?;
        sqlx::query_as::<_, TableInfo>(LIST_TABLES_SQL)
            .fetch_all(pool)
            .await
            .map_err(|err| AppError::Database(err.to_string()))
    }

    /// Runs `sql` over the simple-query protocol, so several statements
    /// separated by `;` are accepted and every value comes back as text.
    #[instrument(skip_all, fields(sql_len = sql.len()), err)]
    pub async fn run_query(&self, sql: &str) -> AppResult<QueryResult> {
        let pool = self.pool()?;
        let started = Instant::now();
        let mut results = sqlx::raw_sql(sql).fetch_many(pool);
        let mut rows = Vec::new();
        let mut affected = 0u64;
        while let Some(item) = results
            .try_next()
            .await
            .map_err(|err| AppError::QueryFailed(err.to_string()))?
        {
            match item {
                Either::Left(done) => affected += done.rows_affected(),
                Either::Right(row) => rows.push(row_to_json(&row)),
            }
        }
        let duration = started.elapsed().as_millis() as u64;
        Ok(QueryResult::new(rows, affected, duration))
    }
}

fn row_to_json(row: &PgRow) -> Row {
    let mut out = Row::new();
    for (i, col) in row.columns().iter().enumerate() {
        let value = row
            .try_get_raw(i)
            .map(|raw| decode_value(raw, col.type_info().name()))
            .unwrap_or(Value::Null);
        out.insert(col.name().to_string(), value);
    }
    out
}

fn decode_value(raw: PgValueRef<'_>, type_name: &str) -> Value {
    if raw.is_null() {
        return Value::Null;
    }
    match <&str as Decode<'_, Postgres>>::decode(raw) {
        Ok(text) => text_to_json(text, type_name),
        Err(_) => Value::Null,
    }
}

/// Maps a text-format Postgres value onto the closest JSON type.
pub fn text_to_json(text: &str, type_name: &str) -> Value {
    match type_name {
        "BOOL" => Value::Bool(text == "t"),
        "INT2" | "INT4" | "INT8" | "OID" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        "FLOAT4" | "FLOAT8" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        "JSON" | "JSONB" => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
        _ => Value::String(text.to_string()),
    }
}

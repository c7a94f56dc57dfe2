use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::libs::schema::{Registry, Table};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::pool::PoolConnection;
use sqlx::postgres::types::{PgInterval, PgTimeTz};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Column as _, Decode, PgPool, Postgres, Row as _, Type, TypeInfo as _};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A result row, keyed by column name.
pub type Row = Map<String, Value>;

/// Runs SQL on behalf of the schema layer.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs one or more statements, returning the affected row count.
    async fn execute(&self, sql: &str) -> Result<u64>;

    async fn fetch(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>>;

    async fn fetchrow(&self, sql: &str, args: &[Value]) -> Result<Option<Row>> {
        Ok(self.fetch(sql, args).await?.into_iter().next())
    }
}

/// A PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct Pool {
    inner: PgPool,
}

impl Pool {
    pub async fn open(config: &PoolConfig) -> Result<Self> {
        config.validate()?;
        let inner = PgPoolOptions::new()
            .min_connections(config.min_size)
            .max_connections(config.max_size)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.uri)
            .await?;
        info!(
            "Opened pool ({}..{} connections)",
            config.min_size, config.max_size
        );
        Ok(Self { inner })
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
        Ok(self.inner.acquire().await?)
    }

    /// Closes every connection, giving up after `timeout`.
    pub async fn close(&self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.inner.close()).await {
            Ok(()) => {
                info!("Closed pool");
                Ok(())
            }
            Err(_) => {
                warn!("Pool did not close within {:?}", timeout);
                Err(Error::Timeout(format!(
                    "pool did not close within {:?}",
                    timeout
                )))
            }
        }
    }

    pub fn inner(&self) -> &PgPool {
        &self.inner
    }
}

#[async_trait]
impl Executor for Pool {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::raw_sql(sql).execute(&self.inner).await?;
        Ok(result.rows_affected())
    }

    async fn fetch(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        let rows = bind_all(sqlx::query(sql), args)
            .fetch_all(&self.inner)
            .await?;
        rows.iter().map(row_to_map).collect()
    }

    async fn fetchrow(&self, sql: &str, args: &[Value]) -> Result<Option<Row>> {
        let row = bind_all(sqlx::query(sql), args)
            .fetch_optional(&self.inner)
            .await?;
        row.as_ref().map(row_to_map).transpose()
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.clone()),
            Value::Array(_) | Value::Object(_) => query.bind(Json(arg.clone())),
        };
    }
    query
}

/// Decodes every column into JSON. Numeric and temporal values come back as
/// text, intervals as ISO 8601 durations and `bytea` as `\x` hex. Columns of
/// any other type fail with [`Error::TypeMismatch`].
fn row_to_map(row: &PgRow) -> Result<Row> {
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        let value = decode::<i64>(row, name, Value::from)
            .or_else(|| decode::<i32>(row, name, Value::from))
            .or_else(|| decode::<i16>(row, name, Value::from))
            .or_else(|| decode::<f64>(row, name, Value::from))
            .or_else(|| decode::<f32>(row, name, Value::from))
            .or_else(|| decode::<bool>(row, name, Value::from))
            .or_else(|| decode::<String>(row, name, Value::from))
            .or_else(|| decode::<Decimal>(row, name, text))
            .or_else(|| decode::<NaiveDate>(row, name, text))
            .or_else(|| decode::<NaiveDateTime>(row, name, text))
            .or_else(|| decode::<DateTime<Utc>>(row, name, rfc3339))
            .or_else(|| decode::<NaiveTime>(row, name, text))
            .or_else(|| decode::<PgTimeTz<NaiveTime, FixedOffset>>(row, name, |t| {
                Value::String(format!("{}{}", t.time, t.offset))
            }))
            .or_else(|| decode::<PgInterval>(row, name, interval_text))
            .or_else(|| decode::<Vec<u8>>(row, name, |bytes| bytea_text(&bytes)))
            .or_else(|| decode::<Json<Value>>(row, name, |json| json.0))
            .or_else(|| decode::<Vec<Option<i64>>>(row, name, |v| list(v, Value::from)))
            .or_else(|| decode::<Vec<Option<i32>>>(row, name, |v| list(v, Value::from)))
            .or_else(|| decode::<Vec<Option<i16>>>(row, name, |v| list(v, Value::from)))
            .or_else(|| decode::<Vec<Option<f64>>>(row, name, |v| list(v, Value::from)))
            .or_else(|| decode::<Vec<Option<f32>>>(row, name, |v| list(v, Value::from)))
            .or_else(|| decode::<Vec<Option<bool>>>(row, name, |v| list(v, Value::from)))
            .or_else(|| decode::<Vec<Option<String>>>(row, name, |v| list(v, Value::from)))
            .or_else(|| decode::<Vec<Option<Decimal>>>(row, name, |v| list(v, text)))
            .or_else(|| decode::<Vec<Option<NaiveDate>>>(row, name, |v| list(v, text)))
            .or_else(|| decode::<Vec<Option<NaiveDateTime>>>(row, name, |v| list(v, text)))
            .or_else(|| decode::<Vec<Option<DateTime<Utc>>>>(row, name, |v| list(v, rfc3339)))
            .or_else(|| decode::<Vec<Option<NaiveTime>>>(row, name, |v| list(v, text)))
            .or_else(|| decode::<Vec<Option<Json<Value>>>>(row, name, |v| list(v, |j| j.0)))
            .ok_or_else(|| Error::TypeMismatch {
                column: Some(name.to_string()),
                expected: "a value representable as JSON".to_string(),
                found: col.type_info().name().to_string(),
            })?;
        map.insert(name.to_string(), value);
    }
    Ok(map)
}

/// `None` when the column is not a `T`; SQL `NULL` decodes to `Value::Null`.
fn decode<'r, T>(row: &'r PgRow, name: &str, convert: impl FnOnce(T) -> Value) -> Option<Value>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(name)
        .ok()
        .map(|value| value.map_or(Value::Null, convert))
}

fn list<T>(items: Vec<Option<T>>, convert: impl Fn(T) -> Value) -> Value {
    Value::Array(
        items
            .into_iter()
            .map(|item| item.map_or(Value::Null, &convert))
            .collect(),
    )
}

fn text<T: ToString>(value: T) -> Value {
    Value::String(value.to_string())
}

fn rfc3339(value: DateTime<Utc>) -> Value {
    Value::String(value.to_rfc3339())
}

/// ISO 8601 duration, e.g. `P14M3DT4.5S`.
fn interval_text(interval: PgInterval) -> Value {
    let seconds = Decimal::new(interval.microseconds, 6).normalize();
    Value::String(format!(
        "P{}M{}DT{}S",
        interval.months, interval.days, seconds
    ))
}

fn bytea_text(bytes: &[u8]) -> Value {
    let mut hex = String::with_capacity(2 + bytes.len() * 2);
    hex.push_str("\\x");
    for byte in bytes {
        hex.push_str(&format!("{:02x}", byte));
    }
    Value::String(hex)
}

impl Table {
    /// Creates the table and its indexes. With `verbose`, the SQL is logged
    /// at info level.
    pub async fn create_table<E>(&self, db: &E, verbose: bool) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let sql = self.create_table_sql(true);
        if verbose {
            info!("{}", sql);
        } else {
            debug!("Creating table {}", self.name());
        }
        db.execute(&sql).await?;
        Ok(())
    }

    pub async fn drop_table<E>(&self, db: &E, cascade: bool) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let sql = self.drop_table_sql(true, cascade);
        debug!("{}", sql);
        db.execute(&sql).await?;
        Ok(())
    }
}

impl Registry {
    /// Creates every registered table, in registration order.
    pub async fn create_all<E>(&self, db: &E, verbose: bool) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        for table in self.tables() {
            table.create_table(db, verbose).await?;
        }
        Ok(())
    }

    /// Drops every registered table, most recently registered first.
    pub async fn drop_all<E>(&self, db: &E, cascade: bool) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        let tables: Vec<_> = self.tables().collect();
        for table in tables.into_iter().rev() {
            table.drop_table(db, cascade).await?;
        }
        Ok(())
    }
}

use crate::app::connection::Connection;
use crate::app::models::TableInfo;
use anyhow::{Context, Result};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// Cast to CHAR to avoid VARBINARY names on MySQL 8.0+.
const TABLES_QUERY: &str = r#"
    SELECT
        CAST(TABLE_NAME AS CHAR) AS table_name,
        CAST(IFNULL(TABLE_ROWS, 0) AS UNSIGNED) AS row_count,
        CAST(IFNULL(DATA_LENGTH, 0) AS UNSIGNED) AS data_size,
        CAST(IFNULL(INDEX_LENGTH, 0) AS UNSIGNED) AS index_size,
        CAST(IFNULL(DATA_LENGTH, 0) + IFNULL(INDEX_LENGTH, 0) AS UNSIGNED) AS total_size
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = ?
    ORDER BY total_size DESC
"#;

/// Reads table names and sizes from `information_schema` over a MySQL connection.
///
/// The rest of the tool is synchronous, so the inspector owns a current-thread
/// runtime and blocks on each query.
pub struct Inspector {
    runtime: Runtime,
    pool: MySqlPool,
    database: String,
    address: String,
}

pub fn connect_options(conn: &Connection) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&conn.host)
        .port(conn.port)
        .username(&conn.user)
        .database(&conn.database);
    match &conn.password {
        Some(password) => options.password(password),
        None => options,
    }
}

impl Inspector {
    /// Builds a lazy single-connection pool; nothing is sent until the first query.
    pub fn connect(conn: &Connection) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        let pool = {
            let _guard = runtime.enter();
            MySqlPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(CONNECT_TIMEOUT)
                .connect_lazy_with(connect_options(conn))
        };

        Ok(Self {
            runtime,
            pool,
            database: conn.database.clone(),
            address: format!("{}:{}", conn.host, conn.port),
        })
    }

    /// Checks that the server accepts the credentials.
    pub fn ping(&self) -> Result<()> {
        self.runtime
            .block_on(sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool))
            .with_context(|| format!("Failed to connect to {}", self.address))?;
        Ok(())
    }

    pub fn all_tables(&self) -> Result<Vec<TableInfo>> {
        let rows = self
            .runtime
            .block_on(
                sqlx::query(TABLES_QUERY)
                    .bind(&self.database)
                    .fetch_all(&self.pool),
            )
            .context("Failed to get table information")?;

        rows.iter().map(table_from_row).collect()
    }
}

impl Drop for Inspector {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

fn table_from_row(row: &MySqlRow) -> Result<TableInfo> {
    let name: String = row
        .try_get("table_name")
        .context("Failed to parse table name")?;
    let count = |column: &str| -> Result<u64> {
        row.try_get(column)
            .with_context(|| format!("Failed to parse {} for table {}", column, name))
    };

    Ok(TableInfo {
        row_count: count("row_count")?,
        data_size: count("data_size")?,
        index_size: count("index_size")?,
        total_size: count("total_size")?,
        name,
    })
}

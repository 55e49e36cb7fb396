use sqlx::any::{install_default_drivers, AnyRow};
use sqlx::{AnyConnection, Connection, Executor, Row};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::error::{PolyfieldError, Result};

/// Database backend families with distinct column types or DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    MySql,
    Sqlite,
    Other,
}

impl Backend {
    /// Classify a backend identifier string such as `"PostgreSQL"` or `"MySQL"`.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("mysql") || name.contains("mariadb") {
            Backend::MySql
        } else if name.contains("postgres") {
            Backend::Postgres
        } else if name.contains("sqlite") {
            Backend::Sqlite
        } else {
            Backend::Other
        }
    }
}

/// One introspected table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub db_type: String,
    pub is_nullable: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, db_type: impl Into<String>, is_nullable: bool) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
            is_nullable,
        }
    }
}

/// The database operations the reconciliation command needs.
pub trait SchemaConnection {
    /// Backend identifier, e.g. `"PostgreSQL"`.
    fn backend_name(&self) -> &str;

    /// Quote an identifier for this backend.
    fn quote_name(&self, name: &str) -> String;

    /// Columns of `table` in ordinal order. Empty if the table does not exist.
    fn table_description(&mut self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Run one statement in its own transaction and commit it.
    fn execute_committed(&mut self, sql: &str) -> Result<()>;

    fn backend(&self) -> Backend {
        Backend::from_name(self.backend_name())
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Backtick-quote an identifier, doubling embedded backticks.
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Synchronous connection over the sqlx `Any` driver.
///
/// Holds one connection and a current-thread runtime for the whole run.
pub struct SqlxConnection {
    runtime: Runtime,
    conn: AnyConnection,
    backend_name: String,
}

impl SqlxConnection {
    /// Connect to a `postgres://`, `mysql://` or `sqlite:` URL.
    pub fn connect(url: &str) -> Result<Self> {
        install_default_drivers();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let conn = runtime.block_on(AnyConnection::connect(url))?;
        let backend_name = conn.backend_name().to_string();

        info!(backend = %backend_name, "Database connection opened");

        Ok(Self {
            runtime,
            conn,
            backend_name,
        })
    }

    /// Close the connection.
    pub fn close(self) -> Result<()> {
        let Self { runtime, conn, .. } = self;
        runtime.block_on(conn.close())?;
        Ok(())
    }

    fn introspection_query(&self) -> &'static str {
        match Backend::from_name(&self.backend_name) {
            Backend::Postgres => {
                "SELECT a.attname::text, format_type(a.atttypid, a.atttypmod), NOT a.attnotnull
                 FROM pg_attribute a
                 WHERE a.attrelid = to_regclass(quote_ident($1::text))
                   AND a.attnum > 0 AND NOT a.attisdropped
                 ORDER BY a.attnum"
            }
            Backend::MySql => {
                "SELECT CAST(column_name AS CHAR), CAST(column_type AS CHAR),
                        CAST(is_nullable AS CHAR) = 'YES'
                 FROM information_schema.columns
                 WHERE table_schema = DATABASE() AND table_name = ?
                 ORDER BY ordinal_position"
            }
            Backend::Sqlite | Backend::Other => {
                "SELECT name, type, \"notnull\" = 0 FROM pragma_table_info(?) ORDER BY cid"
            }
        }
    }
}

impl SchemaConnection for SqlxConnection {
    fn backend_name(&self) -> &str {
        &self.backend_name
    }

    fn quote_name(&self, name: &str) -> String {
        match self.backend() {
            Backend::MySql => quote_ident_mysql(name),
            _ => quote_ident(name),
        }
    }

    fn table_description(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        let query = self.introspection_query();
        let rows: Vec<AnyRow> = self.runtime.block_on(
            sqlx::query(query)
                .bind(table.to_string())
                .fetch_all(&mut self.conn),
        )?;

        let columns = rows
            .iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: row.try_get::<String, _>(0)?,
                    db_type: row.try_get::<String, _>(1)?,
                    is_nullable: read_flag(row, 2)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        debug!(table = %table, columns = columns.len(), "Introspected table");
        Ok(columns)
    }

    fn execute_committed(&mut self, sql: &str) -> Result<()> {
        let backend = self.backend_name.clone();
        let conn = &mut self.conn;
        let result: std::result::Result<(), sqlx::Error> = self.runtime.block_on(async {
            let mut tx = conn.begin().await?;
            match (&mut *tx).execute(sql).await {
                Ok(_) => tx.commit().await,
                Err(e) => {
                    tx.rollback().await?;
                    Err(e)
                }
            }
        });

        result.map_err(|e| PolyfieldError::BackendIncompatibility {
            backend,
            sql: sql.to_string(),
            message: e.to_string(),
        })
    }
}

/// Boolean comparison results come back as bool or integer depending on the driver.
fn read_flag(row: &AnyRow, index: usize) -> std::result::Result<bool, sqlx::Error> {
    match row.try_get::<bool, _>(index) {
        Ok(flag) => Ok(flag),
        Err(_) => row.try_get::<i64, _>(index).map(|v| v != 0),
    }
}

use crate::bind::bind_all;
use crate::errors::{Result, StoreError};
use crate::sql::upsert_statement;
use async_trait::async_trait;
use fsbackfill_core::{
    coerce_row, log_op_end, log_op_start, BfError, Row, Sink, TableSpec, WriteOutcome,
};
use fsbackfill_core_types::Sensitive;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::str::FromStr;
use std::time::Instant;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection parameters for the destination database
#[derive(Debug, Clone)]
pub struct SinkSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Sensitive<String>,
    pub ssl_mode: PgSslMode,
    pub max_connections: u32,
}

impl SinkSettings {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(self.password.expose())
            .ssl_mode(self.ssl_mode)
    }
}

/// Accepts the libpq spellings (`disable`, `prefer`, `require`, ...)
pub fn parse_ssl_mode(raw: &str) -> Result<PgSslMode> {
    PgSslMode::from_str(raw.trim()).map_err(|_| StoreError::InvalidSslMode(raw.to_string()))
}

/// Idempotent row writer over a PostgreSQL pool
pub struct PgSink {
    pool: PgPool,
}

impl PgSink {
    /// Open the pool; one connection is established before returning, so
    /// bad credentials or an unreachable host fail here
    pub async fn connect(settings: &SinkSettings) -> Result<Self> {
        let started = Instant::now();
        log_op_start!(
            "pg_connect",
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            ssl_mode = ?settings.ssl_mode
        );

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(settings.connect_options())
            .await
            .map_err(|source| StoreError::Connect {
                host: settings.host.clone(),
                port: settings.port,
                database: settings.database.clone(),
                source,
            })?;

        log_op_end!(
            "pg_connect",
            duration_ms = started.elapsed().as_millis() as u64
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert(&self, table: &TableSpec, row: &Row) -> Result<WriteOutcome> {
        let values = coerce_row(table, row)?;
        let sql = upsert_statement(table);

        let result = bind_all(sqlx::query(&sql), values)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Query {
                table: table.name.clone(),
                source,
            })?;

        match result.rows_affected() {
            1 => Ok(WriteOutcome::Inserted),
            0 => Ok(WriteOutcome::Skipped),
            rows => Err(StoreError::UnexpectedRowCount {
                table: table.name.clone(),
                rows,
            }),
        }
    }
}

#[async_trait]
impl Sink for PgSink {
    async fn upsert(&self, table: &TableSpec, row: &Row) -> fsbackfill_core::Result<WriteOutcome> {
        self.insert(table, row).await.map_err(BfError::from)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::debug!(component = module_path!(), op = "pg_close", "pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SinkSettings {
        SinkSettings {
            host: "db.internal".into(),
            port: 6543,
            database: "app".into(),
            user: "backfill".into(),
            password: Sensitive::new("pg-secret".into()),
            ssl_mode: PgSslMode::Require,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    #[test]
    fn test_ssl_modes() {
        assert!(matches!(parse_ssl_mode("require"), Ok(PgSslMode::Require)));
        assert!(matches!(parse_ssl_mode("disable"), Ok(PgSslMode::Disable)));
        assert!(matches!(parse_ssl_mode("verify-full"), Ok(PgSslMode::VerifyFull)));
        assert!(matches!(
            parse_ssl_mode("sometimes"),
            Err(StoreError::InvalidSslMode(_))
        ));
    }

    #[test]
    fn test_settings_debug_redacts_password() {
        let rendered = format!("{:?}", settings());
        assert!(rendered.contains("db.internal"));
        assert!(!rendered.contains("pg-secret"));
    }

    #[test]
    fn test_connect_options_carry_settings() {
        let opts = settings().connect_options();
        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 6543);
        assert_eq!(opts.get_database(), Some("app"));
        assert_eq!(opts.get_username(), "backfill");
    }
}

//! MySQL metadata source.
//!
//! MySQL has no schema level below the database: JDBC-style metadata reports
//! databases as catalogs, so discovery falls through to the catalog step.
//! Text columns are cast to `CHAR` because several `information_schema`
//! columns come back as binary strings on MySQL 8.

use super::{
    ConnectionSettings, DatabaseType, MetadataSource, ProductInfo, TableKind, TableSummary,
    map_sqlx_error,
};
use crate::Result;
use crate::error::{SchemaDocError, redact_database_url};
use async_trait::async_trait;
use sqlx::MySqlPool;

const POPULATED_CATALOGS_QUERY: &str = r#"
    SELECT DISTINCT CAST(table_schema AS CHAR)
    FROM information_schema.tables
    WHERE table_schema NOT IN ('mysql', 'information_schema', 'performance_schema', 'sys')
    ORDER BY 1
"#;

const TABLES_QUERY: &str = r#"
    SELECT
        CAST(table_name AS CHAR),
        CAST(table_type AS CHAR),
        CAST(NULLIF(table_comment, '') AS CHAR)
    FROM information_schema.tables
    WHERE table_schema = ?
    ORDER BY table_name
"#;

/// Metadata source backed by a lazily connected MySQL pool.
pub struct MySqlMetadataSource {
    /// Connection pool shared by every query of the run
    pub pool: MySqlPool,
    /// Settings parsed from the connection URL
    pub settings: ConnectionSettings,
}

impl std::fmt::Debug for MySqlMetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlMetadataSource")
            .field("settings", &self.settings)
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl MySqlMetadataSource {
    /// Creates a source for `connection_string` without connecting yet.
    ///
    /// # Errors
    /// Returns an error if the connection string is invalid.
    pub fn new(connection_string: &str) -> Result<Self> {
        use sqlx::Executor;

        let settings = ConnectionSettings::from_url(connection_string, &["mysql"], 3306)?;
        let max_execution_ms = settings.query_timeout.as_millis();

        let pool = sqlx::mysql::MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    conn.execute(
                        format!("SET max_execution_time = {}", max_execution_ms).as_str(),
                    )
                    .await?;
                    conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| {
                SchemaDocError::connection(
                    format!(
                        "Failed to create MySQL connection pool to {}",
                        redact_database_url(connection_string)
                    ),
                    e,
                )
            })?;

        tracing::debug!("Created MySQL metadata source for {}", settings);

        Ok(Self { pool, settings })
    }
}

#[async_trait]
impl MetadataSource for MySqlMetadataSource {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    fn supports_schemas_in_table_definitions(&self) -> bool {
        false
    }

    fn supports_catalogs_in_table_definitions(&self) -> bool {
        true
    }

    async fn populated_schemas(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn populated_catalogs(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(POPULATED_CATALOGS_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list populated databases", e))
    }

    async fn product_info(&self) -> Result<ProductInfo> {
        let version: String = sqlx::query_scalar("SELECT CAST(VERSION() AS CHAR)")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get server version", e))?;

        Ok(ProductInfo {
            name: "MySQL".to_string(),
            version,
        })
    }

    async fn connection_user(&self) -> Result<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT CAST(SUBSTRING_INDEX(CURRENT_USER(), '@', 1) AS CHAR)",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to get current user", e))
    }

    async fn tables(&self, namespace: &str) -> Result<Vec<TableSummary>> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>)>(TABLES_QUERY)
            .bind(namespace)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(format!("Failed to list tables in '{}'", namespace), e))?;

        Ok(rows
            .into_iter()
            .map(|(name, table_type, comment)| TableSummary {
                name,
                kind: TableKind::from_table_type(&table_type),
                comment,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_is_lazy_and_reports_capabilities() {
        let source = MySqlMetadataSource::new("mysql://root@localhost:3999").unwrap();

        assert_eq!(source.database_type(), DatabaseType::MySQL);
        assert!(!source.supports_schemas_in_table_definitions());
        assert!(source.supports_catalogs_in_table_definitions());
        assert_eq!(source.settings.port, 3999);
        assert!(source.populated_schemas().await.unwrap().is_empty());
    }

    #[test]
    fn test_new_rejects_other_scheme() {
        assert!(MySqlMetadataSource::new("postgres://localhost/app").is_err());
    }
}

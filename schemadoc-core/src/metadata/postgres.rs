//! PostgreSQL metadata source.
//!
//! PostgreSQL qualifies tables by schema, never by catalog: a connection is
//! bound to one database and `information_schema` only describes that one.

use super::{
    ConnectionSettings, DatabaseType, MetadataSource, ProductInfo, TableKind, TableSummary,
    map_sqlx_error,
};
use crate::Result;
use crate::error::{SchemaDocError, redact_database_url};
use async_trait::async_trait;
use sqlx::PgPool;

const POPULATED_SCHEMAS_QUERY: &str = r#"
    SELECT DISTINCT table_schema::text
    FROM information_schema.tables
    WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
      AND table_schema NOT LIKE 'pg_toast%'
      AND table_schema NOT LIKE 'pg_temp%'
    ORDER BY 1
"#;

const TABLES_QUERY: &str = r#"
    SELECT
        t.table_name::text,
        t.table_type::text,
        obj_description(
            format('%I.%I', t.table_schema, t.table_name)::regclass,
            'pg_class'
        ) AS comment
    FROM information_schema.tables t
    WHERE t.table_schema = $1
    ORDER BY t.table_name
"#;

/// Metadata source backed by a lazily connected PostgreSQL pool.
pub struct PostgresMetadataSource {
    /// Connection pool shared by every query of the run
    pub pool: PgPool,
    /// Settings parsed from the connection URL
    pub settings: ConnectionSettings,
}

impl std::fmt::Debug for PostgresMetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresMetadataSource")
            .field("settings", &self.settings)
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresMetadataSource {
    /// Creates a source for `connection_string` without connecting yet.
    ///
    /// Every pooled session is read-only and carries the configured
    /// statement timeout.
    ///
    /// # Errors
    /// Returns an error if the connection string is invalid.
    pub fn new(connection_string: &str) -> Result<Self> {
        use sqlx::Executor;

        let settings =
            ConnectionSettings::from_url(connection_string, &["postgres", "postgresql"], 5432)?;
        let statement_timeout_ms = settings.query_timeout.as_millis();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    conn.execute(
                        format!("SET statement_timeout = {}", statement_timeout_ms).as_str(),
                    )
                    .await?;
                    conn.execute("SET default_transaction_read_only = on")
                        .await?;
                    let app_name = format!("schemadoc-{}", env!("CARGO_PKG_VERSION"));
                    conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                        .await?;
                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| {
                SchemaDocError::connection(
                    format!(
                        "Failed to create PostgreSQL connection pool to {}",
                        redact_database_url(connection_string)
                    ),
                    e,
                )
            })?;

        tracing::debug!("Created PostgreSQL metadata source for {}", settings);

        Ok(Self { pool, settings })
    }
}

/// Splits `version()` output such as "PostgreSQL 16.2 on x86_64..." into
/// product name and version number.
fn parse_version_string(version: &str) -> ProductInfo {
    let mut parts = version.split_whitespace();
    let name = parts.next().unwrap_or("PostgreSQL").to_string();
    let number = parts.next().unwrap_or(version).to_string();
    ProductInfo {
        name,
        version: number,
    }
}

#[async_trait]
impl MetadataSource for PostgresMetadataSource {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn supports_schemas_in_table_definitions(&self) -> bool {
        true
    }

    fn supports_catalogs_in_table_definitions(&self) -> bool {
        false
    }

    async fn populated_schemas(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(POPULATED_SCHEMAS_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list populated schemas", e))
    }

    async fn populated_catalogs(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn product_info(&self) -> Result<ProductInfo> {
        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get server version", e))?;

        Ok(parse_version_string(&version))
    }

    async fn connection_user(&self) -> Result<String> {
        sqlx::query_scalar::<_, String>("SELECT current_user::text")
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

    #[test]
    fn test_parse_version_string() {
        let info = parse_version_string("PostgreSQL 16.2 on x86_64-pc-linux-gnu, compiled by gcc");
        assert_eq!(info.name, "PostgreSQL");
        assert_eq!(info.version, "16.2");
    }

    #[test]
    fn test_parse_version_string_single_token() {
        let info = parse_version_string("PostgreSQL");
        assert_eq!(info.name, "PostgreSQL");
        assert_eq!(info.version, "PostgreSQL");
    }

    #[tokio::test]
    async fn test_new_is_lazy_and_reports_capabilities() {
        let source = PostgresMetadataSource::new("postgres://alice@localhost:5999/app").unwrap();

        assert_eq!(source.database_type(), DatabaseType::PostgreSQL);
        assert!(source.supports_schemas_in_table_definitions());
        assert!(!source.supports_catalogs_in_table_definitions());
        assert_eq!(source.settings.database, Some("app".to_string()));
        assert!(source.populated_catalogs().await.unwrap().is_empty());
    }

    #[test]
    fn test_new_rejects_other_scheme() {
        assert!(PostgresMetadataSource::new("mysql://localhost/app").is_err());
    }
}

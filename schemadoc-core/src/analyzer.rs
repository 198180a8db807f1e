//! Per-schema analysis.

use crate::Result;
use crate::config::{Config, INDEX_FILE_NAME};
use crate::error::SchemaDocError;
use crate::metadata::{MetadataSource, TableKind};
use crate::output::LineWriter;
use crate::render::write_schema_page;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of documenting one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedSchema {
    /// Namespace that was documented
    pub name: String,
    /// Number of base tables
    pub table_count: usize,
    /// Number of views
    pub view_count: usize,
    /// Directory the schema's pages were written to
    pub output_dir: PathBuf,
}

/// Documents the single schema selected by a [`Config`].
#[async_trait]
pub trait SchemaAnalyzer: Send + Sync {
    /// Analyzes the schema selected by `config`.
    ///
    /// `Ok(None)` means the schema produced nothing worth writing; callers
    /// treat it as a non-fatal failure.
    ///
    /// # Errors
    /// Returns an error for database, I/O or rendering faults.
    async fn analyze(&self, config: &Config) -> Result<Option<AnalyzedSchema>>;
}

/// Writes a table-and-view listing page for each analyzed schema.
pub struct HtmlSchemaAnalyzer<'a> {
    source: &'a dyn MetadataSource,
}

impl<'a> HtmlSchemaAnalyzer<'a> {
    /// Creates an analyzer that reads through `source`.
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl SchemaAnalyzer for HtmlSchemaAnalyzer<'_> {
    async fn analyze(&self, config: &Config) -> Result<Option<AnalyzedSchema>> {
        let Some(namespace) = config.schema.clone().or_else(|| config.database_name()) else {
            tracing::warn!("No schema or database selected, nothing to analyze");
            return Ok(None);
        };

        let tables = self.source.tables(&namespace).await?;
        if tables.is_empty() {
            tracing::warn!("Schema '{}' has no tables or views", namespace);
            return Ok(None);
        }

        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|e| {
                SchemaDocError::io(
                    format!("Failed to create {}", config.output_dir.display()),
                    e,
                )
            })?;

        let mut out =
            LineWriter::create(&config.output_dir.join(INDEX_FILE_NAME), &config.charset).await?;
        let written =
            write_schema_page(&namespace, &tables, config.one_of_multiple_schemas, &mut out).await;
        let closed = out.close().await;
        written?;
        closed?;

        let view_count = tables
            .iter()
            .filter(|table| table.kind == TableKind::View)
            .count();
        let table_count = tables.len().saturating_sub(view_count);

        tracing::debug!(
            "Documented {} tables and {} views of '{}'",
            table_count,
            view_count,
            namespace
        );

        Ok(Some(AnalyzedSchema {
            name: namespace,
            table_count,
            view_count,
            output_dir: config.output_dir.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DatabaseType, ProductInfo, TableSummary};
    use std::collections::HashMap;

    struct TableSource {
        tables: HashMap<String, Vec<TableSummary>>,
    }

    impl TableSource {
        fn with(namespace: &str, tables: Vec<TableSummary>) -> Self {
            let mut map = HashMap::new();
            map.insert(namespace.to_string(), tables);
            Self { tables: map }
        }
    }

    #[async_trait]
    impl MetadataSource for TableSource {
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
            Ok(self.tables.keys().cloned().collect())
        }

        async fn populated_catalogs(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn product_info(&self) -> Result<ProductInfo> {
            Ok(ProductInfo {
                name: "PostgreSQL".to_string(),
                version: "16".to_string(),
            })
        }

        async fn connection_user(&self) -> Result<String> {
            Ok("postgres".to_string())
        }

        async fn tables(&self, namespace: &str) -> Result<Vec<TableSummary>> {
            Ok(self.tables.get(namespace).cloned().unwrap_or_default())
        }
    }

    fn table(name: &str, kind: TableKind) -> TableSummary {
        TableSummary {
            name: name.to_string(),
            kind,
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_analyze_writes_schema_page() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sales");
        let source = TableSource::with(
            "sales",
            vec![
                table("orders", TableKind::Table),
                table("customers", TableKind::Table),
                table("open_orders", TableKind::View),
            ],
        );
        let config = Config::from_args([
            "--database-url",
            "postgres://localhost/app",
            "-s",
            "sales",
            "-o",
            out.to_str().unwrap(),
        ])
        .unwrap();

        let analyzed = HtmlSchemaAnalyzer::new(&source)
            .analyze(&config)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(analyzed.name, "sales");
        assert_eq!(analyzed.table_count, 2);
        assert_eq!(analyzed.view_count, 1);
        assert_eq!(analyzed.output_dir, out);

        let html = std::fs::read_to_string(out.join("index.html")).unwrap();
        assert!(html.contains("customers"));
        assert!(!html.contains("../index.html"));
    }

    #[tokio::test]
    async fn test_analyze_falls_back_to_database_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = TableSource::with("app", vec![table("t", TableKind::Table)]);
        let mut config = Config::from_args([
            "--database-url",
            "mysql://localhost/app",
            "-o",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        config.one_of_multiple_schemas = true;

        let analyzed = HtmlSchemaAnalyzer::new(&source)
            .analyze(&config)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(analyzed.name, "app");
        let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(html.contains("../index.html"));
    }

    #[tokio::test]
    async fn test_analyze_empty_schema_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty");
        let source = TableSource::with("empty", Vec::new());
        let config = Config::from_args(["-s", "empty", "-o", out.to_str().unwrap()]).unwrap();

        let analyzed = HtmlSchemaAnalyzer::new(&source).analyze(&config).await.unwrap();

        assert!(analyzed.is_none());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_analyze_without_namespace_is_none() {
        let source = TableSource::with("app", Vec::new());
        let config = Config::from_args(["--database-url", "postgres://localhost"]).unwrap();

        let analyzed = HtmlSchemaAnalyzer::new(&source).analyze(&config).await.unwrap();
        assert!(analyzed.is_none());
    }
}

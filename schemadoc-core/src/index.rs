//! Top-level index page of a multi-schema run.

use crate::Result;
use crate::config::INDEX_FILE_NAME;
use crate::error::SchemaDocError;
use crate::metadata::MetadataSource;
use crate::output::LineWriter;
use crate::render::IndexRenderer;
use std::path::{Path, PathBuf};

/// Writes `<output_dir>/index.html` linking every schema in `schemas`.
///
/// Does nothing and returns `Ok(None)` for an empty list. The file is
/// flushed and closed even when the renderer fails; the renderer's error
/// takes precedence over a close error.
///
/// # Errors
/// Returns an error if the directory or file cannot be created, the
/// charset is unsupported, or rendering fails.
pub async fn write_index(
    db_name: Option<&str>,
    schemas: &[String],
    source: &dyn MetadataSource,
    output_dir: &Path,
    charset: &str,
    renderer: &dyn IndexRenderer,
) -> Result<Option<PathBuf>> {
    if schemas.is_empty() {
        tracing::debug!("No schemas resolved, skipping index page");
        return Ok(None);
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| SchemaDocError::io(format!("Failed to create {}", output_dir.display()), e))?;

    let path = output_dir.join(INDEX_FILE_NAME);
    let mut out = LineWriter::create(&path, charset).await?;
    let rendered = renderer.write(db_name, schemas, source, &mut out).await;
    let closed = out.close().await;
    rendered?;
    closed?;

    tracing::info!("Wrote index of {} schemas to {}", schemas.len(), path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DatabaseType, ProductInfo, TableSummary};
    use async_trait::async_trait;

    struct NullSource;

    #[async_trait]
    impl MetadataSource for NullSource {
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
            Ok(Vec::new())
        }

        async fn product_info(&self) -> Result<ProductInfo> {
            Ok(ProductInfo {
                name: "MySQL".to_string(),
                version: "8.4".to_string(),
            })
        }

        async fn connection_user(&self) -> Result<String> {
            Ok("root".to_string())
        }

        async fn tables(&self, _namespace: &str) -> Result<Vec<TableSummary>> {
            Ok(Vec::new())
        }
    }

    /// Writes one line per schema, then optionally fails.
    struct ListRenderer {
        fail: bool,
    }

    #[async_trait]
    impl IndexRenderer for ListRenderer {
        async fn write(
            &self,
            _db_name: Option<&str>,
            schemas: &[String],
            _source: &dyn MetadataSource,
            out: &mut LineWriter,
        ) -> Result<()> {
            for schema in schemas {
                out.write_line(schema).await?;
            }
            if self.fail {
                return Err(SchemaDocError::configuration("renderer failed"));
            }
            Ok(())
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_list_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let written = write_index(
            None,
            &[],
            &NullSource,
            &out,
            "UTF-8",
            &ListRenderer { fail: false },
        )
        .await
        .unwrap();

        assert!(written.is_none());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_writes_index_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");

        let written = write_index(
            Some("app"),
            &names(&["a", "b"]),
            &NullSource,
            &out,
            "utf8",
            &ListRenderer { fail: false },
        )
        .await
        .unwrap();

        assert_eq!(written, Some(out.join("index.html")));
        assert_eq!(std::fs::read_to_string(out.join("index.html")).unwrap(), "a\nb\n");
    }

    #[tokio::test]
    async fn test_renderer_failure_still_flushes() {
        let dir = tempfile::tempdir().unwrap();

        let result = write_index(
            None,
            &names(&["a"]),
            &NullSource,
            dir.path(),
            "UTF-8",
            &ListRenderer { fail: true },
        )
        .await;

        assert!(matches!(result, Err(SchemaDocError::Configuration { .. })));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("index.html")).unwrap(),
            "a\n"
        );
    }

    #[tokio::test]
    async fn test_unsupported_charset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let result = write_index(
            None,
            &names(&["a"]),
            &NullSource,
            dir.path(),
            "latin1",
            &ListRenderer { fail: false },
        )
        .await;

        assert!(matches!(result, Err(SchemaDocError::Configuration { .. })));
        assert!(!dir.path().join("index.html").exists());
    }
}

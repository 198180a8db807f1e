//! HTML rendering for the cross-schema landing page and per-schema pages.
//!
//! Templates live in `templates/` and are compiled in by askama, which
//! HTML-escapes every interpolated value.

use crate::Result;
use crate::config::INDEX_FILE_NAME;
use crate::error::SchemaDocError;
use crate::jobs::is_valid_output_name;
use crate::metadata::{MetadataSource, TableKind, TableSummary};
use crate::output::LineWriter;
use askama::Template;
use async_trait::async_trait;

/// Writes the landing page that links every schema of a run.
#[async_trait]
pub trait IndexRenderer: Send + Sync {
    /// Writes index markup for `schemas` to `out`.
    ///
    /// `out` is owned by the caller, which closes it whether or not this
    /// returns an error.
    ///
    /// # Errors
    /// Returns an error if the source cannot be queried or the markup
    /// cannot be rendered or written.
    async fn write(
        &self,
        db_name: Option<&str>,
        schemas: &[String],
        source: &dyn MetadataSource,
        out: &mut LineWriter,
    ) -> Result<()>;
}

#[derive(Template)]
#[template(path = "multi_schema_index.html")]
struct MultiSchemaIndexPage<'a> {
    charset: &'a str,
    db_name: &'a str,
    product_name: &'a str,
    product_version: &'a str,
    schema_count_label: String,
    entries: Vec<IndexEntry<'a>>,
    tool_version: &'a str,
    generated_at: String,
}

/// One schema on the index page; `href` is empty when it gets no link.
struct IndexEntry<'a> {
    name: &'a str,
    href: String,
}

/// One row of the per-schema table listing.
struct PageRow<'a> {
    name: &'a str,
    kind: &'static str,
    comment: &'a str,
}

#[derive(Template)]
#[template(path = "schema.html")]
struct SchemaPage<'a> {
    charset: &'a str,
    schema: &'a str,
    one_of_multiple_schemas: bool,
    table_count: usize,
    view_count: usize,
    rows: Vec<PageRow<'a>>,
    tool_version: &'a str,
    generated_at: String,
}

/// `"1 schema"`, `"3 schemas"`.
pub fn schema_count_label(count: usize) -> String {
    format!("{} schema{}", count, if count == 1 { "" } else { "s" })
}

/// Relative link to a schema's page, percent-encoded as a single path
/// segment.
///
/// Names that cannot be a direct child directory of the run get no link,
/// so the index never points outside the output directory.
pub fn schema_href(schema: &str) -> Option<String> {
    if !is_valid_output_name(schema) {
        return None;
    }

    let mut url = url::Url::parse("file:///").ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push(schema)
        .push(INDEX_FILE_NAME);
    Some(url.path().trim_start_matches('/').to_string())
}

fn generated_at() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Default [`IndexRenderer`] producing a single HTML table of links.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlIndexRenderer;

#[async_trait]
impl IndexRenderer for HtmlIndexRenderer {
    async fn write(
        &self,
        db_name: Option<&str>,
        schemas: &[String],
        source: &dyn MetadataSource,
        out: &mut LineWriter,
    ) -> Result<()> {
        let product = source.product_info().await?;

        let page = MultiSchemaIndexPage {
            charset: out.charset(),
            db_name: db_name.unwrap_or_default(),
            product_name: &product.name,
            product_version: &product.version,
            schema_count_label: schema_count_label(schemas.len()),
            entries: schemas
                .iter()
                .map(|schema| IndexEntry {
                    name: schema,
                    href: schema_href(schema).unwrap_or_default(),
                })
                .collect(),
            tool_version: env!("CARGO_PKG_VERSION"),
            generated_at: generated_at(),
        };

        let html = page
            .render()
            .map_err(|e| SchemaDocError::render("multi-schema index page", e))?;
        out.write_str(&html).await
    }
}

/// Renders the page for one schema's tables and views into `out`.
///
/// # Errors
/// Returns an error if the markup cannot be rendered or written.
pub async fn write_schema_page(
    schema: &str,
    tables: &[TableSummary],
    one_of_multiple_schemas: bool,
    out: &mut LineWriter,
) -> Result<()> {
    let view_count = tables
        .iter()
        .filter(|table| table.kind == TableKind::View)
        .count();

    let page = SchemaPage {
        charset: out.charset(),
        schema,
        one_of_multiple_schemas,
        table_count: tables.len().saturating_sub(view_count),
        view_count,
        rows: tables
            .iter()
            .map(|table| PageRow {
                name: &table.name,
                kind: table.kind.label(),
                comment: table.comment.as_deref().unwrap_or_default(),
            })
            .collect(),
        tool_version: env!("CARGO_PKG_VERSION"),
        generated_at: generated_at(),
    };

    let html = page
        .render()
        .map_err(|e| SchemaDocError::render(format!("page for schema '{}'", schema), e))?;
    out.write_str(&html).await
}

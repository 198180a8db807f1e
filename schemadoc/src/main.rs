//! Database schema documentation generator.
//!
//! Documents one schema, or every matching schema of a connection when run
//! with `--all` or `--schemas`.

use anyhow::Context;
use clap::Parser;
use schemadoc_core::error::redact_database_url;
use schemadoc_core::logging::init_logging;
use schemadoc_core::{
    Config, HtmlIndexRenderer, HtmlSchemaAnalyzer, MultiSchemaAnalyzer, SchemaAnalyzer,
    create_metadata_source,
};
use std::ffi::OsString;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_logging(config.verbose, config.quiet)?;

    let database_url = match config.database_url.as_deref() {
        Some(url) => url,
        None => {
            eprintln!("Error: Database URL is required");
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    info!("Target: {}", redact_database_url(database_url));
    let source = create_metadata_source(database_url)
        .context("Failed to create metadata source")?;
    info!("Created {} metadata source", source.database_type());

    let analyzer = HtmlSchemaAnalyzer::new(source.as_ref());

    if config.is_multi_schema() {
        let renderer = HtmlIndexRenderer;
        let original_args: Vec<OsString> = std::env::args_os().skip(1).collect();

        let summary = MultiSchemaAnalyzer::new(source.as_ref(), &analyzer, &renderer)
            .analyze(&config, &original_args)
            .await
            .map_err(|e| {
                error!("Multi-schema run failed: {}", e);
                e
            })?;

        summary.print(config.json)?;
        return Ok(());
    }

    match analyzer.analyze(&config).await? {
        Some(analyzed) => {
            println!(
                "Documented {} tables and {} views of {}",
                analyzed.table_count, analyzed.view_count, analyzed.name
            );
            println!("Output: {}", analyzed.output_dir.join("index.html").display());
            Ok(())
        }
        None => {
            error!("Nothing was documented");
            std::process::exit(1);
        }
    }
}

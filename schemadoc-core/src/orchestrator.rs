//! Multi-schema orchestration.
//!
//! A run resolves its schemas, dispatches one job per schema in list
//! order, writes the landing page and reports. Everything is awaited in
//! turn. A schema that produces nothing (its job arguments do not parse,
//! its name cannot be a directory, or the analyzer returns `None`) is
//! recorded as [`SchemaOutcome::Failed`] and the run carries on; any `Err`
//! from the analyzer aborts the run without touching output already
//! written.
//!
//! Progress lines go to a caller-supplied writer: stdout normally, stderr
//! when the summary is printed as JSON.

use crate::Result;
use crate::analyzer::{AnalyzedSchema, SchemaAnalyzer};
use crate::config::Config;
use crate::discovery::discover;
use crate::error::{SchemaDocError, redact_database_url};
use crate::index::write_index;
use crate::jobs::{PerSchemaJob, RunArgumentTemplate, derive_template, is_valid_output_name};
use crate::metadata::MetadataSource;
use crate::render::IndexRenderer;
use crate::report::{RunSummary, RunTimer};
use serde::Serialize;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

/// What happened to one schema of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SchemaOutcome {
    /// Documentation was written
    Analyzed(AnalyzedSchema),
    /// Nothing was written for this schema
    Failed {
        /// Schema name as resolved by discovery
        schema: String,
    },
}

impl SchemaOutcome {
    /// Name of the schema this outcome is for.
    pub fn schema(&self) -> &str {
        match self {
            Self::Analyzed(analyzed) => &analyzed.name,
            Self::Failed { schema } => schema,
        }
    }

    /// True for [`SchemaOutcome::Failed`].
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Run-wide values every job is derived from.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Database name of the run; selects `--schema` over `--database` for jobs
    pub db_name: Option<String>,
    /// Root output directory; each schema gets a direct child
    pub output_dir: PathBuf,
}

fn progress_line(progress: &mut (dyn Write + Send), line: &str) -> Result<()> {
    writeln!(progress, "{}", line)
        .and_then(|()| progress.flush())
        .map_err(|e| SchemaDocError::io("Failed to write progress", e))
}

/// Runs one job per schema, in order, reporting each to `progress` as it
/// starts.
///
/// # Errors
/// Returns the first error from the analyzer, or an I/O error if progress
/// cannot be written.
pub async fn run_jobs(
    resolved: &[String],
    template: &RunArgumentTemplate,
    context: &RunContext,
    analyzer: &dyn SchemaAnalyzer,
    progress: &mut (dyn Write + Send),
) -> Result<Vec<SchemaOutcome>> {
    let mut outcomes = Vec::with_capacity(resolved.len());

    for schema in resolved {
        progress_line(progress, &format!("Analyzing {}", schema))?;

        let failed = || SchemaOutcome::Failed {
            schema: schema.clone(),
        };

        if !is_valid_output_name(schema) {
            tracing::warn!(
                "Skipping schema '{}': not usable as an output directory name",
                schema
            );
            outcomes.push(failed());
            continue;
        }

        let job = PerSchemaJob::new(
            template,
            schema,
            context.db_name.is_some(),
            &context.output_dir,
        );
        tracing::debug!("Job arguments: {}", redacted_args(&job.args));

        let config = match job.config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Error analysing schema {}: {}", schema, e);
                outcomes.push(failed());
                continue;
            }
        };

        match analyzer.analyze(&config).await? {
            Some(analyzed) => {
                tracing::debug!(
                    "Analyzed '{}': {} tables, {} views",
                    schema,
                    analyzed.table_count,
                    analyzed.view_count
                );
                outcomes.push(SchemaOutcome::Analyzed(analyzed));
            }
            None => {
                tracing::warn!("Error analysing schema {}", schema);
                outcomes.push(failed());
            }
        }
    }

    Ok(outcomes)
}

fn redacted_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| {
            let arg = arg.to_string_lossy();
            if arg.contains("://") {
                redact_database_url(&arg)
            } else {
                arg.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Documents every schema of a connection in one run.
pub struct MultiSchemaAnalyzer<'a> {
    source: &'a dyn MetadataSource,
    analyzer: &'a dyn SchemaAnalyzer,
    renderer: &'a dyn IndexRenderer,
}

impl<'a> MultiSchemaAnalyzer<'a> {
    /// Wires the run to its collaborators; `source` is shared by discovery,
    /// the index page and (through `analyzer`) every job.
    pub fn new(
        source: &'a dyn MetadataSource,
        analyzer: &'a dyn SchemaAnalyzer,
        renderer: &'a dyn IndexRenderer,
    ) -> Self {
        Self {
            source,
            analyzer,
            renderer,
        }
    }

    /// Runs discovery, every per-schema job and the index page, printing
    /// progress to stdout, or to stderr with `--json` so stdout carries
    /// only the summary.
    ///
    /// `original_args` are the run's own arguments without the program
    /// name; per-schema jobs are derived from them.
    ///
    /// # Errors
    /// Returns the first fatal error. No summary is produced in that case.
    pub async fn analyze(&self, config: &Config, original_args: &[OsString]) -> Result<RunSummary> {
        let mut progress: Box<dyn Write + Send> = if config.json {
            Box::new(std::io::stderr())
        } else {
            Box::new(std::io::stdout())
        };
        self.analyze_with_progress(config, original_args, progress.as_mut())
            .await
    }

    /// [`MultiSchemaAnalyzer::analyze`] with progress written to `progress`.
    ///
    /// # Errors
    /// Returns the first fatal error. No summary is produced in that case.
    pub async fn analyze_with_progress(
        &self,
        config: &Config,
        original_args: &[OsString],
        progress: &mut (dyn Write + Send),
    ) -> Result<RunSummary> {
        let timer = RunTimer::start();
        let pattern = config.inclusion_pattern()?;

        if config.schemas.is_none() {
            progress_line(
                progress,
                &format!(
                    "Analyzing schemas that match regular expression '{}':",
                    pattern
                ),
            )?;
            progress_line(progress, "(use --schema-spec to exclude other schemas)")?;
        } else {
            progress_line(progress, "Analyzing schemas:")?;
        }

        let configured_user = config.connection_user();
        let resolved = discover(
            self.source,
            &pattern,
            config.schemas.as_deref(),
            configured_user.as_deref(),
        )
        .await?;

        let listing: String = resolved.iter().map(|schema| format!(" {}", schema)).collect();
        progress_line(progress, &listing)?;

        let template = derive_template(original_args);
        let context = RunContext {
            db_name: config.database_name(),
            output_dir: config.output_dir.clone(),
        };

        let outcomes = run_jobs(&resolved, &template, &context, self.analyzer, progress).await?;

        write_index(
            context.db_name.as_deref(),
            &resolved,
            self.source,
            &context.output_dir,
            &config.charset,
            self.renderer,
        )
        .await?;

        progress_line(progress, "")?;

        let summary = timer.finish(context.output_dir, config.index_path(), outcomes);
        if summary.failed > 0 {
            tracing::warn!(
                "{} of {} schemas produced no documentation",
                summary.failed,
                summary.schema_count
            );
        }
        Ok(summary)
    }
}

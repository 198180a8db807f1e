//! Run timing and the final summary.

use crate::Result;
use crate::error::SchemaDocError;
use crate::orchestrator::SchemaOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

/// Measures a run from start to summary.
#[derive(Debug, Clone, Copy)]
pub struct RunTimer {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl RunTimer {
    /// Starts timing now.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Stops timing and builds the summary of a completed run.
    pub fn finish(
        self,
        output_dir: PathBuf,
        index_path: PathBuf,
        outcomes: Vec<SchemaOutcome>,
    ) -> RunSummary {
        let total_duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let failed = outcomes.iter().filter(|outcome| outcome.is_failed()).count();

        RunSummary {
            started_at: self.started_at,
            schema_count: outcomes.len(),
            total_duration_ms,
            output_dir,
            index_path,
            failed,
            outcomes,
        }
    }
}

/// Outcome of a multi-schema run that did not hit a fatal fault.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Number of schemas processed, failed ones included
    pub schema_count: usize,
    /// Total run time in milliseconds
    pub total_duration_ms: u64,
    /// Root output directory
    pub output_dir: PathBuf,
    /// Landing page linking every schema
    pub index_path: PathBuf,
    /// Number of schemas the analyzer produced nothing for
    pub failed: usize,
    /// Per-schema outcomes in processing order
    pub outcomes: Vec<SchemaOutcome>,
}

impl RunSummary {
    /// Whole seconds elapsed, truncated.
    pub fn elapsed_seconds(&self) -> u64 {
        self.total_duration_ms / 1000
    }

    /// Prints the summary to stdout, as text or pretty JSON.
    ///
    /// # Errors
    /// Returns a serialization error if JSON output fails.
    pub fn print(&self, json: bool) -> Result<()> {
        if json {
            let rendered = serde_json::to_string_pretty(self).map_err(|e| {
                SchemaDocError::Serialization {
                    context: "Failed to serialize run summary".to_string(),
                    source: e,
                }
            })?;
            println!("{}", rendered);
        } else {
            println!("{}", self);
        }
        Ok(())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Wrote relationship details of {} schema{} in {} seconds.",
            self.schema_count,
            if self.schema_count == 1 { "" } else { "s" },
            self.elapsed_seconds()
        )?;
        write!(f, "Start with {}", self.index_path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(schema_count: usize, total_duration_ms: u64) -> RunSummary {
        let outcomes = (0..schema_count)
            .map(|i| SchemaOutcome::Failed {
                schema: format!("s{}", i),
            })
            .collect();
        RunSummary {
            started_at: Utc::now(),
            schema_count,
            total_duration_ms,
            output_dir: PathBuf::from("/out"),
            index_path: PathBuf::from("/out/index.html"),
            failed: schema_count,
            outcomes,
        }
    }

    #[test]
    fn test_display_pluralizes() {
        assert_eq!(
            summary(1, 0).to_string(),
            "Wrote relationship details of 1 schema in 0 seconds.\nStart with /out/index.html"
        );
        assert!(summary(2, 0).to_string().contains("of 2 schemas in"));
        assert!(summary(0, 0).to_string().contains("of 0 schemas in"));
    }

    #[test]
    fn test_elapsed_seconds_truncate() {
        assert_eq!(summary(1, 999).elapsed_seconds(), 0);
        assert_eq!(summary(1, 1999).elapsed_seconds(), 1);
        assert_eq!(summary(1, 61_000).elapsed_seconds(), 61);
    }

    #[test]
    fn test_timer_counts_failures() {
        let outcomes = vec![
            SchemaOutcome::Failed {
                schema: "a".to_string(),
            },
            SchemaOutcome::Analyzed(crate::analyzer::AnalyzedSchema {
                name: "b".to_string(),
                table_count: 1,
                view_count: 0,
                output_dir: PathBuf::from("/out/b"),
            }),
        ];
        let summary = RunTimer::start().finish(
            PathBuf::from("/out"),
            PathBuf::from("/out/index.html"),
            outcomes,
        );

        assert_eq!(summary.schema_count, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_summary_serializes() {
        let value = serde_json::to_value(summary(1, 1500)).unwrap();
        assert_eq!(value["schema_count"], 1);
        assert_eq!(value["total_duration_ms"], 1500);
        assert_eq!(value["outcomes"][0]["status"], "failed");
    }
}

//! Per-schema job arguments.
//!
//! A multi-schema run re-parses a [`Config`] for every schema from the
//! run's own arguments. Run-wide flags that would conflict with the
//! per-schema selection are stripped once into a [`RunArgumentTemplate`],
//! and each [`PerSchemaJob`] appends its own selector and output directory
//! to a fresh copy of it.
//!
//! Flags are recognised from the [`Config`] command definition itself, so
//! every spelling the parser accepts is handled: `-o dir`, `-odir`,
//! `-o=dir`, `--output-dir dir`, `--output-dir=dir` and short clusters
//! such as `-qo dir`.

use crate::Result;
use crate::config::Config;
use clap::CommandFactory;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Argument ids removed wherever they occur.
const STRIPPED_EVERYWHERE: &[&str] = &["all"];
/// Argument ids whose first occurrence is removed together with its value.
const STRIPPED_ONCE: &[&str] = &["output_dir", "schema"];

/// Selector used when the run has no database name.
pub const DATABASE_SELECTOR: &str = "--database";
/// Selector used when the run has a database name.
pub const SCHEMA_SELECTOR: &str = "--schema";
/// Output-directory flag appended to every job.
pub const OUTPUT_DIR_FLAG: &str = "--output-dir";

/// Run arguments with the analyze-all flag, the output directory and the
/// single-schema selection removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgumentTemplate {
    args: Vec<OsString>,
}

impl RunArgumentTemplate {
    /// Remaining arguments, in their original order.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// Builds the shared job template from the run's arguments.
///
/// `original_args` excludes the program name and is left untouched.
/// Tokens that are not valid UTF-8 are never flags of ours and are kept
/// verbatim.
pub fn derive_template(original_args: &[OsString]) -> RunArgumentTemplate {
    let command = Config::command();
    let mut pending: Vec<&str> = STRIPPED_ONCE.to_vec();
    let mut args = Vec::with_capacity(original_args.len());
    let mut tokens = original_args.iter();

    while let Some(token) = tokens.next() {
        let Some(text) = token.to_str() else {
            args.push(token.clone());
            continue;
        };

        if text == "--" {
            args.push(token.clone());
            args.extend(tokens.by_ref().cloned());
            break;
        }

        // Some(strip) when the flag's value is the next token.
        let mut value_follows = None;

        if let Some(long) = text.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let Some(arg) = command.get_arguments().find(|arg| arg.get_long() == Some(name)) else {
                args.push(token.clone());
                continue;
            };

            let strip = should_strip(arg.get_id().as_str(), &mut pending);
            if !strip {
                args.push(token.clone());
            }
            if arg.get_action().takes_values() && inline.is_none() {
                value_follows = Some(strip);
            }
        } else if let Some(cluster) = text.strip_prefix('-').filter(|c| !c.is_empty()) {
            let mut kept = String::from("-");

            for (offset, flag) in cluster.char_indices() {
                let Some(arg) = command.get_arguments().find(|arg| arg.get_short() == Some(flag))
                else {
                    kept.push_str(&cluster[offset..]);
                    break;
                };

                let strip = should_strip(arg.get_id().as_str(), &mut pending);
                if !arg.get_action().takes_values() {
                    if !strip {
                        kept.push(flag);
                    }
                    continue;
                }

                // The rest of the cluster, if any, is the value.
                let attached = &cluster[offset + flag.len_utf8()..];
                if !strip {
                    kept.push(flag);
                    kept.push_str(attached);
                }
                if attached.is_empty() {
                    value_follows = Some(strip);
                }
                break;
            }

            if kept.len() > 1 {
                args.push(OsString::from(kept));
            }
        } else {
            args.push(token.clone());
        }

        if let Some(strip) = value_follows
            && let Some(value) = tokens.next()
            && !strip
        {
            args.push(value.clone());
        }
    }

    RunArgumentTemplate { args }
}

/// Whether an occurrence of argument `id` is dropped from the template.
fn should_strip(id: &str, pending: &mut Vec<&str>) -> bool {
    if STRIPPED_EVERYWHERE.contains(&id) {
        return true;
    }
    match pending.iter().position(|pending_id| *pending_id == id) {
        Some(index) => {
            pending.remove(index);
            true
        }
        None => false,
    }
}

/// `--flag=value` as a single token, so values starting with `-` are
/// never read as flags.
fn joined(flag: &str, value: &OsStr) -> OsString {
    let mut token = OsString::from(flag);
    token.push("=");
    token.push(value);
    token
}

/// Arguments for documenting exactly one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerSchemaJob {
    /// Schema this job documents
    pub schema: String,
    /// Output directory, a direct child of the run's output directory
    pub output_dir: PathBuf,
    /// Full argument list, excluding the program name
    pub args: Vec<OsString>,
}

impl PerSchemaJob {
    /// Builds the job for `schema`.
    ///
    /// Without a run-level database name the schema is selected as the
    /// database (`--database`), otherwise as a schema within it
    /// (`--schema`).
    pub fn new(
        template: &RunArgumentTemplate,
        schema: &str,
        has_database_name: bool,
        run_output_dir: &Path,
    ) -> Self {
        let output_dir = run_output_dir.join(schema);
        let selector = if has_database_name {
            SCHEMA_SELECTOR
        } else {
            DATABASE_SELECTOR
        };

        let mut args = template.args().to_vec();
        args.push(joined(selector, OsStr::new(schema)));
        args.push(joined(OUTPUT_DIR_FLAG, output_dir.as_os_str()));

        Self {
            schema: schema.to_string(),
            output_dir,
            args,
        }
    }

    /// Parses the job's configuration and flags it as part of a
    /// multi-schema run.
    ///
    /// # Errors
    /// Returns a configuration error if the job arguments do not parse.
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::from_args(&self.args)?;
        config.one_of_multiple_schemas = true;
        Ok(config)
    }
}

/// Whether `schema` can name a direct child of the output directory.
pub fn is_valid_output_name(schema: &str) -> bool {
    !schema.is_empty()
        && schema != "."
        && schema != ".."
        && !schema.contains('/')
        && !schema.contains('\\')
        && !schema.contains('\0')
}

//! Command-line configuration shared by the run and by every per-schema job.
//!
//! The same [`Config`] type is parsed twice in a multi-schema run: once from
//! the process arguments, and once per schema from the derived job
//! arguments (see [`crate::jobs`]). Only the latter sets
//! [`Config::one_of_multiple_schemas`].

use crate::Result;
use crate::discovery::InclusionPattern;
use crate::error::SchemaDocError;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Name used as `argv[0]` when parsing job arguments.
const PROGRAM_NAME: &str = "schemadoc";

/// File name of the top-level page in every output directory.
pub const INDEX_FILE_NAME: &str = "index.html";

/// Parsed command-line configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "schemadoc")]
#[command(about = "Database schema documentation generator")]
#[command(version)]
#[command(long_about = "
schemadoc - HTML documentation for database schemas

Documents a single schema, or every populated schema on a connection that
matches a regular expression, writing one site per schema plus a landing
page that links them together.

EXAMPLES:
  schemadoc --database-url postgres://user@localhost/app -s public -o docs
  schemadoc --database-url postgres://user@localhost/app --all --schema-spec 'app_.*' -o docs
  schemadoc --database-url mysql://user@localhost --schemas sales,billing -o docs
")]
pub struct Config {
    /// Database connection URL
    #[arg(
        long,
        env = "DATABASE_URL",
        help = "Database connection string (credentials will be sanitized in logs)"
    )]
    pub database_url: Option<String>,

    /// Database name
    #[arg(short = 'd', long, help = "Database name (schema is treated as the database)")]
    pub database: Option<String>,

    /// Single schema to document
    #[arg(short = 's', long, help = "Schema to document")]
    pub schema: Option<String>,

    /// Connection user
    #[arg(short = 'u', long, help = "Connection user name")]
    pub user: Option<String>,

    /// Output directory
    #[arg(
        short = 'o',
        long = "output-dir",
        default_value = "schemadoc-output",
        help = "Directory the generated documentation is written to"
    )]
    pub output_dir: PathBuf,

    /// Document all matching schemas
    #[arg(long, help = "Document every populated schema matching --schema-spec")]
    pub all: bool,

    /// Inclusion pattern for --all
    #[arg(
        long,
        default_value = ".*",
        help = "Regular expression a schema name must fully match to be documented"
    )]
    pub schema_spec: String,

    /// Explicit schema list
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated list of schemas to document (no pattern filtering)"
    )]
    pub schemas: Option<Vec<String>>,

    /// Output character set
    #[arg(long, default_value = "UTF-8", help = "Character set of generated pages")]
    pub charset: String,

    /// Print the run summary as JSON
    #[arg(long, help = "Print the run summary as JSON")]
    pub json: bool,

    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all log output except errors")]
    pub quiet: bool,

    /// Set on per-schema configurations built during a multi-schema run
    #[arg(skip)]
    pub one_of_multiple_schemas: bool,
}

impl Config {
    /// Parses a configuration from arguments that exclude the program name.
    ///
    /// # Errors
    /// Returns a configuration error if the arguments are rejected by the parser.
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv = std::iter::once(OsString::from(PROGRAM_NAME))
            .chain(args.into_iter().map(Into::into));
        Self::try_parse_from(argv)
            .map_err(|e| SchemaDocError::configuration(format!("Invalid arguments: {}", e)))
    }

    /// Whether this run documents more than one schema.
    pub fn is_multi_schema(&self) -> bool {
        self.all || self.schemas.is_some()
    }

    /// Database name from `--database`, else the path of the connection URL.
    pub fn database_name(&self) -> Option<String> {
        if let Some(database) = &self.database {
            return Some(database.clone());
        }

        let url = url::Url::parse(self.database_url.as_deref()?).ok()?;
        let database = url.path().trim_start_matches('/');
        (!database.is_empty()).then(|| database.to_string())
    }

    /// Connection user from `--user`, else the user of the connection URL.
    pub fn connection_user(&self) -> Option<String> {
        if let Some(user) = &self.user {
            return Some(user.clone());
        }

        let url = url::Url::parse(self.database_url.as_deref()?).ok()?;
        let user = url.username();
        (!user.is_empty()).then(|| user.to_string())
    }

    /// Compiles `--schema-spec` into an inclusion pattern.
    ///
    /// # Errors
    /// Returns a configuration error for an invalid regular expression.
    pub fn inclusion_pattern(&self) -> Result<InclusionPattern> {
        InclusionPattern::new(&self.schema_spec)
    }

    /// Path of the landing page for this configuration's output directory.
    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(INDEX_FILE_NAME)
    }

    /// Returns the connection URL or a configuration error when none was given.
    ///
    /// # Errors
    /// Returns a configuration error if neither `--database-url` nor
    /// `DATABASE_URL` supplied one.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            SchemaDocError::configuration(
                "Database URL is required (use --database-url or DATABASE_URL)",
            )
        })
    }
}

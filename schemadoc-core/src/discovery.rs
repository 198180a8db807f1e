//! Schema discovery: which namespaces a multi-schema run documents.
//!
//! Resolution order, stopping at the first non-empty result:
//! 1. an explicit list from the caller, used verbatim;
//! 2. populated schemas matching the inclusion pattern;
//! 3. populated catalogs matching the inclusion pattern;
//! 4. the connection user, on its own (asked of the source only when the
//!    configuration does not name one).
//!
//! Steps 2 and 3 are skipped when the metadata source reports that table
//! definitions cannot be qualified by schema (or catalog) respectively.

use crate::Result;
use crate::error::SchemaDocError;
use crate::metadata::MetadataSource;
use regex::Regex;

/// Regular expression a namespace name must match in full.
#[derive(Debug, Clone)]
pub struct InclusionPattern {
    source: String,
    anchored: Regex,
}

impl InclusionPattern {
    /// Compiles `pattern` for full-string matching.
    ///
    /// # Errors
    /// Returns a configuration error if `pattern` is not a valid regular
    /// expression.
    pub fn new(pattern: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            SchemaDocError::configuration(format!("Invalid schema pattern '{}': {}", pattern, e))
        })?;

        Ok(Self {
            source: pattern.to_string(),
            anchored,
        })
    }

    /// Whether `name` matches the whole pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.anchored.is_match(name)
    }

    /// The pattern as supplied by the caller.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for InclusionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Which namespace level a candidate list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceLevel {
    /// Schema-qualified table definitions
    Schema,
    /// Catalog-qualified table definitions
    Catalog,
}

impl std::fmt::Display for NamespaceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Catalog => write!(f, "catalog"),
        }
    }
}

/// Resolves the list of namespaces to document.
///
/// `explicit` short-circuits everything, including the database round-trip.
/// Otherwise the fallback chain described in the module docs applies and
/// the result is never empty.
///
/// # Errors
/// Propagates metadata source faults unchanged.
pub async fn discover(
    source: &dyn MetadataSource,
    pattern: &InclusionPattern,
    explicit: Option<&[String]>,
    configured_user: Option<&str>,
) -> Result<Vec<String>> {
    if let Some(schemas) = explicit {
        tracing::debug!("Using {} explicitly listed schemas", schemas.len());
        return Ok(schemas.to_vec());
    }

    let schemas = populated_matching(source, pattern, NamespaceLevel::Schema).await?;
    if !schemas.is_empty() {
        return Ok(schemas);
    }

    let catalogs = populated_matching(source, pattern, NamespaceLevel::Catalog).await?;
    if !catalogs.is_empty() {
        return Ok(catalogs);
    }

    let user = match configured_user {
        Some(user) => user.to_string(),
        None => source.connection_user().await?,
    };

    tracing::info!(
        "No populated schemas or catalogs match '{}', falling back to user '{}'",
        pattern,
        user
    );
    Ok(vec![user])
}

/// Populated namespaces at `level` that match `pattern`, in source order.
///
/// Returns an empty list without querying when the source does not qualify
/// table definitions at that level.
///
/// # Errors
/// Propagates metadata source faults unchanged.
pub async fn populated_matching(
    source: &dyn MetadataSource,
    pattern: &InclusionPattern,
    level: NamespaceLevel,
) -> Result<Vec<String>> {
    let candidates = match level {
        NamespaceLevel::Schema if source.supports_schemas_in_table_definitions() => {
            source.populated_schemas().await?
        }
        NamespaceLevel::Catalog if source.supports_catalogs_in_table_definitions() => {
            source.populated_catalogs().await?
        }
        _ => {
            tracing::debug!(
                "{} does not qualify tables by {}, skipping",
                source.database_type(),
                level
            );
            return Ok(Vec::new());
        }
    };

    Ok(filter_candidates(candidates, pattern, level))
}

/// Keeps the candidates that fully match `pattern`, preserving order.
pub fn filter_candidates(
    candidates: Vec<String>,
    pattern: &InclusionPattern,
    level: NamespaceLevel,
) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|name| {
            let included = pattern.matches(name);
            if included {
                tracing::debug!("Including {} {}: matches \"{}\"", level, name, pattern);
            } else {
                tracing::debug!("Excluding {} {}: doesn't match \"{}\"", level, name, pattern);
            }
            included
        })
        .collect()
}

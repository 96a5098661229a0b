//! Agent-trace extraction module.
//!
//! The reasoning agent answers a question through a sequence of tool
//! invocations, some of which carry executable statements. This module
//! deterministically selects the one statement that represents the
//! authoritative answer, or determines that none exists.
//!
//! Selection policy: among invocations of the configured query tools,
//! data-bearing statements beat schema-exploration statements, and
//! within each kind the last one in trace order wins. The agent
//! iteratively corrects earlier mistakes, so later steps are the most
//! refined. "Last in trace order" is the only tie-break; nothing about
//! the statement text itself (length, shape) influences selection.

use serde::{Deserialize, Serialize};

/// Tool names whose invocations carry executable statements, as emitted
/// by the agent frameworks this service has been run against. The set
/// is an external contract and can be overridden in configuration.
pub const DEFAULT_QUERY_TOOLS: [&str; 4] = [
    "sql_db_query",
    "sql_db_query_checker",
    "query_sql_db",
    "query_sql_database",
];

/// One recorded tool invocation from an agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the invoked tool.
    pub tool_name: String,
    /// The input the agent passed to the tool. For query tools this is
    /// the statement text.
    pub tool_input: String,
    /// Whatever the tool returned, kept opaque.
    pub tool_output: String,
}

impl ToolInvocation {
    /// Creates a new invocation record.
    pub fn new(
        tool_name: impl Into<String>,
        tool_input: impl Into<String>,
        tool_output: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_input: tool_input.into(),
            tool_output: tool_output.into(),
        }
    }
}

/// An ordered agent trace. Owned by the request; never persisted.
pub type Trace = Vec<ToolInvocation>;

/// Outcome of extracting a statement from a trace.
///
/// A tagged outcome rather than a bare `Option`: an introspection
/// fallback and a data hit are both "a statement was found", but the
/// caller annotates them differently.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A data-bearing statement was selected.
    Data {
        /// The statement text, verbatim from the tool input.
        statement: String,
        /// Zero-based index of the invocation within the full trace.
        step_index: usize,
        /// How many introspection candidates occurred anywhere in the
        /// trace and were passed over.
        skipped_introspection: usize,
    },
    /// Only schema-exploration statements were found; the last one is
    /// returned as a fallback (the caller may have asked a
    /// schema-discovery question).
    Introspection {
        /// The statement text, verbatim from the tool input.
        statement: String,
        /// Zero-based index of the invocation within the full trace.
        step_index: usize,
    },
    /// No candidate statement of either kind. The caller falls back to
    /// the agent's own natural-language answer.
    Empty,
}

impl Extraction {
    /// The selected statement, if any.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Data { statement, .. } | Self::Introspection { statement, .. } => {
                Some(statement)
            }
            Self::Empty => None,
        }
    }

    /// Zero-based trace index of the selected statement, if any.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::Data { step_index, .. } | Self::Introspection { step_index, .. } => {
                Some(*step_index)
            }
            Self::Empty => None,
        }
    }

    /// Number of introspection candidates passed over in favor of a
    /// data candidate. Zero unless this is a `Data` outcome.
    pub fn skipped_introspection(&self) -> usize {
        match self {
            Self::Data {
                skipped_introspection,
                ..
            } => *skipped_introspection,
            _ => 0,
        }
    }
}

/// Selects the authoritative statement from an agent trace.
///
/// Pure function over its inputs; no I/O. Invocations whose tool name
/// is not in `query_tools`, or whose input is blank, are not
/// candidates. Candidates referencing the metadata catalog are
/// introspection; the rest are data. Last-in-trace-order wins within
/// each partition, data preferred over introspection.
pub fn extract(trace: &[ToolInvocation], query_tools: &[String]) -> Extraction {
    let mut last_data: Option<(usize, &str)> = None;
    let mut last_introspection: Option<(usize, &str)> = None;
    let mut introspection_count = 0usize;

    for (index, invocation) in trace.iter().enumerate() {
        if !query_tools.iter().any(|name| name == &invocation.tool_name) {
            continue;
        }
        if invocation.tool_input.trim().is_empty() {
            continue;
        }
        if references_metadata_catalog(&invocation.tool_input) {
            introspection_count += 1;
            last_introspection = Some((index, invocation.tool_input.as_str()));
        } else {
            last_data = Some((index, invocation.tool_input.as_str()));
        }
    }

    match (last_data, last_introspection) {
        (Some((step_index, statement)), _) => Extraction::Data {
            statement: statement.to_string(),
            step_index,
            skipped_introspection: introspection_count,
        },
        (None, Some((step_index, statement))) => Extraction::Introspection {
            statement: statement.to_string(),
            step_index,
        },
        (None, None) => Extraction::Empty,
    }
}

/// True when the statement targets schema metadata rather than user
/// data: `information_schema` or `pg_catalog` references, `pg_`-prefixed
/// system relations, or `SHOW`/`DESCRIBE` forms from other dialects.
fn references_metadata_catalog(statement: &str) -> bool {
    let lowered = statement.trim().to_ascii_lowercase();

    if lowered.starts_with("show ")
        || lowered.starts_with("describe ")
        || lowered.starts_with("desc ")
    {
        return true;
    }
    if lowered.contains("information_schema") || lowered.contains("pg_catalog") {
        return true;
    }

    // Any standalone word starting with pg_ (pg_tables, pg_class, ...).
    let mut word_start = true;
    for (i, c) in lowered.char_indices() {
        if word_start && lowered[i..].starts_with("pg_") {
            return true;
        }
        word_start = !(c.is_ascii_alphanumeric() || c == '_');
    }

    false
}

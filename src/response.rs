//! The API response envelope.
//!
//! Every endpoint that runs or rejects a statement answers with the
//! same six-field envelope: `success`, `sql`, `results`, `count`,
//! `error`, `note`. The front end keys off this shape, so all fields
//! are always serialized, with `null` standing in for the ones that do
//! not apply. Construction is pure; nothing here touches the database
//! or the agent.

use serde::{Deserialize, Serialize};

use crate::db::QueryResult;
use crate::safety::RejectReason;

/// The envelope returned by the query endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the request produced a usable answer.
    pub success: bool,

    /// The statement that was executed or rejected, when one exists.
    pub sql: Option<String>,

    /// Result rows as objects keyed by column name. Empty on failure.
    pub results: Vec<serde_json::Map<String, serde_json::Value>>,

    /// Number of rows in `results`.
    pub count: usize,

    /// Error message when `success` is false.
    pub error: Option<String>,

    /// Advisory note: truncation, extraction provenance, or the
    /// agent's own answer when no statement was extracted.
    pub note: Option<String>,
}

impl ApiResponse {
    /// Builds the envelope for a successfully executed statement.
    ///
    /// Carries a truncation note when the row cap reduced the result.
    pub fn executed(sql: &str, result: &QueryResult) -> Self {
        let results = result.to_records();
        let count = results.len();
        Self {
            success: true,
            sql: Some(sql.to_string()),
            results,
            count,
            error: None,
            note: result.truncation_note(),
        }
    }

    /// Builds the envelope for a statement the validator rejected.
    pub fn rejected(sql: &str, reason: &RejectReason) -> Self {
        Self {
            success: false,
            sql: Some(sql.to_string()),
            results: Vec::new(),
            count: 0,
            error: Some(reason.message()),
            note: None,
        }
    }

    /// Builds the envelope for a statement the database refused.
    ///
    /// The driver's message is passed through verbatim.
    pub fn execution_failed(sql: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            sql: Some(sql.to_string()),
            results: Vec::new(),
            count: 0,
            error: Some(message.into()),
            note: None,
        }
    }

    /// Builds the envelope for a question the agent answered without
    /// producing any statement.
    ///
    /// This is a success: the caller gets the agent's own answer in
    /// `note` rather than a hard failure.
    pub fn answer_only(answer: &str) -> Self {
        Self {
            success: true,
            sql: None,
            results: Vec::new(),
            count: 0,
            error: None,
            note: Some(answer.to_string()),
        }
    }

    /// Builds a bare failure envelope with no statement attached.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            sql: None,
            results: Vec::new(),
            count: 0,
            error: Some(message.into()),
            note: None,
        }
    }

    /// Builds the envelope for an agent failure (timeout, iteration
    /// cap, API error).
    pub fn agent_failed(message: &str) -> Self {
        Self {
            success: false,
            sql: None,
            results: Vec::new(),
            count: 0,
            error: Some(format!(
                "Error processing question: {}. Try rephrasing it or submit the SQL directly.",
                message
            )),
            note: None,
        }
    }

    /// Prepends a note to the envelope, keeping any existing note
    /// after it.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = Some(match self.note {
            Some(existing) => format!("{} {}", note, existing),
            None => note,
        });
        self
    }
}

/// Describes where in the agent trace the executed statement came
/// from. `step_index` is zero-based; the note renders it one-based.
pub fn provenance_note(step_index: usize, skipped_introspection: usize) -> String {
    let step = step_index + 1;
    match skipped_introspection {
        0 => format!("Query taken from step {} of the agent trace.", step),
        1 => format!(
            "Query taken from step {} of the agent trace; 1 schema-lookup step was skipped.",
            step
        ),
        n => format!(
            "Query taken from step {} of the agent trace; {} schema-lookup steps were skipped.",
            step, n
        ),
    }
}

/// Notes that the trace held no data query and a schema query was
/// executed instead.
pub fn introspection_fallback_note(step_index: usize) -> String {
    format!(
        "No data query found in the agent trace; ran the schema query from step {} instead.",
        step_index + 1
    )
}

//! Statement validation module.
//!
//! Classifies arbitrary query text as an allowed single-statement read
//! or rejects it with a specific reason. This is the gate every
//! statement passes before it may reach the database, whether the text
//! came straight from a caller or was extracted from an agent trace.
//!
//! The check is purely lexical: comments are stripped, statements are
//! split on semicolons outside string literals, and a fixed set of
//! mutating keywords is matched as whole tokens. Full SQL parsing is
//! deliberately avoided; the database itself remains the authority on
//! syntax.

mod lexer;

pub use lexer::has_explicit_limit;

/// Keywords that indicate a mutating or administrative operation.
///
/// Matched as whole tokens bounded by non-identifier characters,
/// case-insensitively, anywhere in the statement. The set is closed:
/// tokens outside it never reject on their own.
pub const FORBIDDEN_KEYWORDS: [&str; 15] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "TRUNCATE", "CREATE", "REPLACE", "GRANT",
    "REVOKE", "EXEC", "EXECUTE", "CALL", "MERGE", "LOCK",
];

/// Why a statement was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The text was empty, whitespace-only, or comments-only.
    Empty,
    /// The single statement does not begin with SELECT or WITH.
    NotARead,
    /// More than one statement separated by semicolons.
    MultipleStatements,
    /// A forbidden keyword occurred as a whole token; carries the
    /// canonical uppercase keyword.
    ForbiddenKeyword(String),
}

impl RejectReason {
    /// The fixed user-facing message for this rejection.
    ///
    /// These literal strings are consumed by the dashboard front end;
    /// their shape must not change.
    pub fn message(&self) -> String {
        match self {
            Self::Empty => "Query cannot be empty".to_string(),
            Self::NotARead => {
                "Only SELECT queries are allowed. Query must start with SELECT.".to_string()
            }
            Self::MultipleStatements => {
                "Multiple statements are not allowed. Only single SELECT queries are permitted."
                    .to_string()
            }
            Self::ForbiddenKeyword(keyword) => {
                format!("Operation '{keyword}' is not allowed. Only SELECT queries are permitted.")
            }
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::NotARead => write!(f, "not a read"),
            Self::MultipleStatements => write!(f, "multiple statements"),
            Self::ForbiddenKeyword(keyword) => write!(f, "forbidden keyword {keyword}"),
        }
    }
}

/// Outcome of validating one piece of query text.
///
/// Produced fresh on every call and never cached: the same text always
/// classifies identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// A single, read-only statement that may be executed.
    Allowed,
    /// The text must not reach the database.
    Rejected(RejectReason),
}

impl ValidationResult {
    /// Returns true if the statement may be executed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns the rejection reason, if any.
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Allowed => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

/// Classifies query text as an allowed read or a rejection.
///
/// Pure function of its input: no I/O, no shared state, deterministic,
/// and it never fails; every input maps to a [`ValidationResult`].
///
/// Checks, in order: emptiness (after trimming, with comments ignored),
/// statement count (semicolons outside string literals), forbidden
/// keywords as whole tokens anywhere in the statement, and finally the
/// leading keyword, which must be `SELECT` or `WITH`. The forbidden
/// scan runs before the leading-keyword check so that `DELETE FROM x`
/// reports the operation by name rather than a generic not-a-SELECT
/// message.
pub fn validate(text: &str) -> ValidationResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ValidationResult::Rejected(RejectReason::Empty);
    }

    let stripped = lexer::strip_comments(trimmed);
    let segments = lexer::split_statements(&stripped);

    if segments.is_empty() {
        return ValidationResult::Rejected(RejectReason::Empty);
    }
    if segments.len() > 1 {
        return ValidationResult::Rejected(RejectReason::MultipleStatements);
    }

    let segment = &segments[0];
    if let Some(keyword) = lexer::find_keyword(segment, &FORBIDDEN_KEYWORDS) {
        return ValidationResult::Rejected(RejectReason::ForbiddenKeyword(keyword.to_string()));
    }

    match lexer::leading_keyword(segment).as_deref() {
        Some("SELECT") | Some("WITH") => ValidationResult::Allowed,
        _ => ValidationResult::Rejected(RejectReason::NotARead),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_allowed(sql: &str) {
        assert_eq!(
            validate(sql),
            ValidationResult::Allowed,
            "expected Allowed for: {sql}"
        );
    }

    fn assert_rejected(sql: &str, reason: RejectReason) {
        assert_eq!(
            validate(sql),
            ValidationResult::Rejected(reason),
            "unexpected classification for: {sql}"
        );
    }

    #[test]
    fn test_simple_select_allowed() {
        assert_allowed("SELECT * FROM loan_accounts");
        assert_allowed("select id, amount from disbursements where amount > 1000");
    }

    #[test]
    fn test_trailing_semicolon_allowed() {
        assert_allowed("SELECT 1;");
    }

    #[test]
    fn test_cte_allowed() {
        assert_allowed(
            "WITH totals AS (SELECT branch_id, SUM(amount) s FROM repayments GROUP BY branch_id) \
             SELECT * FROM totals ORDER BY s DESC",
        );
    }

    #[test]
    fn test_parenthesized_select_allowed() {
        assert_allowed("(SELECT 1)");
        assert_allowed("  ( (SELECT 1) UNION (SELECT 2) )");
    }

    #[test]
    fn test_empty_rejected() {
        assert_rejected("", RejectReason::Empty);
        assert_rejected("   \n\t  ", RejectReason::Empty);
    }

    #[test]
    fn test_comment_only_rejected_as_empty() {
        assert_rejected("-- nothing here", RejectReason::Empty);
        assert_rejected("/* still nothing */", RejectReason::Empty);
    }

    #[test]
    fn test_multiple_statements_rejected() {
        assert_rejected("SELECT 1; DROP TABLE x", RejectReason::MultipleStatements);
        assert_rejected(
            "SELECT 1; SELECT 2",
            RejectReason::MultipleStatements,
        );
    }

    #[test]
    fn test_semicolon_inside_literal_is_single_statement() {
        assert_allowed("SELECT ';' AS separator FROM loans");
    }

    #[test]
    fn test_forbidden_keyword_direct() {
        assert_rejected(
            "DELETE FROM test",
            RejectReason::ForbiddenKeyword("DELETE".to_string()),
        );
        assert_rejected(
            "drop table loans",
            RejectReason::ForbiddenKeyword("DROP".to_string()),
        );
    }

    #[test]
    fn test_forbidden_keyword_in_subquery() {
        assert_rejected(
            "SELECT * FROM t WHERE id IN (DELETE FROM u RETURNING id)",
            RejectReason::ForbiddenKeyword("DELETE".to_string()),
        );
    }

    #[test]
    fn test_forbidden_keyword_in_cte_body() {
        assert_rejected(
            "WITH x AS (INSERT INTO audit VALUES (1) RETURNING *) SELECT * FROM x",
            RejectReason::ForbiddenKeyword("INSERT".to_string()),
        );
    }

    #[test]
    fn test_every_forbidden_keyword_rejects() {
        for keyword in FORBIDDEN_KEYWORDS {
            let sql = format!("SELECT 1 FROM t WHERE {} = 1", keyword.to_lowercase());
            assert_rejected(
                &sql,
                RejectReason::ForbiddenKeyword(keyword.to_string()),
            );
        }
    }

    #[test]
    fn test_identifier_containing_keyword_allowed() {
        // Substring false-positive regression: column names that merely
        // contain a forbidden keyword must pass.
        assert_allowed("SELECT deleted_at, created_by FROM loans WHERE deleted_at IS NULL");
        assert_allowed("SELECT update_count FROM sync_status");
        assert_allowed("SELECT * FROM grants_received");
    }

    #[test]
    fn test_tokens_outside_fixed_set_allowed() {
        // The forbidden set is closed; LOAD and COPY are not members.
        assert_allowed("SELECT load, copy FROM staging_metrics");
    }

    #[test]
    fn test_keyword_inside_comment_ignored() {
        assert_allowed("SELECT 1 -- DROP TABLE x");
        assert_allowed("SELECT /* DELETE FROM t */ 1");
    }

    #[test]
    fn test_comment_cannot_hide_second_statement() {
        // The semicolon lives inside the comment, which is stripped
        // wholesale, leaving a single clean statement.
        assert_allowed("SELECT 1 /* ; DROP TABLE x */");
    }

    #[test]
    fn test_non_select_reads_rejected() {
        assert_rejected("EXPLAIN SELECT 1", RejectReason::NotARead);
        assert_rejected("SHOW TABLES", RejectReason::NotARead);
        assert_rejected("VACUUM FULL", RejectReason::NotARead);
    }

    #[test]
    fn test_forbidden_keyword_wins_over_not_a_read() {
        // A mutating statement names the operation instead of falling
        // through to the generic must-start-with-SELECT message.
        assert_rejected(
            "UPDATE loans SET status = 'CLOSED'",
            RejectReason::ForbiddenKeyword("UPDATE".to_string()),
        );
    }

    #[test]
    fn test_validate_is_idempotent() {
        let samples = [
            "SELECT * FROM loans",
            "DELETE FROM loans",
            "SELECT 1; SELECT 2",
            "",
        ];
        for sql in samples {
            assert_eq!(validate(sql), validate(sql), "diverged for: {sql}");
        }
    }

    #[test]
    fn test_rejection_messages_are_fixed() {
        assert_eq!(
            RejectReason::ForbiddenKeyword("DELETE".to_string()).message(),
            "Operation 'DELETE' is not allowed. Only SELECT queries are permitted."
        );
        assert_eq!(
            RejectReason::NotARead.message(),
            "Only SELECT queries are allowed. Query must start with SELECT."
        );
        assert_eq!(
            RejectReason::MultipleStatements.message(),
            "Multiple statements are not allowed. Only single SELECT queries are permitted."
        );
        assert_eq!(RejectReason::Empty.message(), "Query cannot be empty");
    }
}

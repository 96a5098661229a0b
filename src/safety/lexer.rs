//! Lexical SQL text machinery for the statement validator.
//!
//! No SQL parsing happens here. The validator works on the raw text:
//! comments are stripped, statements are split on semicolons that fall
//! outside string literals, and keywords are matched as whole tokens
//! bounded by non-identifier characters.

/// Strips SQL comments from query text.
///
/// Handles line comments (`--` to end of line) and block comments
/// (`/* ... */`). Comment markers inside string literals are preserved,
/// so `SELECT '--x'` keeps its literal intact. Line comments keep their
/// terminating newline; block comments are replaced with a single space
/// so adjacent tokens stay separated.
pub fn strip_comments(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                result.push(ch);
                copy_string_literal(&mut chars, &mut result, ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                result.push(' ');
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Splits query text on semicolons that occur outside string literals.
///
/// Returns the non-empty segments, trimmed. A trailing semicolon after a
/// single statement therefore does not count as a second statement.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                current.push(ch);
                copy_string_literal(&mut chars, &mut current, ch);
            }
            ';' => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Returns the leading keyword of a statement segment, uppercased.
///
/// Leading whitespace and opening parentheses are skipped, so a
/// parenthesized query form like `(SELECT ...)` is identified by its
/// inner keyword. Returns `None` if the segment starts with anything
/// other than an identifier.
pub fn leading_keyword(segment: &str) -> Option<String> {
    let rest = segment.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
    let token: String = rest
        .chars()
        .take_while(|c| is_identifier_char(*c))
        .collect();
    if token.is_empty() {
        None
    } else {
        Some(token.to_ascii_uppercase())
    }
}

/// Scans text for the first whole-token occurrence of any of the given
/// keywords, case-insensitively. Returns the canonical (uppercase)
/// keyword from the list.
///
/// String-literal contents are scanned too: a forbidden keyword smuggled
/// into a literal still rejects, which errs on the side of refusing to
/// execute. Identifiers merely containing a keyword (`deleted_at`,
/// `created_by`) do not match, since tokens are bounded by
/// non-identifier characters.
pub fn find_keyword<'a>(text: &str, keywords: &[&'a str]) -> Option<&'a str> {
    scan_tokens(text, true, |token| {
        keywords
            .iter()
            .find(|kw| token.eq_ignore_ascii_case(kw))
            .copied()
    })
}

/// Returns true when the statement carries its own `LIMIT` clause as a
/// whole token outside comments and string literals. Used by the
/// executor to decide whether the row cap needs to be applied.
pub fn has_explicit_limit(sql: &str) -> bool {
    let stripped = strip_comments(sql);
    scan_tokens(&stripped, false, |token| {
        token.eq_ignore_ascii_case("LIMIT").then_some(())
    })
    .is_some()
}

/// Walks the maximal identifier-character runs of `text`, invoking `f`
/// on each and returning its first `Some`. When `include_literals` is
/// false, string-literal contents are skipped entirely.
fn scan_tokens<T>(
    text: &str,
    include_literals: bool,
    f: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let mut chars = text.chars().peekable();
    let mut token = String::new();

    while let Some(ch) = chars.next() {
        if !include_literals && (ch == '\'' || ch == '"') {
            if let Some(found) = flush_token(&mut token, &f) {
                return Some(found);
            }
            let mut sink = String::new();
            copy_string_literal(&mut chars, &mut sink, ch);
            continue;
        }
        if is_identifier_char(ch) {
            token.push(ch);
        } else if let Some(found) = flush_token(&mut token, &f) {
            return Some(found);
        }
    }
    flush_token(&mut token, &f)
}

fn flush_token<T>(token: &mut String, f: &impl Fn(&str) -> Option<T>) -> Option<T> {
    if token.is_empty() {
        return None;
    }
    let result = f(token);
    token.clear();
    result
}

/// Copies a string literal body (after the opening quote) into `out`,
/// consuming up to and including the closing quote. Doubled quotes are
/// the escape form (`'it''s'`, `"a""b"`) and stay inside the literal.
fn copy_string_literal(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    out: &mut String,
    quote: char,
) {
    while let Some(ch) = chars.next() {
        out.push(ch);
        if ch == quote {
            if chars.peek() == Some(&quote) {
                out.push(quote);
                chars.next();
            } else {
                return;
            }
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

//! Read-only query guard.
//!
//! This is a textual allowlist, not a SQL parser: a query is accepted when it
//! starts with the `SELECT` keyword. Statements that only look like a SELECT
//! are not caught.

const SELECT_KEYWORD: &str = "SELECT";

/// Return the query unchanged if it is an allowed read query.
///
/// Accepted iff, after leading whitespace, the text starts with `SELECT`
/// (any case) followed by the end of the text or a non-word character.
pub fn sanitize_query(query: &str) -> Option<&str> {
    let rest = query.trim_start_matches(|c: char| c.is_ascii_whitespace());

    let keyword = rest.get(..SELECT_KEYWORD.len())?;
    if !keyword.eq_ignore_ascii_case(SELECT_KEYWORD) {
        return None;
    }

    match rest[SELECT_KEYWORD.len()..].chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => None,
        _ => Some(query),
    }
}

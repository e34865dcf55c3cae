//! Legacy quote escaping
//!
//! Kept only for callers that still build statements by string interpolation.
//! Bound parameters are the supported path; see [`crate::cursor::Cursor`].

/// Escape a string for inline embedding in a SQL literal by doubling single
/// quotes, then doubling double quotes (so `O'Reilly` becomes `O''Reilly`).
///
/// This is a compatibility shim for statement text assembled by hand. It is
/// not a general SQL-injection defense and must not be treated as one; pass
/// values as bound parameters instead.
#[deprecated(note = "bind statement parameters instead of escaping into SQL text")]
pub fn legacy_quote(input: &str) -> String {
    // Fast path: nothing to escape (common case)
    if !input.contains('\'') && !input.contains('"') {
        return input.to_string();
    }
    input.replace('\'', "''").replace('"', "\"\"")
}

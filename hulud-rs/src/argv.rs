//! Argument vectors and the literal tokens that carry meaning in them.

use std::ffi::CString;

use crate::error::Result;

pub const PIPE: &str = "|";
pub const BACKGROUND: &str = "&";

/// Splits a command line on whitespace. No quoting or escaping.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(|s| s.to_string()).collect()
}

/// Removes a trailing `&`, reporting whether one was present.
pub fn strip_background(argv: &[String]) -> (&[String], bool) {
    match argv.split_last() {
        Some((last, rest)) if last == BACKGROUND => (rest, true),
        _ => (argv, false),
    }
}

/// Builds the C argument array handed to `execvp`. Done before fork so the
/// child never allocates.
pub fn to_cstrings(argv: &[String]) -> Result<Vec<CString>> {
    let cstrs = argv
        .iter()
        .map(|s| CString::new(s.as_str()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(cstrs)
}

//! Text helpers shared by the engine and the default commands.
//!
//! The script format is deliberately plain: statements are separated by
//! [`MULTILINE_DELIM`] and tokens inside a statement by [`TOKEN_DELIM`].
//! There is no quoting and no escaping.

/// Separator between statements of a script.
pub const MULTILINE_DELIM: &str = "\n";

/// Separator between tokens of a statement.
pub const TOKEN_DELIM: &str = " ";

/// Leading marker reserved for comments.
///
/// The engine does not strip comments itself; command authors may treat
/// statements starting with this marker as comments.
pub const COMMENT_ID: &str = "//";

/// Split `input` on every occurrence of `delim`.
///
/// Empty pieces (produced by leading, trailing or consecutive delimiters)
/// are dropped, so a blank statement yields no tokens at all.
pub fn split(input: &str, delim: &str) -> Vec<String> {
    if delim.is_empty() {
        return if input.is_empty() {
            Vec::new()
        } else {
            vec![input.to_string()]
        };
    }
    input
        .split(delim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a script into statements, keeping blank statements in place.
///
/// Line numbers reported by the engine are positions in this list, so
/// blank lines must not be dropped here.
pub fn statements(script: &str) -> Vec<String> {
    if script.is_empty() {
        return Vec::new();
    }
    script.split(MULTILINE_DELIM).map(str::to_string).collect()
}

/// Split one statement into its tokens.
pub fn tokens(statement: &str) -> Vec<String> {
    split(statement, TOKEN_DELIM)
}

/// Replace every occurrence of `from` in `target` with `to`, in place.
///
/// Returns the number of replacements made. An empty `from` is a no-op.
pub fn replace_all(target: &mut String, from: &str, to: &str) -> usize {
    if from.is_empty() {
        return 0;
    }
    let count = target.matches(from).count();
    if count > 0 {
        *target = target.replace(from, to);
    }
    count
}

/// Whether `statement` is a comment according to [`COMMENT_ID`].
pub fn is_comment(statement: &str) -> bool {
    statement.trim_start().starts_with(COMMENT_ID)
}

//! Command line tokenizer
//!
//! Splits a line into the command name and the raw argument string. Only the
//! first token is cut out; the arguments are handed to the command untouched
//! apart from leading blanks.

const BLANKS: [char; 2] = [' ', '\t'];
const NAME_DELIMITERS: [char; 4] = [' ', '\t', '\n', '\r'];
const LINE_TERMINATORS: [char; 2] = ['\n', '\r'];

/// Split `line` into `(name, arguments)`.
///
/// Trailing line terminators are dropped, leading blanks skipped. The name
/// runs up to the first blank or line terminator. The arguments start after
/// that delimiter with leading blanks skipped, and are empty when the line
/// has nothing after the name. Returns `None` for a blank line.
pub fn split_command(line: &mut str) -> Option<(&mut str, &mut str)> {
    let end = line.trim_end_matches(LINE_TERMINATORS).len();
    let line = &mut line[..end];

    let start = line.len() - line.trim_start_matches(BLANKS).len();
    let line = &mut line[start..];

    let name_end = line.find(NAME_DELIMITERS).unwrap_or(line.len());
    if name_end == 0 {
        return None;
    }

    let (name, rest) = line.split_at_mut(name_end);
    // Skip the single delimiter that ended the name (all delimiters are ASCII)
    let rest = if rest.is_empty() { rest } else { &mut rest[1..] };
    let skip = rest.len() - rest.trim_start_matches(BLANKS).len();

    Some((name, &mut rest[skip..]))
}

//! Low-level text helpers shared by the text-window and tree paths.

use std::ops::Range;

/// Walks JS-ish source, tracking string literals and bracket depth.
///
/// Good enough to find delimiters in attribute lists and object literal
/// bodies. Template literal interpolations are treated as part of the string.
pub(crate) struct Scanner;

impl Scanner {
    /// Offsets and chars of `text` that sit at bracket depth zero, outside
    /// any string literal. Quotes and brackets themselves are not yielded.
    fn top_level(text: &str) -> impl Iterator<Item = (usize, char)> + '_ {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        text.char_indices().filter_map(move |(i, c)| {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                return None;
            }
            match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    None
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    None
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    None
                }
                _ if depth == 0 => Some((i, c)),
                _ => None,
            }
        })
    }

    /// First top-level occurrence of `needle`.
    pub fn find_top_level(text: &str, needle: char) -> Option<usize> {
        Self::top_level(text)
            .find(|(_, c)| *c == needle)
            .map(|(i, _)| i)
    }

    /// Split `text` at top-level occurrences of `delim`.
    pub fn split_top_level(text: &str, delim: char) -> Vec<Range<usize>> {
        let mut parts = Vec::new();
        let mut start = 0;
        for (i, c) in Self::top_level(text) {
            if c == delim {
                parts.push(start..i);
                start = i + c.len_utf8();
            }
        }
        parts.push(start..text.len());
        parts
    }

    /// Offset of the `}` closing the brace that opens at `open`.
    pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
        if text.as_bytes().get(open) != Some(&b'{') {
            return None;
        }
        let inner = &text[open + 1..];
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for (i, c) in inner.char_indices() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' | '`' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                '}' if depth == 0 => return Some(open + 1 + i),
                '}' => depth -= 1,
                _ => {}
            }
        }
        None
    }
}

/// Single-quoted JS string literal.
pub(crate) fn quote_single(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Normalize raw JSX text the way it renders: lines are trimmed (except the
/// outer edges of the first and last line), blank lines are dropped and the
/// rest are joined by a single space.
pub fn jsx_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last = lines.len() - 1;
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut line = line.trim_end_matches('\r');
        if i != 0 {
            line = line.trim_start_matches([' ', '\t']);
        }
        if i != last {
            line = line.trim_end_matches([' ', '\t']);
        }
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(line);
    }
    out
}

/// Text ready to sit between JSX tags. Anything JSX would read as markup
/// or an expression goes into a string expression instead.
pub(crate) fn jsx_child_text(text: &str) -> String {
    if text.contains(['{', '}', '<', '>']) {
        format!("{{{}}}", quote_single(text))
    } else {
        text.to_string()
    }
}

/// Range of `text` (relative) without leading and trailing whitespace.
pub(crate) fn trimmed_range(text: &str) -> Range<usize> {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();
    start..end.max(start)
}

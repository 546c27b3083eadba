//! Span-based text replacement.

use std::ops::Range;

use crate::{Error, Result};

/// Replace `range` of the source with `text`. An empty range is an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub text: String,
}

impl TextEdit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }
}

/// Apply edits to `source`, all offsets referring to the original text.
///
/// Edits are applied back to front so earlier offsets stay valid. Nothing is
/// written if any edit is out of bounds, off a char boundary, or overlaps
/// another.
pub fn apply_edits(source: &str, edits: Vec<TextEdit>) -> Result<String> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    // Back to front. Insertions sharing an offset are applied last-first so
    // they end up in the order they were recorded.
    let mut edits: Vec<(usize, TextEdit)> = edits.into_iter().enumerate().collect();
    edits.sort_by(|(ia, a), (ib, b)| {
        b.range
            .start
            .cmp(&a.range.start)
            .then(b.range.end.cmp(&a.range.end))
            .then(ib.cmp(ia))
    });

    let mut floor = source.len();
    for (_, edit) in &edits {
        let Range { start, end } = edit.range;
        if start > end
            || end > floor
            || !source.is_char_boundary(start)
            || !source.is_char_boundary(end)
        {
            return Err(Error::OverlappingEdits(start, end));
        }
        floor = start;
    }

    let mut result = source.to_string();
    for (_, edit) in edits {
        result.replace_range(edit.range, &edit.text);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_in_any_order() {
        let edits = vec![
            TextEdit::replace(0..5, "Howdy"),
            TextEdit::replace(6..11, "there"),
        ];
        assert_eq!(apply_edits("hello world", edits).unwrap(), "Howdy there");
    }

    #[test]
    fn test_insertion() {
        let edits = vec![TextEdit::insert(4, " style={{}}")];
        assert_eq!(
            apply_edits("<div>x</div>", edits).unwrap(),
            "<div style={{}}>x</div>"
        );
    }

    #[test]
    fn test_insertions_at_same_offset_keep_order() {
        let edits = vec![TextEdit::insert(1, "b"), TextEdit::insert(1, "c")];
        assert_eq!(apply_edits("ad", edits).unwrap(), "abcd");
    }

    #[test]
    fn test_overlap_rejected() {
        let edits = vec![TextEdit::replace(0..5, "a"), TextEdit::replace(3..8, "b")];
        assert!(matches!(
            apply_edits("0123456789", edits),
            Err(Error::OverlappingEdits(..))
        ));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let edits = vec![TextEdit::replace(2..40, "x")];
        assert!(apply_edits("short", edits).is_err());
    }
}

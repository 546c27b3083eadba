//! Style merge engine.
//!
//! A style object is modelled as a [`StyleBody`]: the byte range between its
//! braces plus the entries found there, each with the spans of the whole
//! entry and of its value. The body can come from the syntax tree (tree
//! mode, see [`crate::tree`]) or from scanning raw text (string mode,
//! [`StyleBody::scan`]). Merging is the same for both: it produces text
//! edits against the original source, so two bodies describing the same
//! object produce the same output.
//!
//! Merge rules:
//! - an existing key gets its value replaced in place, nothing else moves
//! - a missing key is appended after the last entry
//! - every other entry, including ones that can't be parsed, is untouched

use std::ops::Range;

use indexmap::IndexMap;

use crate::edit::TextEdit;
use crate::text::{Scanner, quote_single, trimmed_range};

/// Ordered, unique-keyed CSS property/value pairs, keys in camelCase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: IndexMap<String, String>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. A new key goes to the end; an existing key keeps its place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `key: 'value'` pairs joined with `", "`.
    pub fn render_entries(&self) -> String {
        self.iter()
            .map(|(key, value)| render_entry(key, value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The mapping as an object literal, e.g. `{color: 'red'}`.
    pub fn render_object(&self) -> String {
        format!("{{{}}}", self.render_entries())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = StyleMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// The value side of a style entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleValue {
    /// A string literal, unescaped
    Str(String),
    /// Any other expression, as written
    Expr(String),
}

/// One entry of a style object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleEntry {
    /// `None` for spreads, computed keys and entries that didn't parse;
    /// those are carried through verbatim
    pub key: Option<String>,
    pub value: StyleValue,
    /// The whole entry, without surrounding commas or whitespace
    pub span: Range<usize>,
    pub value_span: Range<usize>,
}

impl StyleEntry {
    /// An entry the merge must leave exactly as written.
    pub fn opaque(span: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            key: None,
            value: StyleValue::Expr(text.into()),
            value_span: span.clone(),
            span,
        }
    }
}

/// The contents of one style object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBody {
    /// Between the braces, absolute offsets into the source
    pub inner: Range<usize>,
    pub entries: Vec<StyleEntry>,
}

impl StyleBody {
    /// Parse the raw text between a style object's braces (string mode).
    ///
    /// Entries are split on top-level commas, so commas inside strings,
    /// calls and nested literals don't break them apart. An entry with no
    /// top-level colon is kept as-is and logged.
    pub fn scan(source: &str, inner: Range<usize>) -> Self {
        let text = &source[inner.clone()];
        let mut entries = Vec::new();

        for segment in Scanner::split_top_level(text, ',') {
            let trimmed = trim_range(text, segment);
            if trimmed.is_empty() {
                continue;
            }
            let span = inner.start + trimmed.start..inner.start + trimmed.end;
            let entry_text = &source[span.clone()];

            if entry_text.starts_with("...") {
                entries.push(StyleEntry::opaque(span, entry_text));
                continue;
            }

            let Some(colon) = Scanner::find_top_level(entry_text, ':') else {
                tracing::debug!(entry = entry_text, "skipping malformed style entry");
                entries.push(StyleEntry::opaque(span, entry_text));
                continue;
            };

            let key = parse_key(entry_text[..colon].trim());
            let value_local = trim_range(entry_text, colon + 1..entry_text.len());
            let value_span = span.start + value_local.start..span.start + value_local.end;
            let raw_value = &source[value_span.clone()];

            if key.is_none() || raw_value.is_empty() {
                tracing::debug!(entry = entry_text, "skipping malformed style entry");
                entries.push(StyleEntry::opaque(span, entry_text));
                continue;
            }

            entries.push(StyleEntry {
                key,
                value: parse_value(raw_value),
                span,
                value_span,
            });
        }

        Self { inner, entries }
    }

    /// Keys that parsed, in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.key.as_deref())
    }

    /// Edits that merge `map` into this body.
    pub fn merge(&self, source: &str, map: &StyleMap) -> Vec<TextEdit> {
        let mut edits = Vec::new();
        let mut appended = Vec::new();

        for (key, value) in map.iter() {
            let existing: Vec<&StyleEntry> = self
                .entries
                .iter()
                .filter(|e| e.key.as_deref() == Some(key))
                .collect();

            if existing.is_empty() {
                appended.push(render_entry(key, value));
                continue;
            }

            for entry in existing {
                if entry.value != StyleValue::Str(value.to_string()) {
                    edits.push(TextEdit::replace(
                        entry.value_span.clone(),
                        quote_single(value),
                    ));
                }
            }
        }

        if appended.is_empty() {
            return edits;
        }

        match self.entries.last() {
            Some(last) => {
                let separator = self.separator(source);
                let text: String = appended
                    .iter()
                    .map(|entry| format!("{separator}{entry}"))
                    .collect();
                edits.push(TextEdit::insert(last.span.end, text));
            }
            None => {
                edits.push(TextEdit::replace(self.inner.clone(), appended.join(", ")));
            }
        }
        edits
    }

    /// How entries are separated in this object: the text between the last
    /// two entries, or a newline + indentation if the single entry sits on
    /// its own line, or `", "`.
    fn separator(&self, source: &str) -> String {
        match self.entries.as_slice() {
            [.., prev, last] => source[prev.span.end..last.span.start].to_string(),
            [only] => {
                let lead = &source[self.inner.start..only.span.start];
                match lead.rfind('\n') {
                    Some(newline) => format!(",{}", &lead[newline..]),
                    None => ", ".to_string(),
                }
            }
            [] => ", ".to_string(),
        }
    }
}

/// `key: 'value'`, quoting the key when it isn't a plain identifier.
pub(crate) fn render_entry(key: &str, value: &str) -> String {
    if is_identifier(key) {
        format!("{key}: {}", quote_single(value))
    } else {
        format!("{}: {}", quote_single(key), quote_single(value))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn parse_key(raw: &str) -> Option<String> {
    if raw.starts_with('[') {
        return None;
    }
    if let Some(inner) = unquote(raw) {
        return Some(inner);
    }
    is_identifier(raw).then(|| raw.to_string())
}

fn parse_value(raw: &str) -> StyleValue {
    match unquote(raw) {
        Some(value) => StyleValue::Str(value),
        None => StyleValue::Expr(raw.to_string()),
    }
}

/// Unescape a single- or double-quoted literal that spans all of `raw`.
fn unquote(raw: &str) -> Option<String> {
    let quote = raw.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    if raw.len() < 2 || !raw.ends_with(quote) {
        return None;
    }
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            c if c == quote => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

fn trim_range(text: &str, range: Range<usize>) -> Range<usize> {
    let local = trimmed_range(&text[range.clone()]);
    range.start + local.start..range.start + local.end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_edits;

    fn merge_str(inner: &str, map: &StyleMap) -> String {
        let source = format!("{{{inner}}}");
        let body = StyleBody::scan(&source, 1..source.len() - 1);
        apply_edits(&source, body.merge(&source, map)).unwrap()
    }

    fn map(pairs: &[(&str, &str)]) -> StyleMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_overwrite_in_place() {
        let out = merge_str(
            "color: 'red', padding: '4px'",
            &map(&[("color", "blue")]),
        );
        assert_eq!(out, "{color: 'blue', padding: '4px'}");
    }

    #[test]
    fn test_append_missing_key() {
        let out = merge_str("color:'red'", &map(&[("padding", "8px")]));
        assert_eq!(out, "{color:'red', padding: '8px'}");
    }

    #[test]
    fn test_append_reuses_separator() {
        let out = merge_str(
            "\n  padding: '20px',\n  border: '2px solid'\n",
            &map(&[("color", "red")]),
        );
        assert_eq!(
            out,
            "{\n  padding: '20px',\n  border: '2px solid',\n  color: 'red'\n}"
        );
    }

    #[test]
    fn test_single_multiline_entry() {
        let out = merge_str("\n    margin: 0\n  ", &map(&[("color", "red")]));
        assert_eq!(out, "{\n    margin: 0,\n    color: 'red'\n  }");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(merge_str(" ", &map(&[("color", "red")])), "{color: 'red'}");
    }

    #[test]
    fn test_same_value_is_untouched() {
        let source = "{color: \"red\"}";
        let body = StyleBody::scan(source, 1..source.len() - 1);
        assert!(body.merge(source, &map(&[("color", "red")])).is_empty());
    }

    #[test]
    fn test_commas_inside_values() {
        let body_text = "backgroundColor: 'rgba(0, 0, 0, 0.5)', fontFamily: \"a, b\"";
        let source = format!("{{{body_text}}}");
        let body = StyleBody::scan(&source, 1..source.len() - 1);
        let keys: Vec<_> = body.keys().collect();
        assert_eq!(keys, ["backgroundColor", "fontFamily"]);
        assert_eq!(
            body.entries[0].value,
            StyleValue::Str("rgba(0, 0, 0, 0.5)".to_string())
        );
    }

    #[test]
    fn test_malformed_and_spread_kept() {
        let out = merge_str(
            "...base, bogus, margin: 0",
            &map(&[("margin", "4px"), ("color", "red")]),
        );
        assert_eq!(out, "{...base, bogus, margin: '4px', color: 'red'}");
    }

    #[test]
    fn test_expression_values_kept() {
        let out = merge_str("fontSize: size, color: 'red'", &map(&[("color", "blue")]));
        assert_eq!(out, "{fontSize: size, color: 'blue'}");
    }

    #[test]
    fn test_quoted_keys() {
        let out = merge_str("'fontSize': '12px'", &map(&[("fontSize", "14px")]));
        assert_eq!(out, "{'fontSize': '14px'}");
    }

    #[test]
    fn test_value_quoting() {
        let out = merge_str("", &map(&[("fontFamily", "Bob's Font")]));
        assert_eq!(out, "{fontFamily: 'Bob\\'s Font'}");
    }

    #[test]
    fn test_render_object() {
        let m = map(&[("color", "blue"), ("--accent", "#fff")]);
        assert_eq!(m.render_object(), "{color: 'blue', '--accent': '#fff'}");
    }

    #[test]
    fn test_insert_preserves_position() {
        let mut m = map(&[("color", "red"), ("padding", "1px")]);
        m.insert("color", "blue");
        let keys: Vec<_> = m.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["color", "padding"]);
    }
}

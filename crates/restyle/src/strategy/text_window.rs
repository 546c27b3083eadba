//! Patching by scanning raw text for `<tag ...>...</tag>` windows.

use std::ops::Range;

use regex::Regex;

use super::Strategy;
use crate::descriptor::ElementProperties;
use crate::edit::{TextEdit, apply_edits};
use crate::matcher::text_matches;
use crate::style::{StyleBody, StyleMap};
use crate::text::{Scanner, jsx_child_text, trimmed_range};
use crate::{Error, Result};

/// Finds the first window whose inner text matches the target and edits the
/// style attribute (and plain text content) in place.
///
/// Works on unparsable source. Gives up on anything it can't edit
/// textually: style attributes that aren't object literals, and text mixed
/// with expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextWindow;

impl Strategy for TextWindow {
    fn name(&self) -> &'static str {
        "text-window"
    }

    fn apply(
        &self,
        source: &str,
        target: &ElementProperties,
        update: &ElementProperties,
    ) -> Result<String> {
        let windows = find_windows(source, &target.tag)?;
        let Some(window) = windows.iter().find(|w| text_matches(w.inner(source), target.text()))
        else {
            return Err(Error::ElementNotFound {
                tag: target.tag.clone(),
                text: target.text().to_string(),
                available: Vec::new(),
            });
        };

        let mut edits = style_edits(source, window, &update.style_map(), &target.tag)?;
        if let Some(text) = target.text_change(update) {
            edits.extend(text_edit(source, window, text, &target.tag)?);
        }
        apply_edits(source, edits)
    }
}

/// One occurrence of the tag in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Window {
    /// Right after the tag name
    name_end: usize,
    /// Where the attribute list ends: the `>` or the `/` of `/>`
    attrs_end: usize,
    /// Between the tags, `None` when self-closing
    content: Option<Range<usize>>,
}

impl Window {
    fn inner<'s>(&self, source: &'s str) -> &'s str {
        self.content.clone().map_or("", |range| &source[range])
    }
}

struct TagMark {
    start: usize,
    closing: bool,
    name_end: usize,
}

/// Every balanced window of `tag`, ordered by opening position.
fn find_windows(source: &str, tag: &str) -> Result<Vec<Window>> {
    let pattern = Regex::new(&format!(r"<(/?){}[\s/>]", regex::escape(tag)))?;
    let marks: Vec<TagMark> = pattern
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let closing = caps.get(1).is_some_and(|m| !m.is_empty());
            Some(TagMark {
                start: whole.start(),
                closing,
                name_end: whole.start() + 1 + usize::from(closing) + tag.len(),
            })
        })
        .collect();

    // (index of '>', self-closing) for every opening mark
    let ends: Vec<Option<(usize, bool)>> = marks
        .iter()
        .map(|mark| {
            if mark.closing {
                return None;
            }
            let gt = mark.name_end + Scanner::find_top_level(&source[mark.name_end..], '>')?;
            let self_closing = source[mark.name_end..gt].trim_end().ends_with('/');
            Some((gt, self_closing))
        })
        .collect();

    let mut windows = Vec::new();
    for (i, mark) in marks.iter().enumerate() {
        let Some((gt, self_closing)) = ends[i] else {
            continue;
        };
        if self_closing {
            let slash = source[..gt].trim_end().len() - 1;
            windows.push(Window {
                name_end: mark.name_end,
                attrs_end: slash,
                content: None,
            });
            continue;
        }

        let mut depth = 1usize;
        for (j, other) in marks.iter().enumerate().skip(i + 1) {
            if other.start <= gt {
                continue;
            }
            if other.closing {
                depth -= 1;
                if depth == 0 {
                    windows.push(Window {
                        name_end: mark.name_end,
                        attrs_end: gt,
                        content: Some(gt + 1..other.start),
                    });
                    break;
                }
            } else if let Some((_, false)) = ends[j] {
                depth += 1;
            }
        }
    }
    Ok(windows)
}

struct Attribute<'s> {
    name: &'s str,
    range: Range<usize>,
    value: Option<Range<usize>>,
}

/// Split an opening tag's attribute list. `None` when it can't be read.
fn attributes(source: &str, range: Range<usize>) -> Option<Vec<Attribute<'_>>> {
    let bytes = source.as_bytes();
    let mut attrs = Vec::new();
    let mut i = range.start;

    loop {
        while i < range.end && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= range.end {
            return Some(attrs);
        }

        if bytes[i] == b'{' {
            let close = Scanner::matching_brace(source, i)?;
            attrs.push(Attribute {
                name: "",
                range: i..close + 1,
                value: None,
            });
            i = close + 1;
            continue;
        }

        let start = i;
        while i < range.end && !matches!(bytes[i], b'=' | b'/' | b'>' | b'{') && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == start {
            return None;
        }
        let name = &source[start..i];

        let mut j = i;
        while j < range.end && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= range.end || bytes[j] != b'=' {
            attrs.push(Attribute {
                name,
                range: start..i,
                value: None,
            });
            continue;
        }

        j += 1;
        while j < range.end && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let value_end = match bytes.get(j)? {
            quote @ (b'"' | b'\'') => j + 1 + source[j + 1..range.end].find(*quote as char)? + 1,
            b'{' => Scanner::matching_brace(source, j)? + 1,
            _ => return None,
        };
        attrs.push(Attribute {
            name,
            range: start..value_end,
            value: Some(j..value_end),
        });
        i = value_end;
    }
}

fn style_edits(
    source: &str,
    window: &Window,
    map: &StyleMap,
    tag: &str,
) -> Result<Vec<TextEdit>> {
    if map.is_empty() {
        return Ok(Vec::new());
    }
    let attrs = attributes(source, window.name_end..window.attrs_end)
        .ok_or_else(|| Error::StyleNotEditable(tag.to_string()))?;

    let Some(style) = attrs.iter().find(|attr| attr.name == "style") else {
        let at = attrs.last().map_or(window.name_end, |attr| attr.range.end);
        return Ok(vec![TextEdit::insert(
            at,
            format!(" style={{{}}}", map.render_object()),
        )]);
    };

    let body = style
        .value
        .clone()
        .filter(|value| source[value.clone()].starts_with('{'))
        .and_then(|value| {
            let container = value.start + 1..value.end - 1;
            let local = trimmed_range(&source[container.clone()]);
            let object = container.start + local.start..container.start + local.end;
            let is_literal = source[object.clone()].starts_with('{')
                && Scanner::matching_brace(source, object.start) == Some(object.end - 1);
            is_literal.then(|| StyleBody::scan(source, object.start + 1..object.end - 1))
        })
        .ok_or_else(|| Error::StyleNotEditable(tag.to_string()))?;

    Ok(body.merge(source, map))
}

fn text_edit(source: &str, window: &Window, text: &str, tag: &str) -> Result<Option<TextEdit>> {
    let Some(content) = window.content.clone() else {
        return Err(Error::TextNotEditable(tag.to_string()));
    };
    let inner = &source[content.clone()];
    if inner.contains('<') {
        tracing::debug!(tag, "not replacing text of an element with children");
        return Ok(None);
    }
    if inner.contains('{') {
        return Err(Error::TextNotEditable(tag.to_string()));
    }

    let local = trimmed_range(inner);
    let child_text = jsx_child_text(text);
    if local.is_empty() {
        return Ok(Some(TextEdit::insert(content.start, child_text)));
    }
    Ok(Some(TextEdit::replace(
        content.start + local.start..content.start + local.end,
        child_text,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(source: &str, target: &ElementProperties, update: &ElementProperties) -> Result<String> {
        TextWindow.apply(source, target, update)
    }

    #[test]
    fn test_overwrite_color() {
        let source = "function MyComponent(){ return <div style={{color:'red'}}>Hi</div>; }";
        let target = ElementProperties::new("div").with_text("Hi").with_color("red");
        let out = patch(source, &target, &target.clone().with_color("blue")).unwrap();
        assert_eq!(
            out,
            "function MyComponent(){ return <div style={{color:'blue'}}>Hi</div>; }"
        );
    }

    #[test]
    fn test_insert_style_attribute() {
        let source = "const A = () => <p className=\"lead\">Hi</p>;";
        let target = ElementProperties::new("p").with_text("Hi");
        let out = patch(source, &target, &target.clone().with_color("red")).unwrap();
        assert_eq!(
            out,
            "const A = () => <p className=\"lead\" style={{color: 'red'}}>Hi</p>;"
        );
    }

    #[test]
    fn test_nested_same_tag() {
        let source = "<div><div>Inner</div><p>x</p></div>";
        let windows = find_windows(source, "div").unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].inner(source), "<div>Inner</div><p>x</p>");
        assert_eq!(windows[1].inner(source), "Inner");
    }

    #[test]
    fn test_picks_matching_text() {
        let source = "<ul><li>One</li><li>Two</li></ul>";
        let target = ElementProperties::new("li").with_text("Two");
        let out = patch(source, &target, &target.clone().with_color("red")).unwrap();
        assert_eq!(out, "<ul><li>One</li><li style={{color: 'red'}}>Two</li></ul>");
    }

    #[test]
    fn test_similar_tag_names_ignored() {
        let source = "<divider>Hi</divider><div>Hi</div>";
        let windows = find_windows(source, "div").unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].name_end, 25);
    }

    #[test]
    fn test_works_on_unparsable_source() {
        let source = "function A() { return <p>Hi</p> +++ }}";
        let target = ElementProperties::new("p").with_text("Hi");
        let out = patch(source, &target, &target.clone().with_color("red")).unwrap();
        assert!(out.contains("<p style={{color: 'red'}}>Hi</p>"));
    }

    #[test]
    fn test_opaque_style_refused() {
        let source = "<p style={styles.lead}>Hi</p>";
        let target = ElementProperties::new("p").with_text("Hi");
        let err = patch(source, &target, &target.clone().with_color("red")).unwrap_err();
        assert!(matches!(err, Error::StyleNotEditable(_)));
    }

    #[test]
    fn test_attribute_values_with_gt() {
        let source = "<button onClick={() => a > b} title=\"x > y\">Go</button>";
        let target = ElementProperties::new("button").with_text("Go");
        let out = patch(source, &target, &target.clone().with_color("red")).unwrap();
        assert_eq!(
            out,
            "<button onClick={() => a > b} title=\"x > y\" style={{color: 'red'}}>Go</button>"
        );
    }

    #[test]
    fn test_text_replacement() {
        let source = "<h1>\n  Hello\n</h1>";
        let target = ElementProperties::new("h1").with_text("Hello");
        let out = patch(source, &target, &target.clone().with_text("Howdy")).unwrap();
        assert_eq!(out, "<h1>\n  Howdy\n</h1>");
    }

    #[test]
    fn test_text_with_expression_refused() {
        let source = "<p>Count: {count}</p>";
        let target = ElementProperties::new("p").with_text("Count:");
        let err = patch(source, &target, &target.clone().with_text("Total:")).unwrap_err();
        assert!(matches!(err, Error::TextNotEditable(_)));
    }

    #[test]
    fn test_self_closing_gets_style() {
        let source = "<div><img src=\"a.png\" /></div>";
        let target = ElementProperties::new("img");
        let out = patch(source, &target, &target.clone().with_color("red")).unwrap();
        assert_eq!(out, "<div><img src=\"a.png\" style={{color: 'red'}} /></div>");
    }

    #[test]
    fn test_missing_tag() {
        let source = "<div>Hi</div>";
        let target = ElementProperties::new("span");
        let err = patch(source, &target, &target.clone().with_color("red")).unwrap_err();
        assert!(matches!(err, Error::ElementNotFound { .. }));
    }
}

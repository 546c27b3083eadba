//! An owned, span-annotated view of the JSX elements in a source file.
//!
//! The tree is produced by a [`SourceCompiler`](crate::SourceCompiler) and
//! only keeps what patching needs: element names, where attributes can go,
//! the parsed style attribute and the children. Mutations don't touch the
//! source; they are recorded as [`TextEdit`]s and spliced in by
//! [`SyntaxTree::generate`], so every byte outside an edit survives.

use std::ops::Range;

use crate::descriptor::ElementProperties;
use crate::edit::{TextEdit, apply_edits};
use crate::matcher::matches;
use crate::style::{StyleBody, StyleMap};
use crate::text::{jsx_child_text, jsx_text, quote_single, trimmed_range};
use crate::{Error, Result};

/// Index of an element in depth-first source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Byte offsets into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }
}

/// How an element's `style` attribute is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleAttr {
    /// `style={{ ... }}`
    Object(StyleBody),
    /// `style={expr}`; the span covers `expr` only
    Opaque(Span),
    /// `style="..."` or a bare `style`
    Literal(Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildNode {
    /// Raw JSX text, whitespace included
    Text(Span),
    Element(ElementId),
    /// `{'text'}`; the span covers the braces
    StringLiteral { span: Span, value: String },
    /// Any other expression container or spread child
    Expression(Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    /// The element name as written, e.g. `div` or `Card.Header`
    pub tag: String,
    pub span: Span,
    /// Right after the last attribute, or after the name if there are none
    pub attr_insert: usize,
    /// Between the opening and closing tags, `None` when self-closing
    pub content: Option<Span>,
    pub style: Option<StyleAttr>,
    /// Fragment children are flattened into the enclosing element
    pub children: Vec<ChildNode>,
    pub parent: Option<ElementId>,
}

impl ElementNode {
    pub fn is_self_closing(&self) -> bool {
        self.content.is_none()
    }

    /// Lowercase names render as DOM elements; everything else is a component.
    pub fn is_intrinsic(&self) -> bool {
        self.tag.starts_with(|c: char| c.is_ascii_lowercase()) && !self.tag.contains('.')
    }
}

/// JSX elements of one source text, plus pending edits.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    elements: Vec<ElementNode>,
    edits: Vec<TextEdit>,
}

impl SyntaxTree {
    pub fn new(source: impl Into<String>, elements: Vec<ElementNode>) -> Self {
        Self {
            source: source.into(),
            elements,
            edits: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn elements(&self) -> &[ElementNode] {
        &self.elements
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementNode> {
        self.elements.get(id.0)
    }

    fn node(&self, id: ElementId) -> Result<&ElementNode> {
        self.element(id).ok_or_else(|| Error::ElementNotFound {
            tag: format!("#{}", id.0),
            text: String::new(),
            available: self.tags(),
        })
    }

    /// Whether any edit has been recorded.
    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    /// Visible text of an element and its descendants: each text piece with
    /// JSX whitespace rules applied and trimmed, joined by single spaces.
    pub fn text_of(&self, id: ElementId) -> String {
        let mut pieces = Vec::new();
        self.collect_text(id, &mut pieces);
        pieces.join(" ")
    }

    fn collect_text(&self, id: ElementId, pieces: &mut Vec<String>) {
        let Some(node) = self.element(id) else {
            return;
        };
        for child in &node.children {
            match child {
                ChildNode::Text(span) => {
                    let text = jsx_text(&self.source[span.range()]);
                    let text = text.trim();
                    if !text.is_empty() {
                        pieces.push(text.to_string());
                    }
                }
                ChildNode::StringLiteral { value, .. } => pieces.push(value.clone()),
                ChildNode::Element(child) => self.collect_text(*child, pieces),
                ChildNode::Expression(_) => {}
            }
        }
    }

    pub fn has_element_children(&self, id: ElementId) -> bool {
        self.element(id).is_some_and(|node| {
            node.children
                .iter()
                .any(|child| matches!(child, ChildNode::Element(_)))
        })
    }

    /// The first element, in source order, that matches `target`.
    pub fn find(&self, target: &ElementProperties) -> Option<ElementId> {
        (0..self.elements.len()).map(ElementId).find(|&id| {
            let node = &self.elements[id.0];
            matches(&node.tag, &self.text_of(id), target)
        })
    }

    /// Distinct tags in source order.
    fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for node in &self.elements {
            if !tags.contains(&node.tag) {
                tags.push(node.tag.clone());
            }
        }
        tags
    }

    /// Like [`find`](Self::find), but with a descriptive error.
    pub fn find_or_err(&self, target: &ElementProperties) -> Result<ElementId> {
        self.find(target).ok_or_else(|| Error::ElementNotFound {
            tag: target.tag.clone(),
            text: target.text().to_string(),
            available: self.tags(),
        })
    }

    /// Merge `map` into the element's inline style.
    ///
    /// A missing attribute is added after the last attribute. An opaque
    /// style expression is spread into a new object so its own values still
    /// apply underneath the new ones.
    pub fn apply_style(&mut self, id: ElementId, map: &StyleMap) -> Result<()> {
        if map.is_empty() {
            return Ok(());
        }
        let node = self.node(id)?;
        let edits = match &node.style {
            None => vec![TextEdit::insert(
                node.attr_insert,
                format!(" style={{{}}}", map.render_object()),
            )],
            Some(StyleAttr::Object(body)) => body.merge(&self.source, map),
            Some(StyleAttr::Opaque(expr)) => {
                let expr_text = &self.source[expr.range()];
                vec![TextEdit::replace(
                    expr.range(),
                    format!("{{...{expr_text}, {}}}", map.render_entries()),
                )]
            }
            Some(StyleAttr::Literal(_)) => {
                return Err(Error::StyleNotEditable(node.tag.clone()));
            }
        };
        self.edits.extend(edits);
        Ok(())
    }

    /// Replace the element's text.
    ///
    /// Only leaf elements are touched; asking for anything else is a no-op.
    pub fn replace_text(&mut self, id: ElementId, text: &str) -> Result<()> {
        if self.has_element_children(id) {
            tracing::debug!(element = id.0, "not replacing text of an element with children");
            return Ok(());
        }
        let node = self.node(id)?;
        let child_text = jsx_child_text(text);

        let Some(content) = node.content else {
            let edit = TextEdit::replace(
                node.attr_insert..node.span.end,
                format!(">{child_text}</{}>", node.tag),
            );
            self.edits.push(edit);
            return Ok(());
        };

        let first_text = node.children.iter().find_map(|child| match child {
            ChildNode::Text(span) if !self.source[span.range()].trim().is_empty() => Some(*span),
            _ => None,
        });
        let first_literal = node.children.iter().find_map(|child| match child {
            ChildNode::StringLiteral { span, .. } => Some(*span),
            _ => None,
        });

        let edit = match (first_text, first_literal) {
            (Some(span), _) => {
                let local = trimmed_range(&self.source[span.range()]);
                TextEdit::replace(span.start + local.start..span.start + local.end, child_text)
            }
            (None, Some(span)) => {
                TextEdit::replace(span.range(), format!("{{{}}}", quote_single(text)))
            }
            (None, None) => TextEdit::insert(content.start, child_text),
        };
        self.edits.push(edit);
        Ok(())
    }

    /// Source text with every intrinsic element tagged with its index in a
    /// `data-source-id` attribute. Pending edits are not included.
    pub fn instrumented(&self) -> Result<String> {
        let edits = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_intrinsic())
            .map(|(index, node)| {
                TextEdit::insert(
                    node.attr_insert,
                    format!(" {}=\"{index}\"", crate::extract::SOURCE_ID_ATTRIBUTE),
                )
            })
            .collect();
        apply_edits(&self.source, edits)
    }

    /// The source with all recorded edits applied.
    pub fn generate(&self) -> Result<String> {
        apply_edits(&self.source, self.edits.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{OxcCompiler, SourceCompiler};

    fn parse(source: &str) -> SyntaxTree {
        OxcCompiler::new().parse(source).unwrap()
    }

    fn style(pairs: &[(&str, &str)]) -> StyleMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_elements_in_source_order() {
        let tree = parse(
            "function App() { return <div><h1>Title</h1><p>Body <b>bold</b></p></div>; }",
        );
        let tags: Vec<_> = tree.elements().iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["div", "h1", "p", "b"]);
        assert_eq!(tree.elements()[3].parent, Some(ElementId(2)));
        assert_eq!(tree.text_of(ElementId(0)), "Title Body bold");
        assert_eq!(tree.text_of(ElementId(2)), "Body bold");
    }

    #[test]
    fn test_unknown_index_is_not_found() {
        let mut tree = parse("const A = () => <div><p>x</p></div>;");
        let err = tree
            .apply_style(ElementId(7), &style(&[("color", "red")]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ElementNotFound { tag, available, .. }
                if tag == "#7" && available == ["div", "p"]
        ));
        assert!(!tree.is_modified());
    }

    #[test]
    fn test_text_uses_jsx_whitespace() {
        let tree = parse(
            "const A = () => (\n  <p>\n    Hello\n    world\n  </p>\n);",
        );
        assert_eq!(tree.text_of(ElementId(0)), "Hello world");
    }

    #[test]
    fn test_find_first_match() {
        let tree = parse("const A = () => <ul><li>Item</li><li>Item</li></ul>;");
        let target = ElementProperties::new("li").with_text("Item");
        assert_eq!(tree.find(&target), Some(ElementId(1)));
    }

    #[test]
    fn test_not_found_lists_tags() {
        let tree = parse("const A = () => <div><p>x</p><p>y</p></div>;");
        let err = tree
            .find_or_err(&ElementProperties::new("span"))
            .unwrap_err();
        match err {
            Error::ElementNotFound { tag, available, .. } => {
                assert_eq!(tag, "span");
                assert_eq!(available, ["div", "p"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_add_style_attribute() {
        let mut tree = parse("const A = () => <p className=\"x\">Hi</p>;");
        tree.apply_style(ElementId(0), &style(&[("color", "red")]))
            .unwrap();
        assert_eq!(
            tree.generate().unwrap(),
            "const A = () => <p className=\"x\" style={{color: 'red'}}>Hi</p>;"
        );
    }

    #[test]
    fn test_merge_object_style() {
        let mut tree = parse(
            "const A = () => <p style={{ color: 'red', margin: 0 }}>Hi</p>;",
        );
        tree.apply_style(
            ElementId(0),
            &style(&[("color", "blue"), ("padding", "4px")]),
        )
        .unwrap();
        assert_eq!(
            tree.generate().unwrap(),
            "const A = () => <p style={{ color: 'blue', margin: 0, padding: '4px' }}>Hi</p>;"
        );
    }

    #[test]
    fn test_wrap_opaque_style() {
        let mut tree = parse("const A = () => <p style={styles.card}>Hi</p>;");
        tree.apply_style(ElementId(0), &style(&[("color", "red")]))
            .unwrap();
        assert_eq!(
            tree.generate().unwrap(),
            "const A = () => <p style={{...styles.card, color: 'red'}}>Hi</p>;"
        );
    }

    #[test]
    fn test_replace_text_keeps_whitespace() {
        let mut tree = parse("const A = () => (\n  <p>\n    Hello\n  </p>\n);");
        tree.replace_text(ElementId(0), "Bye").unwrap();
        assert_eq!(
            tree.generate().unwrap(),
            "const A = () => (\n  <p>\n    Bye\n  </p>\n);"
        );
    }

    #[test]
    fn test_replace_string_literal_child() {
        let mut tree = parse("const A = () => <p>{'Hello'}</p>;");
        tree.replace_text(ElementId(0), "It's").unwrap();
        assert_eq!(
            tree.generate().unwrap(),
            "const A = () => <p>{'It\\'s'}</p>;"
        );
    }

    #[test]
    fn test_insert_text_and_expand_self_closing() {
        let mut tree = parse("const A = () => <div><p></p><span /></div>;");
        tree.replace_text(ElementId(1), "one").unwrap();
        tree.replace_text(ElementId(2), "a < b").unwrap();
        assert_eq!(
            tree.generate().unwrap(),
            "const A = () => <div><p>one</p><span>{'a < b'}</span></div>;"
        );
    }

    #[test]
    fn test_text_on_parent_is_noop() {
        let mut tree = parse("const A = () => <div>Hi <b>there</b></div>;");
        tree.replace_text(ElementId(0), "Bye").unwrap();
        assert!(!tree.is_modified());
    }

    #[test]
    fn test_instrumented_skips_components() {
        let tree = parse("const A = () => <div><Card /><p>x</p></div>;");
        assert_eq!(
            tree.instrumented().unwrap(),
            "const A = () => <div data-source-id=\"0\"><Card /><p data-source-id=\"2\">x</p></div>;"
        );
    }
}

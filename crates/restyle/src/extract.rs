//! Descriptor extraction from rendered nodes.
//!
//! The extractor reads a node's computed style and content and produces an
//! [`ElementProperties`] snapshot. Values equal to a property's "nothing set"
//! sentinel are left out so untouched elements don't pick up no-op style
//! declarations when the descriptor is merged back into source.

use std::collections::HashMap;

use crate::color::{is_transparent, normalize_color};
use crate::descriptor::{ElementProperties, Property};

/// Attribute an instrumented preview stamps on every intrinsic element.
pub const SOURCE_ID_ATTRIBUTE: &str = "data-source-id";

/// Read-only view of a rendered element.
///
/// Implementations must not mutate the node. Missing APIs degrade to `None`.
pub trait RenderedNode {
    /// Element name in any case
    fn tag_name(&self) -> String;

    /// Computed value of a CSS property, by its hyphenated name
    fn computed_style(&self, css_property: &str) -> Option<String>;

    /// Full text content of the node and its descendants
    fn text_content(&self) -> Option<String>;

    /// Whether any child node is an element (text nodes don't count)
    fn has_child_elements(&self) -> bool;

    fn attribute(&self, name: &str) -> Option<String>;
}

/// Build a descriptor from a rendered node.
pub fn extract(node: &impl RenderedNode) -> ElementProperties {
    let has_child_elements = node.has_child_elements();
    let style = |property: Property| node.computed_style(property.css_name());

    let text_content = if has_child_elements {
        None
    } else {
        node.text_content()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    };

    ElementProperties {
        tag: node.tag_name().to_ascii_lowercase(),
        color: style(Property::Color).and_then(|v| normalize_color(&v)),
        background_color: style(Property::BackgroundColor).and_then(|v| normalize_color(&v)),
        font_size: style(Property::FontSize).filter(|v| !v.is_empty()),
        font_weight: style(Property::FontWeight).filter(|v| !v.is_empty()),
        padding: style(Property::Padding).filter(|v| !is_zero_length(v)),
        margin: style(Property::Margin).filter(|v| !is_zero_length(v)),
        border: style(Property::Border).filter(|v| !is_no_border(v)),
        border_radius: style(Property::BorderRadius).filter(|v| !is_zero_length(v)),
        text_content,
        has_child_elements,
        source_id: node
            .attribute(SOURCE_ID_ATTRIBUTE)
            .and_then(|id| id.trim().parse().ok()),
    }
}

fn is_zero_length(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == "0px"
}

/// `0px none <transparent>` is what an unbordered element computes to.
fn is_no_border(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    match value.strip_prefix("0px none") {
        Some(rest) => {
            let rest = rest.trim();
            rest.is_empty() || is_transparent(rest)
        }
        None => false,
    }
}

/// An in-memory rendered node, for hosts that snapshot the DOM themselves
/// and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticNode {
    pub tag: String,
    pub styles: HashMap<String, String>,
    pub attributes: HashMap<String, String>,
    pub text: Option<String>,
    pub child_elements: usize,
}

impl StaticNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn style(mut self, css_property: &str, value: &str) -> Self {
        self.styles.insert(css_property.to_string(), value.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn children(mut self, count: usize) -> Self {
        self.child_elements = count;
        self
    }
}

impl RenderedNode for StaticNode {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn computed_style(&self, css_property: &str) -> Option<String> {
        self.styles.get(css_property).cloned()
    }

    fn text_content(&self) -> Option<String> {
        self.text.clone()
    }

    fn has_child_elements(&self) -> bool {
        self.child_elements > 0
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}

#[cfg(feature = "web")]
impl RenderedNode for web_sys::Element {
    fn tag_name(&self) -> String {
        web_sys::Element::tag_name(self)
    }

    fn computed_style(&self, css_property: &str) -> Option<String> {
        let window = web_sys::window()?;
        let style = window.get_computed_style(self).ok()??;
        style.get_property_value(css_property).ok()
    }

    fn text_content(&self) -> Option<String> {
        web_sys::Node::text_content(self)
    }

    fn has_child_elements(&self) -> bool {
        self.child_element_count() > 0
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }
}

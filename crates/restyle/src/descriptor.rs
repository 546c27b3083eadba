//! Element descriptors and the style mapping derived from them.

use std::fmt;
use std::str::FromStr;

use facet::Facet;

use crate::style::StyleMap;
use crate::{Error, Result};

/// Point-in-time snapshot of one rendered element.
///
/// Created per user interaction from a rendered node (see [`crate::extract`])
/// and consumed by exactly one patch attempt. Absent fields mean "nothing
/// meaningful here", never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
#[facet(rename_all = "camelCase")]
pub struct ElementProperties {
    /// Lowercase element name, the identity key for matching
    pub tag: String,

    #[facet(default)]
    pub color: Option<String>,

    #[facet(default)]
    pub background_color: Option<String>,

    #[facet(default)]
    pub font_size: Option<String>,

    #[facet(default)]
    pub font_weight: Option<String>,

    #[facet(default)]
    pub padding: Option<String>,

    #[facet(default)]
    pub margin: Option<String>,

    #[facet(default)]
    pub border: Option<String>,

    #[facet(default)]
    pub border_radius: Option<String>,

    /// Trimmed text, only carried by leaf elements
    #[facet(default)]
    pub text_content: Option<String>,

    /// Fixed at extraction time; a `true` here forbids text edits
    #[facet(default)]
    pub has_child_elements: bool,

    /// Index stamped into the preview by an instrumented compile
    #[facet(default)]
    pub source_id: Option<u32>,
}

/// A field the properties panel can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Color,
    BackgroundColor,
    FontSize,
    FontWeight,
    Padding,
    Margin,
    Border,
    BorderRadius,
    TextContent,
}

impl Property {
    /// Style properties in the order they are written into a style mapping.
    pub const STYLE: [Property; 8] = [
        Property::Color,
        Property::BackgroundColor,
        Property::FontSize,
        Property::FontWeight,
        Property::Padding,
        Property::Margin,
        Property::Border,
        Property::BorderRadius,
    ];

    /// The camelCase name used in JSX style objects and descriptor JSON.
    pub fn name(self) -> &'static str {
        match self {
            Property::Color => "color",
            Property::BackgroundColor => "backgroundColor",
            Property::FontSize => "fontSize",
            Property::FontWeight => "fontWeight",
            Property::Padding => "padding",
            Property::Margin => "margin",
            Property::Border => "border",
            Property::BorderRadius => "borderRadius",
            Property::TextContent => "textContent",
        }
    }

    /// The CSS longhand name used for computed-style lookups.
    pub fn css_name(self) -> &'static str {
        match self {
            Property::Color => "color",
            Property::BackgroundColor => "background-color",
            Property::FontSize => "font-size",
            Property::FontWeight => "font-weight",
            Property::Padding => "padding",
            Property::Margin => "margin",
            Property::Border => "border",
            Property::BorderRadius => "border-radius",
            Property::TextContent => "text-content",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Property::STYLE
            .into_iter()
            .chain([Property::TextContent])
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownProperty(s.to_string()))
    }
}

impl ElementProperties {
    /// A descriptor with only a tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_color(self, value: impl Into<String>) -> Self {
        self.with(Property::Color, value)
    }

    pub fn with_child_elements(mut self, has_child_elements: bool) -> Self {
        self.has_child_elements = has_child_elements;
        self
    }

    pub fn with_source_id(mut self, id: u32) -> Self {
        self.source_id = Some(id);
        self
    }

    /// Return a copy with one property set, the way the properties panel
    /// produces an edited descriptor. An empty value clears the property.
    pub fn with(mut self, property: Property, value: impl Into<String>) -> Self {
        let value = value.into();
        let value = if value.is_empty() && property != Property::TextContent {
            None
        } else {
            Some(value)
        };
        *self.slot_mut(property) = value;
        self
    }

    /// Current value of a property.
    pub fn get(&self, property: Property) -> Option<&str> {
        let slot = match property {
            Property::Color => &self.color,
            Property::BackgroundColor => &self.background_color,
            Property::FontSize => &self.font_size,
            Property::FontWeight => &self.font_weight,
            Property::Padding => &self.padding,
            Property::Margin => &self.margin,
            Property::Border => &self.border,
            Property::BorderRadius => &self.border_radius,
            Property::TextContent => &self.text_content,
        };
        slot.as_deref()
    }

    fn slot_mut(&mut self, property: Property) -> &mut Option<String> {
        match property {
            Property::Color => &mut self.color,
            Property::BackgroundColor => &mut self.background_color,
            Property::FontSize => &mut self.font_size,
            Property::FontWeight => &mut self.font_weight,
            Property::Padding => &mut self.padding,
            Property::Margin => &mut self.margin,
            Property::Border => &mut self.border,
            Property::BorderRadius => &mut self.border_radius,
            Property::TextContent => &mut self.text_content,
        }
    }

    /// The style mapping this descriptor is authoritative over.
    pub fn style_map(&self) -> StyleMap {
        let mut map = StyleMap::new();
        for property in Property::STYLE {
            if let Some(value) = self.get(property) {
                map.insert(property.name(), value);
            }
        }
        map
    }

    /// Trimmed target text, empty when absent.
    pub fn text(&self) -> &str {
        self.text_content.as_deref().map(str::trim).unwrap_or("")
    }

    /// The text to write when moving from `self` to `update`, if any.
    ///
    /// `None` when the text is unchanged, or when either snapshot says the
    /// element has child elements.
    pub fn text_change<'a>(&self, update: &'a ElementProperties) -> Option<&'a str> {
        if self.has_child_elements || update.has_child_elements {
            return None;
        }
        let new_text = update.text_content.as_deref()?;
        if self.text_content.as_deref() == Some(new_text) {
            return None;
        }
        Some(new_text)
    }
}

//! Editor state: the source text, the selected element and the chain that
//! writes property edits back into the source.

use crate::descriptor::{ElementProperties, Property};
use crate::strategy::PatchChain;
use crate::{Error, Result};

/// What happened to one property edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The source was rewritten by the named strategy
    Applied { strategy: String },
    /// Nothing applied; source and selection are unchanged
    Failed { error: String },
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied { .. })
    }
}

/// One component being edited.
///
/// The session owns the only copy of the source. Edits go through
/// [`PatchChain::run`] one at a time, and the result replaces the source
/// only when a strategy succeeded.
pub struct EditorSession {
    source: String,
    selection: Option<ElementProperties>,
    chain: PatchChain,
}

impl EditorSession {
    pub fn new(source: impl Into<String>, chain: PatchChain) -> Self {
        Self {
            source: source.into(),
            selection: None,
            chain,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the source, e.g. after the user typed in the code pane.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub fn selection(&self) -> Option<&ElementProperties> {
        self.selection.as_ref()
    }

    pub fn select(&mut self, element: ElementProperties) {
        tracing::debug!(tag = %element.tag, "element selected");
        self.selection = Some(element);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Set one properties-panel field on the selected element.
    ///
    /// `name` is the camelCase field name (`color`, `fontSize`,
    /// `textContent`, ...). An empty value clears a style property. Text
    /// can only be set on an element without child elements.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<EditOutcome> {
        let property: Property = name.parse()?;
        let selection = self.selection.as_ref().ok_or(Error::NoSelection)?;
        if property == Property::TextContent && selection.has_child_elements {
            return Err(Error::TextNotEditable(selection.tag.clone()));
        }
        let update = selection.clone().with(property, value);
        self.apply(update)
    }

    /// Apply an edited descriptor of the selected element.
    ///
    /// The selection keeps its old text when the new text did not make it
    /// into the source. An edit that changes nothing else then fails.
    pub fn apply(&mut self, update: ElementProperties) -> Result<EditOutcome> {
        let target = self.selection.clone().ok_or(Error::NoSelection)?;
        let result = self.chain.run(&self.source, &target, &update);

        let code = match result.code {
            Some(code) if result.success => code,
            _ => {
                return Ok(EditOutcome::Failed {
                    error: result.error.unwrap_or_default(),
                });
            }
        };

        let mut selection = update;
        if target.text_change(&selection).is_some() && !self.text_written(&code, &selection) {
            if code == self.source {
                return Ok(EditOutcome::Failed {
                    error: Error::TextNotEditable(target.tag.clone()).to_string(),
                });
            }
            tracing::debug!(tag = %target.tag, "text not written, keeping selected text");
            selection.text_content = target.text_content.clone();
        }

        self.source = code;
        self.selection = Some(selection);
        Ok(EditOutcome::Applied {
            strategy: result.strategy.unwrap_or_default(),
        })
    }

    /// Whether `code` holds an element that `update` matches.
    fn text_written(&self, code: &str, update: &ElementProperties) -> bool {
        match self.chain.compiler().parse(code) {
            Ok(tree) => tree.find(update).is_some(),
            Err(_) => code.contains(update.text()),
        }
    }
}

//! Patching the element an instrumented preview identified by index.

use std::sync::Arc;

use super::{Strategy, patch_element};
use crate::compiler::SourceCompiler;
use crate::descriptor::ElementProperties;
use crate::tree::ElementId;
use crate::{Error, Result};

/// Uses the `source_id` carried by the descriptor instead of fuzzy matching.
///
/// Ids are element indices of the source the preview was compiled from, so
/// a stale id is caught by checking the tag. Without an id, or when the tag
/// disagrees, this fails and the rest of the chain runs.
pub struct SourceIdPatch {
    compiler: Arc<dyn SourceCompiler>,
}

impl SourceIdPatch {
    pub fn new(compiler: Arc<dyn SourceCompiler>) -> Self {
        Self { compiler }
    }
}

impl Strategy for SourceIdPatch {
    fn name(&self) -> &'static str {
        "source-id"
    }

    fn apply(
        &self,
        source: &str,
        target: &ElementProperties,
        update: &ElementProperties,
    ) -> Result<String> {
        let not_found = || Error::ElementNotFound {
            tag: target.tag.clone(),
            text: target.text().to_string(),
            available: Vec::new(),
        };
        let index = target.source_id.ok_or_else(not_found)?;

        let mut tree = self.compiler.parse(source)?;
        let id = ElementId(index as usize);
        match tree.element(id) {
            Some(node) if node.tag == target.tag => {}
            _ => return Err(not_found()),
        }

        patch_element(&mut tree, id, target, update)?;
        self.compiler.generate(&tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::OxcCompiler;

    fn source_id_patch() -> SourceIdPatch {
        SourceIdPatch::new(Arc::new(OxcCompiler::new()))
    }

    #[test]
    fn test_picks_element_by_index() {
        let source = "const A = () => <ul><li>Item</li><li>Item</li></ul>;";
        let target = ElementProperties::new("li").with_text("Item").with_source_id(2);
        let out = source_id_patch()
            .apply(source, &target, &target.clone().with_color("red"))
            .unwrap();
        assert_eq!(
            out,
            "const A = () => <ul><li>Item</li><li style={{color: 'red'}}>Item</li></ul>;"
        );
    }

    #[test]
    fn test_stale_id_fails() {
        let source = "const A = () => <ul><li>Item</li></ul>;";
        let target = ElementProperties::new("li").with_source_id(0);
        assert!(source_id_patch().apply(source, &target, &target).is_err());
    }

    #[test]
    fn test_without_id_fails() {
        let source = "const A = () => <p>Hi</p>;";
        let target = ElementProperties::new("p");
        assert!(matches!(
            source_id_patch().apply(source, &target, &target),
            Err(Error::ElementNotFound { .. })
        ));
    }
}

//! Patching through the source compiler's syntax tree.

use std::sync::Arc;

use super::{Strategy, patch_element};
use crate::Result;
use crate::compiler::SourceCompiler;
use crate::descriptor::ElementProperties;

/// Parses the source, finds the first matching element depth-first and
/// edits it. Fails without touching anything when the source doesn't parse
/// or no element matches.
pub struct TreePatch {
    compiler: Arc<dyn SourceCompiler>,
}

impl TreePatch {
    pub fn new(compiler: Arc<dyn SourceCompiler>) -> Self {
        Self { compiler }
    }
}

impl Strategy for TreePatch {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn apply(
        &self,
        source: &str,
        target: &ElementProperties,
        update: &ElementProperties,
    ) -> Result<String> {
        let mut tree = self.compiler.parse(source)?;
        let id = tree.find_or_err(target)?;
        tracing::trace!(element = id.0, tag = %target.tag, "matched element");

        patch_element(&mut tree, id, target, update)?;
        self.compiler.generate(&tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::compiler::OxcCompiler;

    fn tree_patch() -> TreePatch {
        TreePatch::new(Arc::new(OxcCompiler::new()))
    }

    #[test]
    fn test_opaque_style_wrapped() {
        let source = "const A = () => <p style={styles.lead}>Hi</p>;";
        let target = ElementProperties::new("p").with_text("Hi");
        let out = tree_patch()
            .apply(source, &target, &target.clone().with_color("red"))
            .unwrap();
        assert_eq!(
            out,
            "const A = () => <p style={{...styles.lead, color: 'red'}}>Hi</p>;"
        );
    }

    #[test]
    fn test_text_in_expression() {
        let source = "const A = () => <p>{'Hello'}</p>;";
        let target = ElementProperties::new("p").with_text("Hello");
        let out = tree_patch()
            .apply(source, &target, &target.clone().with_text("Bye"))
            .unwrap();
        assert_eq!(out, "const A = () => <p>{'Bye'}</p>;");
    }

    #[test]
    fn test_unparsable_source() {
        let target = ElementProperties::new("p");
        let err = tree_patch()
            .apply("const A = () => <p>;", &target, &target)
            .unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn test_fuzzy_text_across_children() {
        let source = "const A = () => <div>\n  <h1>Hello</h1>\n  <p>World</p>\n</div>;";
        let target = ElementProperties::new("div")
            .with_text("Hello World")
            .with_child_elements(true);
        let out = tree_patch()
            .apply(source, &target, &target.clone().with_color("red"))
            .unwrap();
        assert!(out.starts_with("const A = () => <div style={{color: 'red'}}>"));
    }
}

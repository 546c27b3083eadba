//! Deciding whether a source element is the element the user selected.
//!
//! There is no stable identity between a rendered node and the source that
//! produced it, so matching is by tag name plus fuzzy text: either side being
//! empty, or one trimmed text containing the other. Callers traverse in
//! source order and take the first match.

use crate::descriptor::ElementProperties;

/// Tag equality and [`text_matches`].
///
/// The target tag is already lowercase, so a component like `<Button>` never
/// matches a rendered `button`.
pub fn matches(tag: &str, text: &str, target: &ElementProperties) -> bool {
    tag == target.tag && text_matches(text, target.text())
}

/// Bidirectional containment on trimmed text. An empty side matches anything.
pub fn text_matches(candidate: &str, target: &str) -> bool {
    let candidate = candidate.trim();
    let target = target.trim();
    candidate.is_empty()
        || target.is_empty()
        || candidate.contains(target)
        || target.contains(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_must_match() {
        let target = ElementProperties::new("p").with_text("Hi");
        assert!(matches("p", "Hi", &target));
        assert!(!matches("span", "Hi", &target));
        assert!(!matches("P", "Hi", &target));
    }

    #[test]
    fn test_containment_both_ways() {
        assert!(text_matches("Hello React!", "Hello"));
        assert!(text_matches("Hello", "Hello React!"));
        assert!(text_matches("  Hello  ", "Hello"));
        assert!(!text_matches("Goodbye", "Hello"));
    }

    #[test]
    fn test_empty_side_matches() {
        assert!(text_matches("", "anything"));
        assert!(text_matches("anything", "   "));
    }

    #[test]
    fn test_target_without_text() {
        let target = ElementProperties::new("div");
        assert!(matches("div", "whatever is inside", &target));
    }
}

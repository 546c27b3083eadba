//! # restyle
//!
//! Round-trip source patching for a visual React component editor.
//!
//! A user clicks a rendered element, edits its inline style or text, and the
//! edit has to land back in the component's source text. restyle does that
//! with:
//! - **Descriptors**: [`ElementProperties`] snapshots extracted from rendered nodes
//! - **Matching**: tag + fuzzy text containment to find the element in source
//! - **Style merging**: in-place value updates and appends, never dropping keys
//! - **A strategy chain**: text window, syntax tree, then a final text-window retry
//! - **Preview plumbing**: export resolution and a debounced compile/mount driver
//!
//! ## Example
//!
//! ```
//! use restyle::{ElementProperties, PatchChain};
//!
//! let source = "function MyComponent(){ return <div style={{color:'red'}}>Hi</div>; }";
//! let target = ElementProperties::new("div").with_text("Hi").with_color("red");
//! let update = target.clone().with_color("blue");
//!
//! let result = PatchChain::standard().run(source, &target, &update);
//! assert!(result.code().unwrap().contains("color:'blue'"));
//! ```

mod color;
mod compiler;
mod descriptor;
mod edit;
mod editor;
mod extract;
mod matcher;
mod preview;
mod store;
mod strategy;
mod style;
mod text;
mod tree;

pub use color::normalize_color;
pub use compiler::{CompileOptions, CompiledComponent, OxcCompiler, SourceCompiler};
pub use descriptor::{ElementProperties, Property};
pub use edit::{TextEdit, apply_edits};
pub use editor::{EditOutcome, EditorSession};
pub use extract::{RenderedNode, StaticNode, extract};
pub use matcher::{matches, text_matches};
pub use preview::{
    DEFAULT_COMPONENT_NAMES, PreviewFrame, PreviewHandle, PreviewHost, PreviewOptions, Previewer,
    frame_for_source,
};
pub use store::{Component, ComponentStore, MemoryStore};
pub use strategy::{
    Fallback, PatchChain, PatchResult, SourceIdPatch, Strategy, StrategyFailure, TextWindow,
    TreePatch,
};
pub use style::{StyleBody, StyleEntry, StyleMap, StyleValue};
pub use tree::{ChildNode, ElementId, ElementNode, Span, StyleAttr, SyntaxTree};

/// Error type for restyle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source text could not be parsed or transpiled
    #[error("syntax error: {0}")]
    Syntax(String),

    /// No element in the source matched the target descriptor
    #[error(
        "element <{tag}> with text {text:?} not found (available tags: [{}])",
        available.join(", ")
    )]
    ElementNotFound {
        tag: String,
        text: String,
        available: Vec<String>,
    },

    /// The element's style attribute is not an object literal the text path can edit
    #[error("style attribute of <{0}> is not an editable object literal")]
    StyleNotEditable(String),

    /// The element's text is not plain text, so the text path cannot edit it
    #[error("text content of <{0}> is not plain text")]
    TextNotEditable(String),

    /// A preview host failed to evaluate compiled code
    #[error("runtime error: {0}")]
    Evaluation(String),

    /// A strategy panicked; the panic was contained at the chain boundary
    #[error("strategy '{strategy}' panicked: {message}")]
    StrategyPanicked {
        strategy: &'static str,
        message: String,
    },

    /// A search pattern could not be built
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Two recorded edits touch the same bytes
    #[error("overlapping edits at {0}..{1}")]
    OverlappingEdits(usize, usize),

    /// Property name is not one the editor knows about
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// An edit was requested with nothing selected
    #[error("no element selected")]
    NoSelection,

    /// Component code must not be empty
    #[error("component code must not be empty")]
    EmptyCode,

    /// No stored component has this id
    #[error("component not found: {0}")]
    ComponentNotFound(String),
}

/// Result type alias for restyle operations.
pub type Result<T> = std::result::Result<T, Error>;

//! The patch strategy chain.
//!
//! Each [`Strategy`] is one self-contained way of writing a descriptor edit
//! back into source text. [`PatchChain`] tries them in order and stops at the
//! first success. Strategies never see each other's partial work: each one
//! starts from the caller's source and either returns a complete new text or
//! an error.

mod source_id;
mod text_window;
mod tree_patch;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use facet::Facet;

pub use source_id::SourceIdPatch;
pub use text_window::TextWindow;
pub use tree_patch::TreePatch;

use crate::compiler::{OxcCompiler, SourceCompiler};
use crate::descriptor::ElementProperties;
use crate::tree::{ElementId, SyntaxTree};
use crate::{Error, Result};

/// One technique for applying `target -> update` to a source text.
pub trait Strategy: Send + Sync {
    /// Short name used in logs and patch results.
    fn name(&self) -> &'static str;

    /// The complete new source text, or why this strategy couldn't produce it.
    fn apply(
        &self,
        source: &str,
        target: &ElementProperties,
        update: &ElementProperties,
    ) -> Result<String>;
}

/// Re-runs a strategy under its own name, as the chain's last resort.
pub struct Fallback<S>(pub S);

impl<S: Strategy> Strategy for Fallback<S> {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn apply(
        &self,
        source: &str,
        target: &ElementProperties,
        update: &ElementProperties,
    ) -> Result<String> {
        self.0.apply(source, target, update)
    }
}

/// Why one strategy gave up.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: String,
}

/// Outcome of a chain run.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct PatchResult {
    pub success: bool,

    /// The whole new source; only set on success
    #[facet(default)]
    pub code: Option<String>,

    /// The last strategy's error; only set on failure
    #[facet(default)]
    pub error: Option<String>,

    /// Which strategy produced `code`
    #[facet(default)]
    pub strategy: Option<String>,

    /// Every strategy that was tried and failed, in order
    #[facet(default)]
    pub failures: Vec<StrategyFailure>,
}

impl PatchResult {
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The patched code, or `original` unchanged.
    pub fn code_or<'a>(&'a self, original: &'a str) -> &'a str {
        self.code().unwrap_or(original)
    }
}

/// Ordered strategies, tried until one succeeds.
pub struct PatchChain {
    compiler: Arc<dyn SourceCompiler>,
    strategies: Vec<Box<dyn Strategy>>,
}

impl PatchChain {
    /// Text window, then the syntax tree, then the text window again.
    pub fn new(compiler: Arc<dyn SourceCompiler>) -> Self {
        Self {
            strategies: vec![
                Box::new(TextWindow),
                Box::new(TreePatch::new(compiler.clone())),
                Box::new(Fallback(TextWindow)),
            ],
            compiler,
        }
    }

    /// [`PatchChain::new`] with an [`OxcCompiler`].
    pub fn standard() -> Self {
        Self::new(Arc::new(OxcCompiler::new()))
    }

    /// A chain of arbitrary strategies.
    pub fn from_strategies(
        compiler: Arc<dyn SourceCompiler>,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Self {
        Self {
            compiler,
            strategies,
        }
    }

    /// Try the element with the descriptor's source id before anything else.
    pub fn with_source_ids(mut self) -> Self {
        self.strategies
            .insert(0, Box::new(SourceIdPatch::new(self.compiler.clone())));
        self
    }

    pub fn compiler(&self) -> &Arc<dyn SourceCompiler> {
        &self.compiler
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain. Nothing a strategy does, panics included, escapes this
    /// call; on failure the result carries no code.
    pub fn run(
        &self,
        source: &str,
        target: &ElementProperties,
        update: &ElementProperties,
    ) -> PatchResult {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            tracing::debug!(strategy = name, tag = %target.tag, "trying strategy");

            let outcome = catch_unwind(AssertUnwindSafe(|| strategy.apply(source, target, update)))
                .unwrap_or_else(|payload| {
                    Err(Error::StrategyPanicked {
                        strategy: name,
                        message: panic_message(payload.as_ref()),
                    })
                });

            match outcome {
                Ok(code) => {
                    tracing::info!(strategy = name, tag = %target.tag, "patch applied");
                    return PatchResult {
                        success: true,
                        code: Some(code),
                        error: None,
                        strategy: Some(name.to_string()),
                        failures,
                    };
                }
                Err(error) => {
                    tracing::debug!(strategy = name, %error, "strategy failed");
                    failures.push(StrategyFailure {
                        strategy: name.to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }

        let error = failures
            .last()
            .map(|f| f.error.clone())
            .unwrap_or_else(|| "no strategies configured".to_string());
        tracing::warn!(tag = %target.tag, %error, "all strategies failed, source left unchanged");
        PatchResult {
            success: false,
            code: None,
            error: Some(error),
            strategy: None,
            failures,
        }
    }
}

impl Default for PatchChain {
    fn default() -> Self {
        Self::standard()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Apply a descriptor edit to one element of a parsed tree.
pub(crate) fn patch_element(
    tree: &mut SyntaxTree,
    id: ElementId,
    target: &ElementProperties,
    update: &ElementProperties,
) -> Result<()> {
    tree.apply_style(id, &update.style_map())?;
    if let Some(text) = target.text_change(update) {
        tree.replace_text(id, text)?;
    }
    Ok(())
}

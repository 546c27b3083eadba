//! Live preview: what to show for a source text, and a debounced driver
//! that keeps a host's rendered tree in sync with an edited source.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::Result;
use crate::compiler::{CompileOptions, SourceCompiler};

/// Names probed, in order, for the component to render.
pub const DEFAULT_COMPONENT_NAMES: [&str; 4] = ["MyComponent", "Component", "App", "Default"];

/// One state of the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewFrame {
    /// Nothing to render yet
    Placeholder,
    /// The source didn't compile; shown verbatim
    CompileError(String),
    /// The compiled code failed when the host evaluated it
    RuntimeError(String),
    /// Compiled fine, but nothing looks like a component
    ComponentNotFound { tried: Vec<String> },
    /// Evaluate `code` and mount the binding named `component`
    Mount { code: String, component: String },
}

impl fmt::Display for PreviewFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewFrame::Placeholder => f.write_str("nothing to preview"),
            PreviewFrame::CompileError(e) => write!(f, "compilation error: {e}"),
            PreviewFrame::RuntimeError(e) => write!(f, "runtime error: {e}"),
            PreviewFrame::ComponentNotFound { tried } => write!(
                f,
                "component not found: name it one of {}, \
                 or declare a function starting with a capital letter",
                tried.join(", ")
            ),
            PreviewFrame::Mount { component, code } => {
                write!(f, "mount <{component} /> ({} bytes)", code.len())
            }
        }
    }
}

/// Decide what the preview shows for `source`.
pub fn frame_for_source(
    compiler: &dyn SourceCompiler,
    source: &str,
    options: &CompileOptions,
) -> PreviewFrame {
    if source.trim().is_empty() {
        return PreviewFrame::Placeholder;
    }
    match compiler.compile_for_execution(source, options) {
        Err(e) => PreviewFrame::CompileError(e.to_string()),
        Ok(compiled) => match compiled.component {
            Some(component) => PreviewFrame::Mount {
                code: compiled.code,
                component,
            },
            None => PreviewFrame::ComponentNotFound {
                tried: options.component_names.clone(),
            },
        },
    }
}

/// Where frames end up: a DOM container, a terminal, a test log.
pub trait PreviewHost: Send + 'static {
    /// Tear down whatever is currently rendered. Must be complete on return.
    fn unmount(&mut self);

    /// Show a frame. A host that evaluates code reports failures as
    /// [`Error::Evaluation`](crate::Error::Evaluation).
    fn present(&mut self, frame: &PreviewFrame) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// How long the source must stay unchanged before it is rendered
    pub quiet_period: Duration,
    pub compile: CompileOptions,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(500),
            compile: CompileOptions::default(),
        }
    }
}

/// Spawns preview tasks.
pub struct Previewer;

impl Previewer {
    /// Start a preview task on the current tokio runtime.
    ///
    /// Every [`PreviewHandle::update`] restarts the quiet period; only the
    /// latest source is rendered once it elapses. Superseded sources are
    /// dropped without being compiled.
    pub fn spawn<H: PreviewHost>(
        compiler: Arc<dyn SourceCompiler>,
        host: H,
        options: PreviewOptions,
    ) -> PreviewHandle {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run(compiler, host, options, rx));
        PreviewHandle { tx, task }
    }
}

/// Feeds sources to a running preview task.
pub struct PreviewHandle {
    tx: watch::Sender<Option<String>>,
    task: JoinHandle<()>,
}

impl PreviewHandle {
    pub fn update(&self, source: impl Into<String>) {
        self.tx.send_replace(Some(source.into()));
    }

    /// Stop the task. A change still in its quiet period is discarded.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "preview task ended abnormally");
        }
    }
}

async fn run<H: PreviewHost>(
    compiler: Arc<dyn SourceCompiler>,
    mut host: H,
    options: PreviewOptions,
    mut rx: watch::Receiver<Option<String>>,
) {
    let mut pending = false;
    let sleep = sleep_until(Instant::now() + options.quiet_period);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                pending = true;
                sleep.as_mut().reset(Instant::now() + options.quiet_period);
            }
            () = &mut sleep, if pending => {
                pending = false;
                let source = rx.borrow_and_update().clone().unwrap_or_default();
                render(compiler.as_ref(), &mut host, &source, &options.compile);
            }
        }
    }
    tracing::debug!("preview task stopped");
}

fn render<H: PreviewHost>(
    compiler: &dyn SourceCompiler,
    host: &mut H,
    source: &str,
    options: &CompileOptions,
) {
    let frame = frame_for_source(compiler, source, options);
    tracing::debug!(%frame, "rendering preview");

    host.unmount();
    if let Err(error) = host.present(&frame) {
        tracing::warn!(%error, "preview failed to render");
        host.unmount();
        let fallback = PreviewFrame::RuntimeError(error.to_string());
        if let Err(error) = host.present(&fallback) {
            tracing::warn!(%error, "preview host rejected error frame");
        }
    }
}

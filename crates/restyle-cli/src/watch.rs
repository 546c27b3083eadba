//! Terminal live preview driven by filesystem events.

use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, eyre};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use owo_colors::OwoColorize;
use restyle::{OxcCompiler, PreviewFrame, PreviewHost, Previewer};
use tokio::sync::mpsc;

use crate::config::ResolvedConfig;

/// Prints each frame instead of mounting it.
struct TerminalHost {
    file: Utf8PathBuf,
}

impl PreviewHost for TerminalHost {
    fn unmount(&mut self) {}

    fn present(&mut self, frame: &PreviewFrame) -> restyle::Result<()> {
        match frame {
            PreviewFrame::Mount { .. } => {
                eprintln!("{} {}: {}", "ok".green().bold(), self.file, frame)
            }
            PreviewFrame::Placeholder => eprintln!("{} {}", self.file, frame.dimmed()),
            _ => eprintln!("{} {}: {}", "error".red().bold(), self.file, frame),
        }
        Ok(())
    }
}

pub fn run(config: &ResolvedConfig, file: Utf8PathBuf) -> Result<ExitCode> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(watch(config, file))?;
    Ok(ExitCode::SUCCESS)
}

async fn watch(config: &ResolvedConfig, file: Utf8PathBuf) -> Result<()> {
    let (_watcher, mut changes) = start_watcher(&file)?;

    let host = TerminalHost { file: file.clone() };
    let handle = Previewer::spawn(
        Arc::new(OxcCompiler::new()),
        host,
        config.preview_options(),
    );
    handle.update(read_source(&file)?);
    tracing::info!(%file, quiet_period = ?config.quiet_period, "watching");

    loop {
        tokio::select! {
            change = changes.recv() => {
                if change.is_none() {
                    break;
                }
                match read_source(&file) {
                    Ok(source) => handle.update(source),
                    Err(e) => tracing::warn!(error = %e, "failed to read source"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.close().await;
    Ok(())
}

fn read_source(file: &Utf8Path) -> Result<String> {
    fs::read_to_string(file).map_err(|e| eyre!("Failed to read {}: {}", file, e))
}

/// Watch the file's directory; editors often replace files instead of
/// writing them in place.
fn start_watcher(file: &Utf8Path) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>)> {
    let dir = match file.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir.to_owned(),
        _ => Utf8PathBuf::from("."),
    };
    let name = file
        .file_name()
        .ok_or_else(|| eyre!("{} is not a file", file))?
        .to_owned();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if is_relevant(&event, &name) {
                let _ = tx.send(());
            }
        }
        Err(e) => tracing::warn!(error = %e, "watch error"),
    })
    .map_err(|e| eyre!("Failed to initialize filesystem watcher: {}", e))?;

    watcher
        .watch(dir.as_std_path(), RecursiveMode::NonRecursive)
        .map_err(|e| eyre!("Failed to watch {}: {}", dir, e))?;

    Ok((watcher, rx))
}

fn is_relevant(event: &Event, name: &str) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_)
    ) && event
        .paths
        .iter()
        .any(|path| path.file_name().is_some_and(|n| n == name))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    use super::*;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevant_events() {
        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/src/Card.jsx"),
            "Card.jsx"
        ));
        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), "/src/Card.jsx"),
            "Card.jsx"
        ));
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/src/Other.jsx"),
            "Card.jsx"
        ));
        assert!(!is_relevant(
            &event(EventKind::Remove(RemoveKind::File), "/src/Card.jsx"),
            "Card.jsx"
        ));
    }
}

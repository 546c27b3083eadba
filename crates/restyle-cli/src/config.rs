//! Configuration file discovery
//!
//! Searches for `.config/restyle.yaml` walking up from the current directory.
//! The project root is the parent of `.config/`.

use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, eyre};
use restyle::{CompileOptions, OxcCompiler, PatchChain, PreviewOptions};
use restyle_config::RestyleConfig;

const CONFIG_DIR: &str = ".config";
const CONFIG_FILE_YAML: &str = "restyle.yaml";

/// Configuration with defaults filled in
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub quiet_period: Duration,
    pub component_names: Vec<String>,
    pub source_ids: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve(RestyleConfig::default())
    }
}

impl ResolvedConfig {
    /// Discover and load configuration from the current directory, falling
    /// back to defaults when there is no config file.
    pub fn discover() -> Result<Self> {
        match find_config_file()? {
            Some(path) => load_config(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn compile_options(&self, instrument: bool) -> CompileOptions {
        CompileOptions {
            instrument,
            component_names: self.component_names.clone(),
        }
    }

    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            quiet_period: self.quiet_period,
            compile: self.compile_options(self.source_ids),
        }
    }

    pub fn patch_chain(&self, compiler: Arc<OxcCompiler>) -> PatchChain {
        let chain = PatchChain::new(compiler);
        if self.source_ids {
            chain.with_source_ids()
        } else {
            chain
        }
    }
}

/// Search for `.config/restyle.yaml` walking up from current directory
fn find_config_file() -> Result<Option<Utf8PathBuf>> {
    let cwd = env::current_dir()?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
        eyre!(
            "Current directory is not valid UTF-8: {}",
            e.as_path().display()
        )
    })?;

    let mut current = cwd.as_path();
    loop {
        let yaml_file = current.join(CONFIG_DIR).join(CONFIG_FILE_YAML);
        if yaml_file.exists() {
            return Ok(Some(yaml_file));
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    }
}

fn load_config(config_path: &Utf8Path) -> Result<ResolvedConfig> {
    let content = fs::read_to_string(config_path)?;
    let config = parse_config(&content).map_err(|e| eyre!("Failed to parse {}: {}", config_path, e))?;

    // Project root is the parent of .config/
    let root = config_path
        .parent()
        .ok_or_else(|| eyre!("Config file has no parent directory"))?
        .parent()
        .ok_or_else(|| eyre!(".config directory has no parent"))?;

    tracing::debug!(%config_path, %root, "loaded configuration");
    Ok(resolve(config))
}

fn parse_config(content: &str) -> Result<RestyleConfig> {
    facet_yaml::from_str(content).map_err(|e| eyre!("{}", e))
}

fn resolve(config: RestyleConfig) -> ResolvedConfig {
    let component_names = match config.component_names() {
        Some(names) => names.to_vec(),
        None => CompileOptions::default().component_names,
    };

    ResolvedConfig {
        quiet_period: Duration::from_millis(config.quiet_period_ms()),
        component_names,
        source_ids: config.source_ids(),
    }
}

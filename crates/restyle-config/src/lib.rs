//! Configuration types for restyle.
//!
//! These structs are parsed from `.config/restyle.yaml`. Every field is
//! optional; the accessors return the value to use when one is missing.

use facet::Facet;

/// Default quiet period before a changed source is rendered.
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 500;

/// restyle configuration from `.config/restyle.yaml`
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "snake_case")]
pub struct RestyleConfig {
    /// Live preview settings
    #[facet(default)]
    pub preview: Option<PreviewConfig>,

    /// Patch chain settings
    #[facet(default)]
    pub patch: Option<PatchConfig>,
}

/// Live preview configuration
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "snake_case")]
pub struct PreviewConfig {
    /// Debounce before compiling and mounting (milliseconds)
    /// Default: 500ms
    #[facet(default)]
    pub quiet_period_ms: Option<u64>,

    /// Names probed, in order, for the component to render
    /// Default: MyComponent, Component, App, Default
    #[facet(default)]
    pub component_names: Option<Vec<String>>,
}

/// Patch chain configuration
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "snake_case")]
pub struct PatchConfig {
    /// Try elements by their `data-source-id` before fuzzy matching
    #[facet(default)]
    pub source_ids: Option<bool>,
}

impl RestyleConfig {
    pub fn quiet_period_ms(&self) -> u64 {
        self.preview
            .as_ref()
            .and_then(|p| p.quiet_period_ms)
            .unwrap_or(DEFAULT_QUIET_PERIOD_MS)
    }

    /// Configured component names, if any were given.
    pub fn component_names(&self) -> Option<&[String]> {
        self.preview
            .as_ref()
            .and_then(|p| p.component_names.as_deref())
            .filter(|names| !names.is_empty())
    }

    pub fn source_ids(&self) -> bool {
        self.patch
            .as_ref()
            .and_then(|p| p.source_ids)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RestyleConfig::default();
        assert_eq!(config.quiet_period_ms(), 500);
        assert!(config.component_names().is_none());
        assert!(!config.source_ids());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
preview:
  quiet_period_ms: 250
  component_names:
    - Widget
    - App
patch:
  source_ids: true
"#;

        let config: RestyleConfig = facet_yaml::from_str(yaml).unwrap();
        assert_eq!(config.quiet_period_ms(), 250);
        assert_eq!(
            config.component_names(),
            Some(&["Widget".to_string(), "App".to_string()][..])
        );
        assert!(config.source_ids());
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
patch:
  source_ids: false
"#;

        let config: RestyleConfig = facet_yaml::from_str(yaml).unwrap();
        assert!(config.preview.is_none());
        assert_eq!(config.quiet_period_ms(), DEFAULT_QUIET_PERIOD_MS);
    }
}

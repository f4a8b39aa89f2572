use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = ".cemgenrc.json";

/// Declaration-only files never contribute custom-element declarations, so
/// they are excluded from scanning unless `noDefaultExcludes` is set.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["**/*.d.ts", "**/*.d.mts", "**/*.d.cts"];

/// Design-tokens integration options.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignTokensConfig {
    /// Path (or npm spec) of the DTCG token document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,

    /// Only CSS custom properties with this prefix are matched against tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Demo-link discovery options.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DemoDiscoveryConfig {
    /// Glob matching demo files, relative to the source root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_glob: Option<String>,

    /// Regex applied to a demo file path; its first capture group (or a
    /// `(?<tag>...)` named group) yields the element tag name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,

    /// Template for the published demo URL. `{tag}` and `{path}` expand to
    /// the extracted tag name and the workspace-relative demo path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Globs selecting the source files to analyze.
    #[serde(default = "default_files")]
    pub files: Vec<String>,

    /// Globs subtracted from the input set.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Disable the built-in exclusion of declaration-only (`.d.ts`) files.
    #[serde(default)]
    pub no_default_excludes: bool,

    /// Where to write the manifest; `-` means stdout.
    #[serde(default = "default_output")]
    pub output: String,

    /// Source code root directory.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    #[serde(default, skip_serializing_if = "design_tokens_is_empty")]
    pub design_tokens: DesignTokensConfig,

    #[serde(default, skip_serializing_if = "demo_discovery_is_empty")]
    pub demo_discovery: DemoDiscoveryConfig,

    /// Base URL of the repository; declarations get `source.href` links
    /// derived from it when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_control_root_url: Option<String>,

    /// Affected-set size above which an incremental rebuild falls back to a
    /// full one.
    #[serde(default = "default_incremental_threshold")]
    pub incremental_threshold: usize,

    /// Quiet window the watcher waits for before rebuilding, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Events arriving within this many milliseconds of watch start are
    /// ignored (initial watcher flood).
    #[serde(default)]
    pub grace_period_ms: u64,
}

fn design_tokens_is_empty(c: &DesignTokensConfig) -> bool {
    *c == DesignTokensConfig::default()
}

fn demo_discovery_is_empty(c: &DemoDiscoveryConfig) -> bool {
    *c == DemoDiscoveryConfig::default()
}

fn default_files() -> Vec<String> {
    vec!["src/**/*.ts".to_string(), "src/**/*.js".to_string()]
}

fn default_output() -> String {
    "custom-elements.json".to_string()
}

fn default_source_root() -> String {
    "./".to_string()
}

fn default_incremental_threshold() -> usize {
    3
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            files: default_files(),
            exclude: Vec::new(),
            no_default_excludes: false,
            output: default_output(),
            source_root: default_source_root(),
            design_tokens: DesignTokensConfig::default(),
            demo_discovery: DemoDiscoveryConfig::default(),
            source_control_root_url: None,
            incremental_threshold: default_incremental_threshold(),
            debounce_ms: default_debounce_ms(),
            grace_period_ms: 0,
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob pattern in `files` or `exclude` is
    /// invalid, or if the demo url pattern is not a valid regex.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.files {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'files': \"{}\"", pattern))?;
        }

        for pattern in &self.exclude {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'exclude': \"{}\"", pattern))?;
        }

        if let Some(glob) = &self.demo_discovery.file_glob {
            Pattern::new(glob).with_context(|| {
                format!(
                    "Invalid glob pattern in 'demoDiscovery.fileGlob': \"{}\"",
                    glob
                )
            })?;
        }

        if let Some(pattern) = &self.demo_discovery.url_pattern {
            regex::Regex::new(pattern).with_context(|| {
                format!("Invalid regex in 'demoDiscovery.urlPattern': \"{}\"", pattern)
            })?;
        }

        Ok(())
    }

    /// The exclude patterns in effect: user excludes plus the built-in
    /// declaration-file excludes unless disabled.
    pub fn effective_excludes(&self) -> Vec<String> {
        let mut patterns = self.exclude.clone();
        if !self.no_default_excludes {
            patterns.extend(DEFAULT_EXCLUDE_PATTERNS.iter().map(|p| p.to_string()));
        }
        patterns
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.exclude.is_empty());
        assert!(!config.files.is_empty());
        assert_eq!(config.output, "custom-elements.json");
        assert_eq!(config.incremental_threshold, 3);
        assert_eq!(config.debounce_ms, 100);
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
              "files": ["elements/**/*.ts"],
              "exclude": ["**/*.stories.ts"],
              "output": "-"
          }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.files, vec!["elements/**/*.ts"]);
        assert_eq!(config.exclude, vec!["**/*.stories.ts"]);
        assert_eq!(config.output, "-");
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{ "exclude": ["**/dist/**"] }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.exclude, vec!["**/dist/**"]);
        assert_eq!(config.files, default_files());
        assert_eq!(config.output, default_output());
    }

    #[test]
    fn test_nested_sections() {
        let json = r#"{
            "designTokens": { "spec": "./tokens.json", "prefix": "--my" },
            "demoDiscovery": {
                "fileGlob": "demos/**/*.html",
                "urlPattern": "demos/(?<tag>[\\w-]+)\\.html",
                "urlTemplate": "https://example.com/demos/{tag}/"
            },
            "sourceControlRootUrl": "https://github.com/acme/elements/tree/main/"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.design_tokens.spec.as_deref(), Some("./tokens.json"));
        assert_eq!(config.design_tokens.prefix.as_deref(), Some("--my"));
        assert_eq!(
            config.demo_discovery.file_glob.as_deref(),
            Some("demos/**/*.html")
        );
        assert!(config.source_control_root_url.is_some());
    }

    #[test]
    fn test_effective_excludes_include_declaration_files() {
        let config = Config::default();
        let excludes = config.effective_excludes();
        assert!(excludes.iter().any(|p| p == "**/*.d.ts"));
    }

    #[test]
    fn test_no_default_excludes() {
        let config = Config {
            no_default_excludes: true,
            exclude: vec!["**/dist/**".to_string()],
            ..Default::default()
        };
        assert_eq!(config.effective_excludes(), vec!["**/dist/**"]);
    }

    #[test]
    fn test_find_config_file() {
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("src").join("elements");
        fs::create_dir_all(&sub_dir).unwrap();

        let config_path = dir.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).unwrap();

        let found = find_config_file(&sub_dir);
        assert!(found.is_some());
        assert_eq!(found.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let found = find_config_file(dir.path());
        assert!(found.is_none());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&config_path, r#"{ "files": ["lib/**/*.js"] }"#).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(result.from_file);
        assert_eq!(result.config.files, vec!["lib/**/*.js"]);
    }

    #[test]
    fn test_load_config_default_when_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let result = load_config(dir.path()).unwrap();
        assert!(!result.from_file);
        assert_eq!(result.config.files, default_files());
    }

    #[test]
    fn test_validate_invalid_file_pattern() {
        let config = Config {
            files: vec!["[invalid".to_string()], // unclosed bracket
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("files"));
    }

    #[test]
    fn test_validate_invalid_demo_regex() {
        let config = Config {
            demo_discovery: DemoDiscoveryConfig {
                url_pattern: Some("(unclosed".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("urlPattern"));
    }

    #[test]
    fn test_load_config_with_invalid_pattern_fails() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        fs::write(&config_path, r#"{ "exclude": ["[invalid"] }"#).unwrap();

        let result = load_config(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_omits_empty_sections() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("designTokens"));
        assert!(!json.contains("demoDiscovery"));
        assert!(json.contains("incrementalThreshold"));
    }
}

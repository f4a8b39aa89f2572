//! Demo-link discovery.
//!
//! Demo files are matched by a configured glob; the element tag name is
//! pulled out of each path with the configured regex (a `(?<tag>…)` named
//! group or the first capture group), and the published URL comes from the
//! URL template, which expands `{tag}` and `{path}`.

use std::collections::HashMap;
use std::path::Path;

use glob::Pattern;
use regex::Regex;
use walkdir::WalkDir;

use crate::config::DemoDiscoveryConfig;
use crate::manifest::types::Demo;

/// Discover demo links, keyed by element tag name.
pub fn discover_demos(root: &Path, config: &DemoDiscoveryConfig) -> HashMap<String, Vec<Demo>> {
    let mut demos: HashMap<String, Vec<Demo>> = HashMap::new();

    let Some(file_glob) = &config.file_glob else {
        return demos;
    };
    let Ok(pattern) = Pattern::new(file_glob) else {
        return demos;
    };
    let url_pattern = config
        .url_pattern
        .as_deref()
        .and_then(|p| Regex::new(p).ok());

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if !pattern.matches(&relative) {
            continue;
        }

        let Some(tag) = extract_tag(url_pattern.as_ref(), &relative) else {
            continue;
        };

        let url = match &config.url_template {
            Some(template) => template.replace("{tag}", &tag).replace("{path}", &relative),
            None => relative.clone(),
        };

        demos.entry(tag).or_default().push(Demo {
            url,
            description: None,
        });
    }

    for list in demos.values_mut() {
        list.sort_by(|a, b| a.url.cmp(&b.url));
        list.dedup_by(|a, b| a.url == b.url);
    }

    demos
}

fn extract_tag(pattern: Option<&Regex>, relative: &str) -> Option<String> {
    let pattern = pattern?;
    let captures = pattern.captures(relative)?;
    captures
        .name("tag")
        .or_else(|| captures.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn config() -> DemoDiscoveryConfig {
        DemoDiscoveryConfig {
            file_glob: Some("demos/**/*.html".to_string()),
            url_pattern: Some(r"demos/(?<tag>[\w-]+)\.html".to_string()),
            url_template: Some("https://example.com/elements/{tag}/demo/".to_string()),
        }
    }

    #[test]
    fn test_discovers_and_templates_urls() {
        let dir = tempdir().unwrap();
        let demos_dir = dir.path().join("demos");
        fs::create_dir(&demos_dir).unwrap();
        fs::write(demos_dir.join("a-x.html"), "<a-x></a-x>").unwrap();
        fs::write(demos_dir.join("readme.md"), "not a demo").unwrap();

        let demos = discover_demos(dir.path(), &config());

        assert_eq!(demos.len(), 1);
        assert_eq!(
            demos["a-x"][0].url,
            "https://example.com/elements/a-x/demo/"
        );
    }

    #[test]
    fn test_no_glob_means_no_demos() {
        let dir = tempdir().unwrap();
        let demos = discover_demos(dir.path(), &DemoDiscoveryConfig::default());
        assert!(demos.is_empty());
    }

    #[test]
    fn test_path_placeholder() {
        let dir = tempdir().unwrap();
        let demos_dir = dir.path().join("demos");
        fs::create_dir(&demos_dir).unwrap();
        fs::write(demos_dir.join("x-y.html"), "").unwrap();

        let config = DemoDiscoveryConfig {
            file_glob: Some("demos/**/*.html".to_string()),
            url_pattern: Some(r"demos/([\w-]+)\.html".to_string()),
            url_template: Some("https://example.com/{path}".to_string()),
        };
        let demos = discover_demos(dir.path(), &config);
        assert_eq!(demos["x-y"][0].url, "https://example.com/demos/x-y.html");
    }
}

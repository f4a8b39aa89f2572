use std::path::{Component, Path, PathBuf};

/// Extensions that rewrite to `.js` in module paths. Authored TypeScript is
/// published as JavaScript, and the manifest describes the published package.
const TS_FAMILY: &[&str] = &["ts", "tsx", "mts", "cts", "jsx"];

/// Compute the canonical module path for a source file.
///
/// Module paths are workspace-relative, use `/` separators on every platform,
/// and normalize TypeScript-family extensions to `.js`. They are the primary
/// key space of the manifest.
pub fn module_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);

    let mut segments: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            // ".." segments are kept literally; inputs outside the root are
            // the caller's problem and must still map stably.
            Component::ParentDir => segments.push("..".to_string()),
            Component::RootDir | Component::Prefix(_) => segments.clear(),
        }
    }

    normalize_extension(&segments.join("/"))
}

/// Rewrite a TypeScript-family extension to `.js`; other paths pass through.
pub fn normalize_extension(path: &str) -> String {
    if let Some(dot) = path.rfind('.') {
        let ext = &path[dot + 1..];
        if TS_FAMILY.contains(&ext) {
            return format!("{}.js", &path[..dot]);
        }
    }
    path.to_string()
}

/// Resolve a relative import specifier to an on-disk source file.
///
/// Only relative specifiers participate in the local dependency graph; bare
/// specifiers are package imports. Tries the specifier verbatim, then with
/// source extensions, then as a directory index. A specifier written with a
/// `.js` extension also resolves to its `.ts` source (the idiomatic
/// `import './x.js'` style in TypeScript packages).
pub fn resolve_import_path(current_file: &Path, specifier: &str) -> Option<PathBuf> {
    if !specifier.starts_with('.') {
        return None;
    }

    let base_dir = current_file.parent()?;
    // Strip leading "./" to avoid joined paths like "src/./button.ts"
    let normalized = specifier.strip_prefix("./").unwrap_or(specifier);
    let resolved = base_dir.join(normalized);

    if resolved.is_file() {
        return Some(resolved);
    }

    // `import './button.js'` referring to `button.ts` on disk
    if let Some(ext) = resolved.extension().and_then(|e| e.to_str())
        && matches!(ext, "js" | "mjs" | "jsx")
    {
        for source_ext in &["ts", "tsx", "mts", "cts"] {
            let with_ext = resolved.with_extension(source_ext);
            if with_ext.is_file() {
                return Some(with_ext);
            }
        }
    }

    for ext in &["ts", "tsx", "js", "jsx", "mjs", "css"] {
        let with_ext = resolved.with_extension(ext);
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }

    for ext in &["ts", "tsx", "js", "jsx"] {
        let index_path = resolved.join(format!("index.{}", ext));
        if index_path.is_file() {
            return Some(index_path);
        }
    }

    None
}

/// True when the specifier names a CSS file (a stylesheet import).
pub fn is_css_specifier(specifier: &str) -> bool {
    specifier.ends_with(".css")
}

//! The generation coordinator.
//!
//! A [`Session`] owns the query pool, the worker pool, the dependency
//! tracker, the CSS cache, and the current manifest snapshot. `generate`
//! computes everything on locals and commits (manifest swap plus tracker
//! updates) only at the very end, so cancellation and worker panics leave
//! the previous state fully intact.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use crate::config::Config;
use crate::design_tokens::DesignTokens;
use crate::engine::cancel::CancelToken;
use crate::engine::css::CssAnalyzer;
use crate::engine::demo;
use crate::engine::diagnostics::{EngineError, SourceDiagnostic};
use crate::engine::processor::{self, InlineStyle, ProcessedModule, TypeSymbol};
use crate::engine::query_pool::QueryPool;
use crate::engine::tracker::{BuildMode, DependencyTracker};
use crate::engine::type_resolver;
use crate::manifest::types::{Demo, Module, Package, SourceReference};
use crate::manifest::{ModuleIndex, assemble};
use crate::utils::content_hash;
use crate::workspace::file_scanner::scan_files;
use crate::workspace::module_path::module_path;

/// Worker-pool bounds: a floor of 2 keeps small machines parallel, the
/// ceiling bounds memory (each busy worker retains a parse tree).
const MIN_WORKERS: usize = 2;
const MAX_WORKERS: usize = 8;

/// One generation outcome: a best-effort manifest plus everything that went
/// wrong while producing it.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub manifest: Arc<Package>,
    pub diagnostics: Vec<SourceDiagnostic>,
    pub mode: BuildMode,
}

/// Retained per-module processing output, reused for unaffected modules on
/// incremental runs.
#[derive(Debug, Clone)]
struct ModuleArtifacts {
    module: Module,
    symbols: Vec<TypeSymbol>,
    dependencies: BTreeSet<PathBuf>,
    css_dependencies: BTreeSet<PathBuf>,
    inline_styles: Vec<InlineStyle>,
    diagnostics: Vec<SourceDiagnostic>,
    hash: String,
    source_path: PathBuf,
}

#[derive(Default)]
struct EngineState {
    artifacts: BTreeMap<String, ModuleArtifacts>,
    tracker: DependencyTracker,
}

pub struct Session {
    config: Config,
    root: PathBuf,
    pool: Arc<QueryPool>,
    workers: rayon::ThreadPool,
    css: CssAnalyzer,
    tokens: Option<DesignTokens>,
    demos: HashMap<String, Vec<Demo>>,
    state: RwLock<EngineState>,
    current: RwLock<Option<Arc<Package>>>,
    current_index: RwLock<Option<Arc<ModuleIndex>>>,
    /// Serializes generations; readers are never blocked by it.
    generation: Mutex<()>,
}

impl Session {
    /// Initialize a session: load grammars, compile queries, size the worker
    /// pool, load design tokens, discover demos. Failures here are fatal.
    pub fn new(config: Config, root: PathBuf) -> Result<Self, EngineError> {
        let worker_count = num_cpus::get().clamp(MIN_WORKERS, MAX_WORKERS);

        let pool = Arc::new(QueryPool::new(worker_count)?);
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .build()
            .map_err(|e| EngineError::Initialization(format!("worker pool: {}", e)))?;

        let tokens = match &config.design_tokens.spec {
            Some(spec) => Some(
                DesignTokens::load(&root.join(spec), config.design_tokens.prefix.clone())
                    .map_err(|e| EngineError::Initialization(e.to_string()))?,
            ),
            None => None,
        };

        let demos = demo::discover_demos(&root, &config.demo_discovery);

        Ok(Self {
            config,
            root,
            pool,
            workers,
            css: CssAnalyzer::new(),
            tokens,
            demos,
            state: RwLock::new(EngineState::default()),
            current: RwLock::new(None),
            current_index: RwLock::new(None),
            generation: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Thread-safe snapshot of the current manifest. Readers never observe a
    /// half-updated manifest: replacement is an atomic handle swap.
    pub fn current_manifest(&self) -> Option<Arc<Package>> {
        self.current.read().clone()
    }

    /// O(1) module lookup into the current manifest.
    pub fn lookup_module(&self, path: &str) -> Option<Module> {
        let manifest = self.current.read().clone()?;
        let index = self.current_index.read().clone()?;
        index.get(&manifest, path).cloned()
    }

    /// Does a filesystem path participate in this workspace? Used by the
    /// watcher to drop unrelated events. Stylesheets count when a tracked
    /// module imports them.
    pub fn watches_path(&self, path: &Path) -> bool {
        if crate::workspace::file_scanner::path_matches(
            &self.root,
            path,
            &self.config.files,
            &self.config.effective_excludes(),
        ) {
            return true;
        }
        path.extension().and_then(|e| e.to_str()) == Some("css")
            && !self.state.read().tracker.modules_for_css(path).is_empty()
    }

    /// Generate the manifest. With a current manifest present, changes are
    /// detected by re-hashing the scanned inputs; otherwise the build is
    /// full. Blocks until the manifest is ready.
    pub fn generate(&self, token: &CancelToken) -> Result<GenerateResult, EngineError> {
        self.run_generation(None, token)
    }

    /// Generate after a batch of known filesystem changes (watch mode).
    pub fn generate_with_changes(
        &self,
        changed: &[PathBuf],
        token: &CancelToken,
    ) -> Result<GenerateResult, EngineError> {
        self.run_generation(Some(changed.to_vec()), token)
    }

    fn run_generation(
        &self,
        changed_hint: Option<Vec<PathBuf>>,
        token: &CancelToken,
    ) -> Result<GenerateResult, EngineError> {
        let _guard = self.generation.lock();

        if token.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let scan = scan_files(
            &self.root,
            &self.config.files,
            &self.config.effective_excludes(),
            false,
        );
        let inputs: Vec<PathBuf> = scan.files.into_iter().collect();

        let plan = self.plan(&inputs, changed_hint)?;

        if token.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        // Parse affected files on the worker pool. A panicking worker aborts
        // this attempt; previous state stays current.
        let processed = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.workers.install(|| {
                plan.to_process
                    .par_iter()
                    .map(|path| {
                        if token.is_cancelled() {
                            return None;
                        }
                        Some(self.process_one(path))
                    })
                    .collect::<Vec<_>>()
            })
        }))
        .map_err(|_| EngineError::WorkerPanic)?;

        if token.is_cancelled() || processed.iter().any(Option::is_none) {
            return Err(EngineError::Cancelled);
        }
        let processed: Vec<(ModuleArtifacts, String)> =
            processed.into_iter().flatten().collect();

        // Merge fresh artifacts over the reused ones.
        let mut artifacts: BTreeMap<String, ModuleArtifacts> = plan.reused;
        for (artifact, path) in processed {
            artifacts.insert(path, artifact);
        }

        if token.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let (package, index, diagnostics) = self.post_process(&artifacts);
        let manifest = Arc::new(package);

        // Commit point: everything above worked on locals.
        {
            let mut state = self.state.write();
            for removed in &plan.removed {
                state.tracker.remove(removed);
                state.artifacts.remove(removed);
            }
            for (path, artifact) in &artifacts {
                let dependency_modules: BTreeSet<String> = artifact
                    .dependencies
                    .iter()
                    .map(|p| module_path(&self.root, p))
                    .collect();
                state.tracker.update(
                    path,
                    artifact.hash.clone(),
                    dependency_modules,
                    artifact.css_dependencies.clone(),
                );
            }
            state.artifacts = artifacts;
            if plan.mode == BuildMode::Full {
                state.tracker.clear_force_full();
            }
        }
        *self.current.write() = Some(Arc::clone(&manifest));
        *self.current_index.write() = Some(Arc::new(index));

        Ok(GenerateResult {
            manifest,
            diagnostics,
            mode: plan.mode,
        })
    }

    /// Work out what this generation must do: which module paths to
    /// re-process, which prior artifacts to reuse, and which tracked modules
    /// disappeared.
    fn plan(
        &self,
        inputs: &[PathBuf],
        changed_hint: Option<Vec<PathBuf>>,
    ) -> Result<GenerationPlan, EngineError> {
        let manifest_exists = self.current.read().is_some();
        let state = self.state.read();

        let input_modules: BTreeMap<String, PathBuf> = inputs
            .iter()
            .map(|p| (module_path(&self.root, p), p.clone()))
            .collect();

        // Tracked modules that no longer scan: deletions.
        let removed: Vec<String> = state
            .artifacts
            .keys()
            .filter(|path| !input_modules.contains_key(*path))
            .cloned()
            .collect();

        // Changed modules: hash differs, plus new files. With a watch hint,
        // only the hinted paths are re-hashed.
        let candidates: Vec<(&String, &PathBuf)> = match &changed_hint {
            Some(hint) => {
                let hinted: BTreeSet<PathBuf> = hint.iter().cloned().collect();
                input_modules
                    .iter()
                    .filter(|(_, file)| hinted.contains(*file))
                    .collect()
            }
            None => input_modules.iter().collect(),
        };

        let mut changed_modules: Vec<String> = Vec::new();
        for (module, file) in candidates {
            match std::fs::read(file) {
                Ok(bytes) => {
                    let hash = content_hash(&bytes);
                    if state.tracker.hash(module) != Some(hash.as_str()) {
                        changed_modules.push(module.clone());
                    }
                }
                Err(_) => changed_modules.push(module.clone()),
            }
        }

        let changed_css: Vec<PathBuf> = changed_hint
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("css"))
            .cloned()
            .collect();

        let affected = state.tracker.affected_set(&changed_modules, &changed_css);
        let decision = state.tracker.decide(
            affected.len() + removed.len(),
            manifest_exists,
            self.config.incremental_threshold,
        );

        let plan = match decision {
            BuildMode::Full => GenerationPlan {
                mode: BuildMode::Full,
                to_process: input_modules.values().cloned().collect(),
                reused: BTreeMap::new(),
                removed,
            },
            BuildMode::Incremental => {
                let to_process: Vec<PathBuf> = affected
                    .iter()
                    .filter_map(|module| input_modules.get(module).cloned())
                    .collect();
                let reused: BTreeMap<String, ModuleArtifacts> = state
                    .artifacts
                    .iter()
                    .filter(|(path, _)| {
                        !affected.contains(*path) && input_modules.contains_key(*path)
                    })
                    .map(|(path, artifact)| (path.clone(), artifact.clone()))
                    .collect();
                GenerationPlan {
                    mode: BuildMode::Incremental,
                    to_process,
                    reused,
                    removed,
                }
            }
        };

        Ok(plan)
    }

    /// Read and process one source file.
    fn process_one(&self, path: &Path) -> (ModuleArtifacts, String) {
        let canonical = module_path(&self.root, path);
        let (source, hash, io_error) = match std::fs::read(path) {
            Ok(bytes) => {
                let hash = content_hash(&bytes);
                (String::from_utf8_lossy(&bytes).into_owned(), hash, None)
            }
            Err(e) => (String::new(), content_hash(b""), Some(e.to_string())),
        };

        let mut result = processor::process_module(&self.pool, &self.root, path, &source);
        if let Some(error) = io_error {
            result
                .diagnostics
                .push(SourceDiagnostic::io(path, error));
        }

        let ProcessedModule {
            module,
            dependencies,
            css_dependencies,
            inline_styles,
            symbols,
            diagnostics,
        } = result;

        (
            ModuleArtifacts {
                module,
                symbols,
                dependencies,
                css_dependencies,
                inline_styles,
                diagnostics,
                hash,
                source_path: path.to_path_buf(),
            },
            canonical,
        )
    }

    /// Shared tail of both modes: type resolution, CSS analysis, demo and
    /// source attachment, export validation, canonical assembly.
    fn post_process(
        &self,
        artifacts: &BTreeMap<String, ModuleArtifacts>,
    ) -> (Package, ModuleIndex, Vec<SourceDiagnostic>) {
        let mut diagnostics: Vec<SourceDiagnostic> = Vec::new();
        let mut modules: Vec<Module> = Vec::new();
        let mut symbols: Vec<TypeSymbol> = Vec::new();

        for artifact in artifacts.values() {
            diagnostics.extend(artifact.diagnostics.iter().cloned());
            symbols.extend(artifact.symbols.iter().cloned());
            let mut module = artifact.module.clone();
            self.attach_css(artifact, &mut module, &mut diagnostics);
            self.attach_demos_and_sources(artifact, &mut module);
            modules.push(module);
        }

        type_resolver::resolve_types(&mut modules, &symbols);
        validate_export_closure(&mut modules, &mut diagnostics);

        let (package, index) = assemble(modules);

        diagnostics.sort_by(|a, b| (&a.path, &a.message).cmp(&(&b.path, &b.message)));
        diagnostics.dedup();

        (package, index, diagnostics)
    }

    /// Analyze the module's inline styles and imported stylesheets, and
    /// attach the collected custom properties to its custom elements.
    fn attach_css(
        &self,
        artifact: &ModuleArtifacts,
        module: &mut Module,
        diagnostics: &mut Vec<SourceDiagnostic>,
    ) {
        let mut properties = Vec::new();

        for style in &artifact.inline_styles {
            let analyzed = self.css.analyze(&self.pool, &style.text, self.tokens.as_ref());
            properties.extend(analyzed.iter().cloned());
        }

        for css_path in &artifact.css_dependencies {
            match std::fs::read_to_string(css_path) {
                Ok(content) => {
                    let analyzed = self.css.analyze(&self.pool, &content, self.tokens.as_ref());
                    properties.extend(analyzed.iter().cloned());
                }
                Err(e) => diagnostics.push(SourceDiagnostic::io(css_path, e.to_string())),
            }
        }

        if properties.is_empty() {
            return;
        }

        for declaration in &mut module.declarations {
            if let Some(class) = declaration.as_class_mut()
                && class.custom_element
            {
                class.css_properties.extend(properties.iter().cloned());
            }
        }
    }

    fn attach_demos_and_sources(&self, artifact: &ModuleArtifacts, module: &mut Module) {
        let source_href = self.config.source_control_root_url.as_ref().map(|base| {
            let relative = artifact
                .source_path
                .strip_prefix(&self.root)
                .unwrap_or(&artifact.source_path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            format!("{}{}", base, relative)
        });

        for declaration in &mut module.declarations {
            let Some(class) = declaration.as_class_mut() else {
                continue;
            };
            if let Some(href) = &source_href
                && class.source.is_none()
            {
                class.source = Some(SourceReference { href: href.clone() });
            }
            if let Some(tag) = &class.tag_name
                && let Some(demos) = self.demos.get(tag)
            {
                class.demos.extend(demos.iter().cloned());
            }
        }
    }
}

struct GenerationPlan {
    mode: BuildMode,
    to_process: Vec<PathBuf>,
    reused: BTreeMap<String, ModuleArtifacts>,
    removed: Vec<String>,
}

/// Every export's `declaration` reference must resolve to a declaration in
/// the produced module set; dangling exports are dropped with a diagnostic.
fn validate_export_closure(modules: &mut [Module], diagnostics: &mut Vec<SourceDiagnostic>) {
    let declared: BTreeSet<(String, String)> = modules
        .iter()
        .flat_map(|m| {
            m.declarations
                .iter()
                .map(|d| (m.path.clone(), d.name().to_string()))
        })
        .collect();

    // A path -> index view would also work, but the set keeps this pass
    // allocation-light for the common case of few exports.
    let known_modules: BTreeSet<String> = modules.iter().map(|m| m.path.clone()).collect();

    for module in modules.iter_mut() {
        let module_path = module.path.clone();
        module.exports.retain(|export| {
            let reference = export.declaration();
            let target_module = reference.module.clone().unwrap_or_else(|| module_path.clone());
            let resolves = declared.contains(&(target_module.clone(), reference.name.clone()));
            if !resolves {
                // Re-exports of names from outside the workspace (or from
                // modules that failed to parse) cannot appear in the
                // manifest without breaking the reference invariant.
                diagnostics.push(SourceDiagnostic::inconsistency(
                    PathBuf::from(&module_path),
                    format!(
                        "export '{}' references missing declaration {}#{}{}",
                        export.name(),
                        target_module,
                        reference.name,
                        if known_modules.contains(&target_module) {
                            ""
                        } else {
                            " (module not in workspace)"
                        }
                    ),
                ));
            }
            resolves
        });
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    struct TestProject {
        _dir: TempDir,
        session: Session,
    }

    impl TestProject {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir(dir.path().join("src")).unwrap();
            let session = Session::new(Config::default(), dir.path().to_path_buf()).unwrap();
            Self { _dir: dir, session }
        }

        fn write(&self, relative: &str, content: &str) {
            let path = self.session.root().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn delete(&self, relative: &str) {
            fs::remove_file(self.session.root().join(relative)).unwrap();
        }

        fn generate(&self) -> GenerateResult {
            self.session.generate(&CancelToken::new()).unwrap()
        }
    }

    const ELEMENT_A: &str = r#"
import { LitElement } from 'lit';
import { customElement, property } from 'lit/decorators.js';

@customElement('a-x')
export class A extends LitElement {
  @property({ type: Boolean }) open: boolean = false;
}
"#;

    #[test]
    fn test_full_generation_shape() {
        let project = TestProject::new();
        project.write("src/a.ts", ELEMENT_A);

        let result = project.generate();
        assert_eq!(result.mode, BuildMode::Full);

        let manifest = &result.manifest;
        assert_eq!(manifest.modules.len(), 1);
        assert_eq!(manifest.modules[0].path, "src/a.js");

        let class = manifest.modules[0].declarations[0].as_class().unwrap();
        assert_eq!(class.tag_name.as_deref(), Some("a-x"));
        assert_eq!(class.attributes[0].name, "open");
        assert_eq!(class.attributes[0].default.as_deref(), Some("false"));
        assert_eq!(class.attributes[0].field_name.as_deref(), Some("open"));

        let kinds: Vec<_> = manifest.modules[0]
            .exports
            .iter()
            .map(|e| e.kind_str())
            .collect();
        assert_eq!(kinds, vec!["custom-element-definition", "js"]);
    }

    #[test]
    fn test_determinism_byte_identical() {
        let project = TestProject::new();
        project.write("src/a.ts", ELEMENT_A);
        project.write("src/b.ts", "export const B: number = 1;\n");

        let first = project.generate().manifest.to_json().unwrap();

        let fresh = Session::new(
            Config::default(),
            project.session.root().to_path_buf(),
        )
        .unwrap();
        let second = fresh
            .generate(&CancelToken::new())
            .unwrap()
            .manifest
            .to_json()
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_incremental_edit_matches_full_rebuild() {
        let project = TestProject::new();
        project.write("src/a.ts", ELEMENT_A);
        project.write("src/b.ts", "export const VERSION: string = '1';\n");
        project.write("src/c.ts", "export function noop(): void {}\n");

        project.generate();

        // Edit b without changing import relationships.
        project.write("src/b.ts", "export const VERSION: string = '2';\n");
        let incremental = project.generate();
        assert_eq!(incremental.mode, BuildMode::Incremental);

        // A fresh session sees identical output from a full rebuild.
        let fresh = Session::new(
            Config::default(),
            project.session.root().to_path_buf(),
        )
        .unwrap();
        let full = fresh.generate(&CancelToken::new()).unwrap();
        assert_eq!(full.mode, BuildMode::Full);

        assert_eq!(
            incremental.manifest.to_json().unwrap(),
            full.manifest.to_json().unwrap()
        );
    }

    #[test]
    fn test_reexport_cycle_rebuilds_together() {
        let project = TestProject::new();
        project.write(
            "src/a.ts",
            "export { B } from './b.js';\nexport class A extends HTMLElement {}\ncustomElements.define('x-a', A);\n",
        );
        project.write(
            "src/b.ts",
            "export { A } from './a.js';\nexport class B extends HTMLElement {}\ncustomElements.define('x-b', B);\n",
        );
        project.generate();

        // Editing one member of the cycle reprocesses both, incrementally.
        project.write(
            "src/a.ts",
            "export { B } from './b.js';\nexport class A extends HTMLElement { open: boolean = false; }\ncustomElements.define('x-a', A);\n",
        );
        let incremental = project.generate();
        assert_eq!(incremental.mode, BuildMode::Incremental);

        let fresh = Session::new(
            Config::default(),
            project.session.root().to_path_buf(),
        )
        .unwrap();
        let full = fresh.generate(&CancelToken::new()).unwrap();

        assert_eq!(
            incremental.manifest.to_json().unwrap(),
            full.manifest.to_json().unwrap()
        );

        // The cross-module re-exports survive with resolved references.
        let module_a = incremental
            .manifest
            .modules
            .iter()
            .find(|m| m.path == "src/a.js")
            .unwrap();
        assert!(
            module_a
                .exports
                .iter()
                .any(|e| e.name() == "B"
                    && e.declaration().module.as_deref() == Some("src/b.js"))
        );
    }

    #[test]
    fn test_threshold_falls_back_to_full() {
        let project = TestProject::new();
        for i in 0..5 {
            project.write(
                &format!("src/m{}.ts", i),
                &format!("export const V{}: number = {};\n", i, i),
            );
        }
        project.generate();

        // Touch every file: blast radius exceeds the default threshold.
        for i in 0..5 {
            project.write(
                &format!("src/m{}.ts", i),
                &format!("export const V{}: number = {};\n", i, i + 1),
            );
        }
        let result = project.generate();
        assert_eq!(result.mode, BuildMode::Full);
    }

    #[test]
    fn test_deleted_file_leaves_no_trace() {
        let project = TestProject::new();
        project.write("src/a.ts", ELEMENT_A);
        project.write("src/b.ts", "export const B: number = 1;\n");
        project.generate();

        project.delete("src/b.ts");
        let result = project.generate();

        assert_eq!(result.manifest.modules.len(), 1);
        assert_eq!(result.manifest.modules[0].path, "src/a.js");
    }

    #[test]
    fn test_cancellation_preserves_state() {
        let project = TestProject::new();
        project.write("src/a.ts", ELEMENT_A);
        let before = project.generate();

        project.write("src/a.ts", "export class A extends HTMLElement {}\n");
        let token = CancelToken::new();
        token.cancel();
        let err = project.session.generate(&token).unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));

        // The prior manifest is still current.
        let current = project.session.current_manifest().unwrap();
        assert_eq!(
            current.to_json().unwrap(),
            before.manifest.to_json().unwrap()
        );
    }

    #[test]
    fn test_parse_error_produces_partial_result() {
        let project = TestProject::new();
        project.write("src/bad.ts", "export class Broken extends {");
        project.write("src/a.ts", ELEMENT_A);

        let result = project.generate();
        assert!(!result.diagnostics.is_empty());
        // The well-formed module still made it into the manifest.
        assert!(result.manifest.modules.iter().any(|m| m.path == "src/a.js"));
    }

    #[test]
    fn test_type_alias_resolution_across_modules() {
        let project = TestProject::new();
        project.write("src/kinds.ts", "export type Kind = 'a' | 'b' | 'c';\n");
        project.write(
            "src/b.ts",
            r#"
import { customElement, property } from 'lit/decorators.js';

@customElement('b-y')
export class B extends HTMLElement {
  @property() kind: Kind = 'a';
}
"#,
        );

        let result = project.generate();
        let module = result
            .manifest
            .modules
            .iter()
            .find(|m| m.path == "src/b.js")
            .unwrap();
        let class = module.declarations[0].as_class().unwrap();
        let attribute_type = class.attributes[0].type_.as_ref().unwrap();

        assert_eq!(attribute_type.text, "'a' | 'b' | 'c'");
        assert_eq!(attribute_type.references[0].name, "Kind");
        assert_eq!(
            attribute_type.references[0].module.as_deref(),
            Some("src/kinds.js")
        );
    }

    #[test]
    fn test_imported_stylesheet_properties_attach() {
        let project = TestProject::new();
        project.write(
            "src/theme.css",
            "/** Accent color */\n:host { color: var(--accent, rebeccapurple); }\nb { padding: var(--_private); }",
        );
        project.write(
            "src/a.ts",
            r#"
import styles from './theme.css';

@customElement('a-x')
export class A extends HTMLElement {}
"#,
        );

        let result = project.generate();
        let class = result.manifest.modules[0].declarations[0]
            .as_class()
            .unwrap();

        assert_eq!(class.css_properties.len(), 1);
        assert_eq!(class.css_properties[0].name, "--accent");
        assert_eq!(
            class.css_properties[0].default.as_deref(),
            Some("rebeccapurple")
        );
        assert_eq!(
            class.css_properties[0].description.as_deref(),
            Some("Accent color")
        );
    }

    #[test]
    fn test_dangling_reexport_dropped() {
        let project = TestProject::new();
        project.write("src/a.ts", "export { LitElement } from 'lit';\n");

        let result = project.generate();
        assert!(result.manifest.modules[0].exports.is_empty());
        assert!(!result.diagnostics.is_empty());
    }

    #[test]
    fn test_declaration_files_skipped_by_default() {
        let project = TestProject::new();
        project.write("src/a.ts", ELEMENT_A);
        project.write(
            "src/types.d.ts",
            "export declare class Phantom extends HTMLElement {}\n",
        );

        let result = project.generate();
        assert_eq!(result.manifest.modules.len(), 1);

        // With default excludes disabled the file is scanned but still
        // contributes no declarations.
        let mut config = Config::default();
        config.no_default_excludes = true;
        let session = Session::new(config, project.session.root().to_path_buf()).unwrap();
        let result = session.generate(&CancelToken::new()).unwrap();
        let declaration_module = result
            .manifest
            .modules
            .iter()
            .find(|m| m.path == "src/types.d.js");
        if let Some(module) = declaration_module {
            assert!(module.declarations.is_empty());
        }
    }
}

//! Dependency tracking for incremental rebuilds.
//!
//! Stores per-module content hashes and the forward/reverse import edges,
//! answers "what must be reprocessed after these files changed", and decides
//! between full and incremental generation. Reverse edges are kept
//! symmetric; re-export cycles are closed over strongly connected components
//! so mutually dependent modules always rebuild together.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

/// Generation mode picked by [`DependencyTracker::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Full,
    Incremental,
}

/// One tracked module file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileNode {
    pub hash: String,
    pub dependencies: BTreeSet<String>,
    pub dependents: BTreeSet<String>,
    pub css_dependencies: BTreeSet<PathBuf>,
}

#[derive(Debug, Default)]
pub struct DependencyTracker {
    nodes: HashMap<String, FileNode>,
    css_to_modules: HashMap<PathBuf, BTreeSet<String>>,
    /// Set when a reverse edge turns out to be missing; forces the next
    /// generation to run full.
    force_full: AtomicBool,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed module: its new hash, forward edges, and CSS
    /// dependencies. Reverse edges are patched on both sides.
    pub fn update(
        &mut self,
        path: &str,
        hash: String,
        dependencies: BTreeSet<String>,
        css_dependencies: BTreeSet<PathBuf>,
    ) {
        let old = self.nodes.get(path).cloned().unwrap_or_default();

        for removed in old.dependencies.difference(&dependencies) {
            if let Some(node) = self.nodes.get_mut(removed) {
                node.dependents.remove(path);
            }
        }
        for added in dependencies.difference(&old.dependencies) {
            self.nodes
                .entry(added.clone())
                .or_default()
                .dependents
                .insert(path.to_string());
        }

        for removed in old.css_dependencies.difference(&css_dependencies) {
            if let Some(modules) = self.css_to_modules.get_mut(removed) {
                modules.remove(path);
                if modules.is_empty() {
                    self.css_to_modules.remove(removed);
                }
            }
        }
        for added in &css_dependencies {
            self.css_to_modules
                .entry(added.clone())
                .or_default()
                .insert(path.to_string());
        }

        let node = self.nodes.entry(path.to_string()).or_default();
        node.hash = hash;
        node.dependencies = dependencies;
        node.css_dependencies = css_dependencies;
    }

    /// Remove a deleted file, dropping every edge that touches it.
    pub fn remove(&mut self, path: &str) {
        let Some(node) = self.nodes.remove(path) else {
            return;
        };

        for dependency in &node.dependencies {
            if let Some(other) = self.nodes.get_mut(dependency) {
                other.dependents.remove(path);
            }
        }
        for dependent in &node.dependents {
            if let Some(other) = self.nodes.get_mut(dependent) {
                other.dependencies.remove(path);
            }
        }
        for css in &node.css_dependencies {
            if let Some(modules) = self.css_to_modules.get_mut(css) {
                modules.remove(path);
                if modules.is_empty() {
                    self.css_to_modules.remove(css);
                }
            }
        }
    }

    pub fn hash(&self, path: &str) -> Option<&str> {
        self.nodes.get(path).map(|n| n.hash.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn node(&self, path: &str) -> Option<&FileNode> {
        self.nodes.get(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Modules that import a stylesheet.
    pub fn modules_for_css(&self, css: &Path) -> BTreeSet<String> {
        self.css_to_modules.get(css).cloned().unwrap_or_default()
    }

    /// The smallest set of modules that must be reprocessed after a batch of
    /// changes: the changed modules, every module in one of their strongly
    /// connected components, the transitive dependents of those components,
    /// and the modules importing each changed stylesheet.
    pub fn affected_set(&self, changed: &[String], changed_css: &[PathBuf]) -> BTreeSet<String> {
        self.check_edge_symmetry();

        let mut seeds: BTreeSet<String> = changed.iter().cloned().collect();
        for css in changed_css {
            seeds.extend(self.modules_for_css(css));
        }

        let components = self.strongly_connected_components();

        // Component-level walk over dependent edges.
        let mut affected: BTreeSet<String> = BTreeSet::new();
        let mut visited_components: BTreeSet<usize> = BTreeSet::new();
        let mut worklist: Vec<String> = Vec::new();

        for seed in &seeds {
            match components.membership.get(seed) {
                Some(&component) => {
                    if visited_components.insert(component) {
                        worklist.extend(components.members[component].iter().cloned());
                    }
                }
                // Unknown to the graph (newly created file): affected alone.
                None => {
                    affected.insert(seed.clone());
                }
            }
        }

        while let Some(path) = worklist.pop() {
            affected.insert(path.clone());
            let Some(node) = self.nodes.get(&path) else {
                continue;
            };
            for dependent in &node.dependents {
                let Some(&component) = components.membership.get(dependent) else {
                    continue;
                };
                if visited_components.insert(component) {
                    worklist.extend(components.members[component].iter().cloned());
                }
            }
        }

        affected
    }

    /// Pick the generation mode. Full when no manifest exists yet, when an
    /// inconsistency forced it, or when the blast radius exceeds the
    /// threshold (incremental runs carry fixed overhead, and a large batch
    /// loses the race against a clean full build).
    pub fn decide(&self, affected: usize, manifest_exists: bool, threshold: usize) -> BuildMode {
        if !manifest_exists || self.force_full.load(Ordering::SeqCst) || affected > threshold {
            BuildMode::Full
        } else {
            BuildMode::Incremental
        }
    }

    /// A completed full rebuild clears the forced-full flag.
    pub fn clear_force_full(&self) {
        self.force_full.store(false, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn force_full_pending(&self) -> bool {
        self.force_full.load(Ordering::SeqCst)
    }

    /// Every forward edge must have its reverse. A miss is a bug upstream;
    /// it is never surfaced as a failure, but the next generation runs full.
    fn check_edge_symmetry(&self) {
        for (path, node) in &self.nodes {
            for dependency in &node.dependencies {
                let reverse_present = self
                    .nodes
                    .get(dependency)
                    .is_some_and(|other| other.dependents.contains(path));
                if !reverse_present {
                    eprintln!(
                        "{} dependency graph inconsistency: {} -> {} lacks a reverse edge; forcing full rebuild",
                        "warning:".bold().yellow(),
                        path,
                        dependency
                    );
                    self.force_full.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    /// Iterative Tarjan over the dependency edges.
    fn strongly_connected_components(&self) -> Components {
        let keys: Vec<&String> = {
            let mut keys: Vec<&String> = self.nodes.keys().collect();
            keys.sort();
            keys
        };
        let index_of: HashMap<&str, usize> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.as_str(), i))
            .collect();

        let n = keys.len();
        let mut state = TarjanState {
            index: vec![usize::MAX; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        };

        let adjacency: Vec<Vec<usize>> = keys
            .iter()
            .map(|k| {
                let mut targets: Vec<usize> = self.nodes[k.as_str()]
                    .dependencies
                    .iter()
                    .filter_map(|d| index_of.get(d.as_str()).copied())
                    .collect();
                targets.sort_unstable();
                targets
            })
            .collect();

        for v in 0..n {
            if state.index[v] == usize::MAX {
                tarjan(v, &adjacency, &mut state);
            }
        }

        let mut membership = HashMap::new();
        let mut members: Vec<Vec<String>> = Vec::with_capacity(state.components.len());
        for (component, vertices) in state.components.iter().enumerate() {
            let mut paths = Vec::with_capacity(vertices.len());
            for &v in vertices {
                membership.insert(keys[v].clone(), component);
                paths.push(keys[v].clone());
            }
            members.push(paths);
        }

        Components {
            membership,
            members,
        }
    }
}

struct Components {
    membership: HashMap<String, usize>,
    members: Vec<Vec<String>>,
}

struct TarjanState {
    index: Vec<usize>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

/// Iterative strongly-connected-components computation (explicit frame
/// stack; module graphs can be deep enough to overflow recursion).
fn tarjan(root: usize, adjacency: &[Vec<usize>], state: &mut TarjanState) {
    let mut frames: Vec<(usize, usize)> = vec![(root, 0)];

    while let Some(&(v, child)) = frames.last() {
        if child == 0 {
            state.index[v] = state.next_index;
            state.lowlink[v] = state.next_index;
            state.next_index += 1;
            state.stack.push(v);
            state.on_stack[v] = true;
        }

        if child < adjacency[v].len() {
            if let Some(frame) = frames.last_mut() {
                frame.1 += 1;
            }
            let w = adjacency[v][child];
            if state.index[w] == usize::MAX {
                frames.push((w, 0));
            } else if state.on_stack[w] {
                state.lowlink[v] = state.lowlink[v].min(state.index[w]);
            }
            continue;
        }

        frames.pop();
        if let Some(&(parent, _)) = frames.last() {
            state.lowlink[parent] = state.lowlink[parent].min(state.lowlink[v]);
        }

        if state.lowlink[v] == state.index[v] {
            let mut component = Vec::new();
            while let Some(w) = state.stack.pop() {
                state.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            state.components.push(component);
        }
    }
}

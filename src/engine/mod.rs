//! The manifest generation engine.
//!
//! ## Module Structure
//!
//! - `query_pool`: compiled tree-sitter queries and the bounded parser pool
//! - `processor`: one source file → partial module + dependency sets
//! - `jsdoc`: documentation-block parsing and tag merging
//! - `css`: CSS custom-property extraction with a content-hash cache
//! - `template`: render-template slot/part analysis
//! - `type_resolver`: workspace-local type alias and enum resolution
//! - `tracker`: dependency graph, affected sets, full-vs-incremental
//! - `session`: the coordinator owning pools, caches, and the snapshot
//! - `watch`: debounced, file-watch-driven incremental rebuilds

pub mod cancel;
pub mod css;
pub mod demo;
pub mod diagnostics;
pub mod jsdoc;
pub mod processor;
pub mod queries;
pub mod query_pool;
pub mod session;
pub mod template;
pub mod tracker;
pub mod type_resolver;
pub mod watch;

pub use cancel::CancelToken;
pub use diagnostics::{DiagnosticKind, EngineError, Severity, SourceDiagnostic};
pub use session::{GenerateResult, Session};
pub use tracker::BuildMode;
pub use watch::WatchSession;

//! Compiled-query cache and parser pooling.
//!
//! Queries are compiled once per session and shared freely afterwards
//! (compiled queries are immutable). Parsers are mutable and expensive, so a
//! bounded per-language pool hands them out; `acquire` blocks until one is
//! free, and the guard resets and returns its parser on drop.

use std::collections::HashMap;

use parking_lot::{Condvar, Mutex};
use tree_sitter::{Language, Parser, Query};

use crate::engine::diagnostics::EngineError;
use crate::engine::queries;

/// The grammars the engine loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageKind {
    TypeScript,
    JavaScript,
    Css,
    Html,
    JsDoc,
}

impl LanguageKind {
    pub fn all() -> [LanguageKind; 5] {
        [
            LanguageKind::TypeScript,
            LanguageKind::JavaScript,
            LanguageKind::Css,
            LanguageKind::Html,
            LanguageKind::JsDoc,
        ]
    }

    /// The source language for a file extension; CSS and HTML are only ever
    /// parsed as embedded content or stylesheet files.
    pub fn for_source_file(extension: &str) -> LanguageKind {
        match extension {
            "js" | "mjs" | "jsx" => LanguageKind::JavaScript,
            _ => LanguageKind::TypeScript,
        }
    }

    fn grammar(self) -> Language {
        match self {
            LanguageKind::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            LanguageKind::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            LanguageKind::Css => tree_sitter_css::LANGUAGE.into(),
            LanguageKind::Html => tree_sitter_html::LANGUAGE.into(),
            LanguageKind::JsDoc => tree_sitter_jsdoc::LANGUAGE.into(),
        }
    }

    fn query_source(self) -> &'static str {
        match self {
            LanguageKind::TypeScript => queries::TYPESCRIPT_QUERY,
            LanguageKind::JavaScript => queries::JAVASCRIPT_QUERY,
            LanguageKind::Css => queries::CSS_QUERY,
            LanguageKind::Html => queries::HTML_QUERY,
            LanguageKind::JsDoc => queries::JSDOC_QUERY,
        }
    }
}

/// A compiled query plus its language handle.
pub struct QuerySet {
    pub language: Language,
    pub query: Query,
}

impl QuerySet {
    /// Resolve a capture name to its index. Names are fixed at compile time,
    /// so a miss is a programming error surfaced as `None` to the caller.
    pub fn capture(&self, name: &str) -> Option<u32> {
        self.query.capture_index_for_name(name)
    }
}

struct PoolState {
    available: Vec<Parser>,
    outstanding: usize,
}

/// Compiled queries for all languages plus a bounded parser pool.
pub struct QueryPool {
    queries: HashMap<LanguageKind, QuerySet>,
    pools: Mutex<HashMap<LanguageKind, PoolState>>,
    capacity: usize,
    freed: Condvar,
}

impl QueryPool {
    /// Load every grammar and compile every query. Any failure here is fatal
    /// for the session.
    pub fn new(capacity: usize) -> Result<Self, EngineError> {
        let capacity = capacity.max(1);
        let mut compiled = HashMap::new();
        let mut pools = HashMap::new();

        for kind in LanguageKind::all() {
            let language = kind.grammar();

            // Creating one parser up front validates the grammar ABI, so
            // later acquisitions cannot fail.
            let parser = new_parser(&language)?;

            let query = Query::new(&language, kind.query_source()).map_err(|e| {
                EngineError::Initialization(format!("query compilation failed for {:?}: {}", kind, e))
            })?;

            compiled.insert(kind, QuerySet { language, query });
            pools.insert(
                kind,
                PoolState {
                    available: vec![parser],
                    outstanding: 1,
                },
            );
        }

        Ok(Self {
            queries: compiled,
            pools: Mutex::new(pools),
            capacity,
            freed: Condvar::new(),
        })
    }

    /// Compiled queries for a language. Idempotent and lock-free.
    pub fn queries(&self, kind: LanguageKind) -> &QuerySet {
        &self.queries[&kind]
    }

    /// Borrow a parser for `kind`, blocking while the pool is exhausted.
    /// Parsers are never shared between concurrent callers.
    pub fn acquire(&self, kind: LanguageKind) -> ParserGuard<'_> {
        let mut pools = self.pools.lock();
        loop {
            let state = pools
                .get_mut(&kind)
                .expect("pool exists for every language kind");

            if let Some(parser) = state.available.pop() {
                return ParserGuard {
                    pool: self,
                    kind,
                    parser: Some(parser),
                };
            }

            if state.outstanding < self.capacity {
                state.outstanding += 1;
                // The grammar was validated in new(); a fresh parser for the
                // same language cannot fail.
                let language = self.queries[&kind].language.clone();
                drop(pools);
                let parser =
                    new_parser(&language).expect("grammar validated at pool construction");
                return ParserGuard {
                    pool: self,
                    kind,
                    parser: Some(parser),
                };
            }

            self.freed.wait(&mut pools);
        }
    }

    fn release(&self, kind: LanguageKind, mut parser: Parser) {
        // Clear any in-flight parse state before the next borrower sees it.
        parser.reset();
        let mut pools = self.pools.lock();
        if let Some(state) = pools.get_mut(&kind) {
            state.available.push(parser);
        }
        self.freed.notify_one();
    }
}

fn new_parser(language: &Language) -> Result<Parser, EngineError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| EngineError::Initialization(format!("grammar load failed: {}", e)))?;
    Ok(parser)
}

/// Exclusive loan of a pooled parser; returns it on drop.
pub struct ParserGuard<'a> {
    pool: &'a QueryPool,
    kind: LanguageKind,
    parser: Option<Parser>,
}

impl std::ops::Deref for ParserGuard<'_> {
    type Target = Parser;

    fn deref(&self) -> &Parser {
        self.parser.as_ref().expect("parser present until drop")
    }
}

impl std::ops::DerefMut for ParserGuard<'_> {
    fn deref_mut(&mut self) -> &mut Parser {
        self.parser.as_mut().expect("parser present until drop")
    }
}

impl Drop for ParserGuard<'_> {
    fn drop(&mut self) {
        if let Some(parser) = self.parser.take() {
            self.pool.release(self.kind, parser);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_all_grammars_load_and_queries_compile() {
        let pool = QueryPool::new(2).unwrap();
        for kind in LanguageKind::all() {
            let set = pool.queries(kind);
            assert!(set.query.pattern_count() > 0, "{:?} has patterns", kind);
        }
    }

    #[test]
    fn test_capture_names_resolve() {
        let pool = QueryPool::new(1).unwrap();
        let ts = pool.queries(LanguageKind::TypeScript);
        for name in [
            "import.source",
            "class",
            "class.name",
            "define.tag",
            "alias.name",
            "template.tag",
            "event.name",
        ] {
            assert!(ts.capture(name).is_some(), "missing capture {}", name);
        }
    }

    #[test]
    fn test_acquired_parser_parses() {
        let pool = QueryPool::new(1).unwrap();
        let mut parser = pool.acquire(LanguageKind::TypeScript);
        let tree = parser.parse("export class A {}", None).unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_pool_blocks_and_releases() {
        let pool = Arc::new(QueryPool::new(1).unwrap());

        let guard = pool.acquire(LanguageKind::Css);

        let contender = {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                let mut parser = pool.acquire(LanguageKind::Css);
                parser.parse("a { color: red; }", None).is_some()
            })
        };

        // Give the contender time to block on the exhausted pool.
        std::thread::sleep(std::time::Duration::from_millis(50));
        drop(guard);

        assert!(contender.join().unwrap());
    }

    #[test]
    fn test_language_for_source_file() {
        assert_eq!(
            LanguageKind::for_source_file("js"),
            LanguageKind::JavaScript
        );
        assert_eq!(
            LanguageKind::for_source_file("ts"),
            LanguageKind::TypeScript
        );
        assert_eq!(
            LanguageKind::for_source_file("tsx"),
            LanguageKind::TypeScript
        );
    }
}

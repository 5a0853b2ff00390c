//! Shared test utilities for fob-preview tests
//!
//! `RecordingEngine` stands in for a real bundler: it walks the import graph
//! through the request's plugin set exactly as an engine would, joins the
//! loaded modules, and records what it did.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fob_preview::{
    BundleEngine, BundleRequest, BundleResult, Diagnostic, DiagnosticKind, Error, GeneratedFile,
    ResolvedModule, Result, scan_import_specifiers,
};
use indexmap::IndexSet;
use parking_lot::Mutex;

pub const ENTRY: &str = "app/generated/page.tsx";

/// Deterministic engine that drives the plugin set and counts invocations.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    invocations: AtomicUsize,
    resolved: Mutex<Vec<ResolvedModule>>,
    resolve_errors: AtomicUsize,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Modules resolved during the last run, in visit order.
    pub fn resolved(&self) -> Vec<ResolvedModule> {
        self.resolved.lock().clone()
    }

    /// Resolution errors raised by the plugin set.
    pub fn resolve_errors(&self) -> usize {
        self.resolve_errors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleEngine for RecordingEngine {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn bundle(&self, request: BundleRequest) -> Result<BundleResult> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.resolved.lock().clear();

        let plugins = &request.plugins;
        let entry = plugins
            .resolve(None, &request.entry)
            .inspect_err(|_| {
                self.resolve_errors.fetch_add(1, Ordering::SeqCst);
            })?;

        let mut seen: IndexSet<String> = IndexSet::new();
        let mut queue = vec![entry];
        let mut code = String::new();
        let mut stylesheets = Vec::new();

        while let Some(module) = queue.pop() {
            let id = module.id();
            if !seen.insert(id.clone()) {
                continue;
            }
            self.resolved.lock().push(module.clone());

            let loaded = plugins.load(&id).ok_or_else(|| {
                Error::Bundler(vec![Diagnostic::new(
                    DiagnosticKind::Plugin,
                    format!("No loader for {}", id),
                )])
            })?;

            if loaded.loader.is_stylesheet() {
                stylesheets.push(loaded.contents);
                continue;
            }

            for specifier in scan_import_specifiers(&loaded.contents) {
                let resolved = plugins
                    .resolve(Some(&id), &specifier.value)
                    .inspect_err(|_| {
                        self.resolve_errors.fetch_add(1, Ordering::SeqCst);
                    })?;
                queue.push(resolved);
            }

            code.push_str(&format!("// {}\n{}\n", id, loaded.contents));
        }

        Ok(BundleResult {
            code: format!("{}\n{}", request.options.banner, code),
            stylesheets,
        })
    }
}

/// Engine that succeeds with whitespace only.
#[derive(Debug, Default)]
pub struct BlankEngine;

#[async_trait]
impl BundleEngine for BlankEngine {
    fn name(&self) -> &'static str {
        "blank"
    }

    async fn bundle(&self, _request: BundleRequest) -> Result<BundleResult> {
        Ok(BundleResult::new("  \n"))
    }
}

pub fn file(path: &str, content: &str) -> GeneratedFile {
    GeneratedFile::new(path, content)
}

/// The single-file input every scenario starts from.
pub fn round_trip_files() -> Vec<GeneratedFile> {
    vec![file(
        ENTRY,
        "export default function GeneratedPage(){ return null; }",
    )]
}

/// Assert that `haystack` contains `needle`, showing a preview on failure.
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected output to contain '{}', but it didn't.\nOutput preview (first 800 chars): {}",
        needle,
        &haystack[..haystack.len().min(800)]
    );
}

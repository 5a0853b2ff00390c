//! The preview build pipeline.
//!
//! ```text
//! records -> table -> size limits -> policy guard -> entry rewrite
//!         -> plugin set -> engine -> empty check -> sandbox document
//! ```
//!
//! Every stage is fatal on failure. Nothing is shared between builds: the
//! table and plugin set are created per call and dropped when it returns.

use std::sync::Arc;

use tracing::Instrument;

use crate::config::PreviewConfig;
use crate::engine::{BundleEngine, BundleRequest, BundleResult, EngineOptions, RolldownEngine};
use crate::entry::{DefaultExport, rewrite_entry};
use crate::files::{GeneratedFile, VirtualFileTable};
use crate::path::normalize_path;
use crate::plugins::PluginSet;
use crate::policy::check_import_policy;
use crate::sandbox::{SandboxAssembler, SandboxDocument};
use crate::{Error, Result};

/// A successful preview build.
#[derive(Debug, Clone)]
pub struct PreviewBuild {
    pub document: SandboxDocument,
    pub bundle: BundleResult,
    /// Normalized entry path.
    pub entry: String,
    /// Name of the entry's default-exported component.
    pub component: String,
    /// Number of files in the virtual file table.
    pub modules: usize,
}

/// Outcome of the pre-flight gates, without any bundling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    pub entry: String,
    pub export: DefaultExport,
    pub modules: usize,
}

/// Table and entry after the pre-flight gates have passed.
struct Prepared {
    table: VirtualFileTable,
    entry: String,
    export: DefaultExport,
}

/// Runs preview builds for one configuration.
#[derive(Debug, Clone)]
pub struct PreviewBuilder {
    config: PreviewConfig,
    assembler: SandboxAssembler,
}

impl PreviewBuilder {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            assembler: SandboxAssembler::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn assembler(&self) -> &SandboxAssembler {
        &self.assembler
    }

    /// Build `files` into a sandbox document with `engine`.
    ///
    /// `entry` defaults to [`PreviewConfig::entry`].
    pub async fn build<E>(
        &self,
        files: &[GeneratedFile],
        entry: Option<&str>,
        engine: &E,
    ) -> Result<PreviewBuild>
    where
        E: BundleEngine + ?Sized,
    {
        let entry = normalize_path(entry.unwrap_or(&self.config.entry));
        let span = tracing::info_span!(
            "preview_build",
            entry = %entry,
            files = files.len(),
            engine = engine.name()
        );

        async move {
            let result = self.run(files, entry, engine).await;
            if let Err(err) = &result {
                tracing::debug!(category = err.category(), error = %err, "Preview build failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Run only the gates that need no engine: size limits, import policy
    /// and entry shape.
    pub fn preflight(&self, files: &[GeneratedFile], entry: Option<&str>) -> Result<PreflightReport> {
        let entry = normalize_path(entry.unwrap_or(&self.config.entry));
        let prepared = self.prepare(files, entry)?;
        Ok(PreflightReport {
            modules: prepared.table.len(),
            entry: prepared.entry,
            export: prepared.export,
        })
    }

    async fn run<E>(&self, files: &[GeneratedFile], entry: String, engine: &E) -> Result<PreviewBuild>
    where
        E: BundleEngine + ?Sized,
    {
        let Prepared {
            table,
            entry,
            export,
        } = self.prepare(files, entry)?;
        let modules = table.len();

        let table = Arc::new(table);
        let plugins = Arc::new(PluginSet::for_build(Arc::clone(&table), entry.clone()));
        let request = BundleRequest {
            entry: entry.clone(),
            plugins,
            options: EngineOptions::preview(),
        };

        tracing::debug!(plugins = request.plugins.len(), "Invoking bundling engine");
        let bundle = engine.bundle(request).await?;
        if bundle.is_empty() {
            return Err(Error::EmptyOutput(entry));
        }

        let document = self.assembler.assemble(&bundle);
        tracing::info!(
            bundle_bytes = bundle.len(),
            document_bytes = document.len(),
            component = %export.name,
            "Preview build complete"
        );

        Ok(PreviewBuild {
            document,
            bundle,
            entry,
            component: export.name,
            modules,
        })
    }

    fn prepare(&self, files: &[GeneratedFile], entry: String) -> Result<Prepared> {
        self.config.validate()?;

        let mut table = VirtualFileTable::from_generated(files);
        table.check_sizes(self.config.max_file_size)?;

        check_import_policy(&table)?;
        tracing::debug!(files = table.len(), "Import policy passed");

        let export = rewrite_entry(&mut table, &entry, &self.config.global_slot)?;

        Ok(Prepared {
            table,
            entry,
            export,
        })
    }
}

impl Default for PreviewBuilder {
    fn default() -> Self {
        Self::new(PreviewConfig::default())
    }
}

/// Build with the default configuration and [`RolldownEngine`].
pub async fn build_preview(files: &[GeneratedFile], entry: &str) -> Result<PreviewBuild> {
    PreviewBuilder::default()
        .build(files, Some(entry), &RolldownEngine::new())
        .await
}

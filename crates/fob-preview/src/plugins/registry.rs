//! Plugin registry with execution phases.
//!
//! A build registers its hook sets once; the engine then asks the set to
//! resolve and load modules. Plugins are consulted in phase order, so host
//! shims claim their specifiers before the virtual file resolver sees them.

use std::sync::Arc;

use super::{
    HostShimPlugin, LoadedModule, ResolveOutcome, ResolvedModule, VirtualFilePlugin,
};
use crate::files::VirtualFileTable;
use crate::{Error, Result};

/// Plugin execution phases (lower runs first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginPhase {
    /// Allow-listed bare imports, redirected to host globals.
    HostShim = 0,

    /// Relative imports and the entry, served from memory.
    Virtual = 10,
}

/// The closed set of hook implementations a preview build uses.
#[derive(Debug, Clone)]
pub enum PreviewPlugin {
    HostShims(HostShimPlugin),
    VirtualFiles(VirtualFilePlugin),
}

impl PreviewPlugin {
    pub fn name(&self) -> &'static str {
        match self {
            PreviewPlugin::HostShims(_) => "fob-preview-host-shims",
            PreviewPlugin::VirtualFiles(_) => "fob-preview-virtual-files",
        }
    }

    pub fn phase(&self) -> PluginPhase {
        match self {
            PreviewPlugin::HostShims(_) => PluginPhase::HostShim,
            PreviewPlugin::VirtualFiles(_) => PluginPhase::Virtual,
        }
    }

    pub fn resolve(&self, importer: Option<&ResolvedModule>, specifier: &str) -> ResolveOutcome {
        match self {
            PreviewPlugin::HostShims(plugin) => Ok(plugin.resolve(specifier)),
            PreviewPlugin::VirtualFiles(plugin) => plugin.resolve(importer, specifier),
        }
    }

    pub fn load(&self, module: &ResolvedModule) -> Option<LoadedModule> {
        match self {
            PreviewPlugin::HostShims(plugin) => plugin.load(module),
            PreviewPlugin::VirtualFiles(plugin) => plugin.load(module),
        }
    }
}

/// Ordered plugins for one build.
#[derive(Debug, Clone, Default)]
pub struct PluginSet {
    plugins: Vec<PreviewPlugin>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard registration: host shims, then virtual files.
    pub fn for_build(files: Arc<VirtualFileTable>, entry: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.add(PreviewPlugin::VirtualFiles(VirtualFilePlugin::new(files, entry)));
        set.add(PreviewPlugin::HostShims(HostShimPlugin::new()));
        set
    }

    /// Add a plugin, keeping the list sorted by phase.
    ///
    /// The sort is stable, so plugins of the same phase keep insertion order.
    pub fn add(&mut self, plugin: PreviewPlugin) {
        self.plugins.push(plugin);
        self.plugins.sort_by_key(PreviewPlugin::phase);
    }

    /// Resolve `specifier` as imported from the module with id `importer_id`.
    ///
    /// The first plugin to claim the specifier wins. An error from a plugin
    /// is final; later plugins are not consulted. A specifier no plugin
    /// claims is an [`Error::UnresolvedImport`]: modules come from the shims
    /// or the virtual file table, never from the engine's own resolver.
    pub fn resolve(&self, importer_id: Option<&str>, specifier: &str) -> Result<ResolvedModule> {
        let importer = importer_id.and_then(ResolvedModule::parse_id);
        for plugin in &self.plugins {
            if let Some(resolved) = plugin.resolve(importer.as_ref(), specifier)? {
                tracing::trace!(
                    plugin = plugin.name(),
                    specifier,
                    id = %resolved,
                    "Resolved import"
                );
                return Ok(resolved);
            }
        }

        let importer = importer
            .map(|module| module.path)
            .or_else(|| importer_id.map(str::to_string))
            .unwrap_or_else(|| "<entry>".to_string());
        tracing::debug!(specifier, importer = %importer, "No plugin claimed import");
        Err(Error::UnresolvedImport {
            specifier: specifier.to_string(),
            importer,
        })
    }

    /// Load the module with id `id`, if one of the plugins owns it.
    pub fn load(&self, id: &str) -> Option<LoadedModule> {
        let module = ResolvedModule::parse_id(id)?;
        self.plugins.iter().find_map(|plugin| plugin.load(&module))
    }

    pub fn plugins(&self) -> &[PreviewPlugin] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::VirtualFile;
    use crate::plugins::{LoaderKind, Namespace};

    fn set_with(files: Vec<VirtualFile>, entry: &str) -> PluginSet {
        PluginSet::for_build(Arc::new(VirtualFileTable::from_files(files)), entry)
    }

    #[test]
    fn test_for_build_orders_shims_first() {
        let set = set_with(vec![], "app/generated/page.tsx");
        let phases: Vec<_> = set.plugins().iter().map(PreviewPlugin::phase).collect();
        assert_eq!(phases, vec![PluginPhase::HostShim, PluginPhase::Virtual]);
    }

    #[test]
    fn test_shims_win_over_virtual_files() {
        // A generated file literally named "react" must not shadow the shim.
        let set = set_with(
            vec![VirtualFile::new("react", "export default 1;")],
            "app/generated/page.tsx",
        );
        let resolved = set
            .resolve(Some("fob-virtual:app/generated/page.tsx"), "react")
            .unwrap();
        assert_eq!(resolved.namespace, Namespace::HostShim);
    }

    #[test]
    fn test_resolve_then_load_relative() {
        let set = set_with(
            vec![
                VirtualFile::new("app/generated/page.tsx", "import Card from './Card';"),
                VirtualFile::new("app/generated/Card.tsx", "export default function Card() {}"),
            ],
            "app/generated/page.tsx",
        );

        let entry = set.resolve(None, "app/generated/page.tsx").unwrap();
        let card = set.resolve(Some(&entry.id()), "./Card").unwrap();
        assert_eq!(card.path, "app/generated/Card.tsx");

        let loaded = set.load(&card.id()).unwrap();
        assert_eq!(loaded.loader, LoaderKind::Tsx);
        assert!(loaded.contents.contains("function Card"));
    }

    #[test]
    fn test_unclaimed_specifier_is_unresolved() {
        let set = set_with(vec![], "app/generated/page.tsx");
        for specifier in ["left-pad", "/etc/passwd", "file:///etc/passwd"] {
            let err = set
                .resolve(Some("fob-virtual:app/generated/page.tsx"), specifier)
                .unwrap_err();
            match err {
                Error::UnresolvedImport {
                    specifier: reported,
                    importer,
                } => {
                    assert_eq!(reported, specifier);
                    assert_eq!(importer, "app/generated/page.tsx");
                }
                other => panic!("expected UnresolvedImport, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_entry_is_unresolved() {
        let set = set_with(vec![], "app/generated/page.tsx");
        let err = set.resolve(None, "app/generated/page.tsx").unwrap_err();
        assert!(matches!(err, Error::UnresolvedImport { ref importer, .. } if importer == "<entry>"));
    }

    #[test]
    fn test_load_foreign_id_is_none() {
        let set = set_with(vec![], "app/generated/page.tsx");
        assert!(set.load("rolldown:runtime").is_none());
    }
}

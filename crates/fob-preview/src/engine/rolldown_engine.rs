//! Rolldown-backed [`BundleEngine`].
//!
//! The per-build [`PluginSet`] is exposed to Rolldown as one plugin with
//! `resolve_id` and `load` hooks. Plugin errors cross the Rolldown boundary
//! as `anyhow` errors; the typed error is kept on the side so that callers
//! still see e.g. [`Error::UnresolvedImport`] rather than a flattened
//! diagnostic.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform,
    RawMinifyOptions, SourceMapType,
};
use rolldown_common::{ModuleType, Output, ResolvedExternal};
use rolldown_plugin::{
    __inner::SharedPluginable, HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs,
    HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};

use super::{BundleEngine, BundleRequest, BundleResult, EngineOptions, with_banner};
use crate::plugins::{LoaderKind, PluginSet};
use crate::{Error, Result};

/// Map a loader kind onto the Rolldown module type.
pub fn module_type_for(loader: LoaderKind) -> ModuleType {
    match loader {
        LoaderKind::Js => ModuleType::Js,
        LoaderKind::Jsx => ModuleType::Jsx,
        LoaderKind::Ts => ModuleType::Ts,
        LoaderKind::Tsx => ModuleType::Tsx,
        LoaderKind::Css => ModuleType::Css,
    }
}

/// Rolldown plugin wrapping a [`PluginSet`].
#[derive(Debug)]
pub struct PreviewRolldownPlugin {
    plugins: Arc<PluginSet>,
    /// First resolution error raised by the set, if any.
    first_error: Arc<Mutex<Option<Error>>>,
}

impl PreviewRolldownPlugin {
    pub fn new(plugins: Arc<PluginSet>) -> Self {
        Self {
            plugins,
            first_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Take the first typed error the hooks reported.
    pub fn take_error(&self) -> Option<Error> {
        self.first_error.lock().take()
    }

    fn error_slot(&self) -> Arc<Mutex<Option<Error>>> {
        Arc::clone(&self.first_error)
    }
}

impl Plugin for PreviewRolldownPlugin {
    fn name(&self) -> Cow<'static, str> {
        "fob-preview".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let outcome = self.plugins.resolve(args.importer, args.specifier);
        let slot = self.error_slot();

        async move {
            // Never hand a specifier back to Rolldown's filesystem resolver.
            match outcome {
                Ok(module) => Ok(Some(HookResolveIdOutput {
                    id: module.id().into(),
                    external: Some(ResolvedExternal::Bool(false)),
                    ..Default::default()
                })),
                Err(err) => {
                    let message = err.to_string();
                    slot.lock().get_or_insert(err);
                    Err(anyhow::anyhow!(message))
                }
            }
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let loaded = self.plugins.load(args.id);

        async move {
            Ok(loaded.map(|module| HookLoadOutput {
                code: module.contents.into(),
                module_type: Some(module_type_for(module.loader)),
                ..Default::default()
            }))
        }
    }
}

/// [`BundleEngine`] implementation over Rolldown.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolldownEngine;

impl RolldownEngine {
    pub fn new() -> Self {
        Self
    }

    fn bundler_options(entry: &str, options: &EngineOptions) -> BundlerOptions {
        BundlerOptions {
            input: Some(vec![InputItem {
                name: None,
                import: entry.to_string(),
            }]),
            format: Some(OutputFormat::Iife),
            platform: Some(Platform::Browser),
            sourcemap: options.sourcemap.then_some(SourceMapType::Inline),
            minify: options.minify.then(|| RawMinifyOptions::from(true)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl BundleEngine for RolldownEngine {
    fn name(&self) -> &'static str {
        "rolldown"
    }

    async fn bundle(&self, request: BundleRequest) -> Result<BundleResult> {
        if !request.options.bundle {
            return Err(Error::InvalidConfig(
                "the rolldown engine always bundles; bundle: false is not supported".to_string(),
            ));
        }

        let plugin = Arc::new(PreviewRolldownPlugin::new(Arc::clone(&request.plugins)));
        let plugins: Vec<SharedPluginable> = vec![Arc::clone(&plugin) as SharedPluginable];

        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(Self::bundler_options(&request.entry, &request.options))
            .with_plugins(plugins)
            .build()
            .map_err(|e| Error::from_engine_error(&e))?;

        let output = match bundler.generate().await {
            Ok(output) => output,
            Err(e) => return Err(plugin.take_error().unwrap_or_else(|| Error::from_engine_error(&e))),
        };

        let mut code = None;
        let mut stylesheets = Vec::new();
        for asset in &output.assets {
            match asset {
                Output::Chunk(chunk) => {
                    if code.is_none() {
                        code = Some(chunk.code.clone());
                    } else {
                        tracing::debug!(filename = %chunk.filename, "Ignoring extra output chunk");
                    }
                }
                Output::Asset(asset) if asset.filename.ends_with(".css") => {
                    stylesheets.push(String::from_utf8_lossy(asset.source.as_bytes()).into_owned());
                }
                Output::Asset(asset) => {
                    tracing::debug!(filename = %asset.filename, "Ignoring non-stylesheet asset");
                }
            }
        }

        let code = code.ok_or_else(|| Error::EmptyOutput(request.entry.clone()))?;
        Ok(BundleResult {
            code: with_banner(&request.options.banner, &code),
            stylesheets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_type_mapping() {
        assert!(matches!(module_type_for(LoaderKind::Js), ModuleType::Js));
        assert!(matches!(module_type_for(LoaderKind::Jsx), ModuleType::Jsx));
        assert!(matches!(module_type_for(LoaderKind::Ts), ModuleType::Ts));
        assert!(matches!(module_type_for(LoaderKind::Tsx), ModuleType::Tsx));
        assert!(matches!(module_type_for(LoaderKind::Css), ModuleType::Css));
    }

    #[test]
    fn test_bundler_options_are_fixed() {
        let options = RolldownEngine::bundler_options("app/page.tsx", &EngineOptions::preview());
        assert!(matches!(options.format, Some(OutputFormat::Iife)));
        assert!(matches!(options.platform, Some(Platform::Browser)));
        assert!(options.sourcemap.is_none());
        assert!(options.minify.is_none());
        assert_eq!(options.input.unwrap()[0].import, "app/page.tsx");
    }
}

//! Host shim plugin.
//!
//! The sandbox document loads React and ReactDOM as UMD globals. Generated
//! code still writes `import React from "react"`, so these specifiers are
//! resolved to tiny CommonJS modules that hand back the host globals. The
//! bundle stays free of framework code.

use super::{LoadedModule, LoaderKind, Namespace, ResolvedModule};

/// One allow-listed specifier and the module that stands in for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostShim {
    pub specifier: &'static str,
    /// Name of the property on `globalThis` the shim reads.
    pub global: &'static str,
    pub body: &'static str,
}

const JSX_RUNTIME_SHIM: &str = r#"var React = globalThis.React;
function jsx(type, props, key) {
  var config = Object.assign({}, props);
  if (key !== undefined) config.key = key;
  return React.createElement(type, config);
}
module.exports = { jsx: jsx, jsxs: jsx, jsxDEV: jsx, Fragment: React.Fragment };
"#;

/// The shim table. Its specifiers are exactly
/// [`ALLOWED_BARE_SPECIFIERS`](crate::policy::ALLOWED_BARE_SPECIFIERS).
pub const HOST_SHIMS: &[HostShim] = &[
    HostShim {
        specifier: "react",
        global: "React",
        body: "module.exports = globalThis.React;\n",
    },
    HostShim {
        specifier: "react-dom",
        global: "ReactDOM",
        body: "module.exports = globalThis.ReactDOM;\n",
    },
    HostShim {
        specifier: "react-dom/client",
        global: "ReactDOM",
        body: "module.exports = globalThis.ReactDOM;\n",
    },
    HostShim {
        specifier: "react/jsx-runtime",
        global: "React",
        body: JSX_RUNTIME_SHIM,
    },
];

/// Plugin that intercepts allow-listed bare imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostShimPlugin;

impl HostShimPlugin {
    pub fn new() -> Self {
        Self
    }

    pub fn shim_for(&self, specifier: &str) -> Option<&'static HostShim> {
        HOST_SHIMS.iter().find(|shim| shim.specifier == specifier)
    }

    /// Claims the specifier if it has a shim. Never fails.
    pub fn resolve(&self, specifier: &str) -> Option<ResolvedModule> {
        self.shim_for(specifier)
            .map(|shim| ResolvedModule::host_shim(shim.specifier))
    }

    pub fn load(&self, module: &ResolvedModule) -> Option<LoadedModule> {
        if module.namespace != Namespace::HostShim {
            return None;
        }
        self.shim_for(&module.path).map(|shim| LoadedModule {
            contents: shim.body.to_string(),
            loader: LoaderKind::Js,
        })
    }
}

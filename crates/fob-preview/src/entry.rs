//! Entry rewriting.
//!
//! The bundle is an IIFE, so the entry's default export is not reachable
//! from outside. The rewriter finds the name of the default-exported
//! component and appends a statement that stores it on a global slot, where
//! the sandbox bootstrap picks it up.
//!
//! Two shapes are recognised:
//!
//! ```text
//! export default function GeneratedPage() { ... }
//!
//! function GeneratedPage() { ... }
//! export default GeneratedPage;
//! ```
//!
//! Matching is textual. Anonymous defaults (`export default () => ...`,
//! `export default function () {}`), classes and expressions are rejected.

use std::sync::LazyLock;

use regex::Regex;

use crate::files::VirtualFileTable;
use crate::{Error, Result};

static DEFAULT_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexport\s+default\s+function\s+([A-Za-z_$][\w$]*)\s*\(")
        .expect("default function pattern is valid")
});

static DEFAULT_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\bexport\s+default\s+([A-Za-z_$][\w$]*)\s*(?:;|$)")
        .expect("default identifier pattern is valid")
});

/// Words that can follow `export default` without naming a binding.
const NON_BINDING_WORDS: &[&str] = &[
    "async", "class", "function", "new", "null", "this", "true", "false", "undefined", "void",
    "typeof", "await", "yield",
];

/// Which default-export shape the entry uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultExportShape {
    /// `export default function Name(...)`
    FunctionDeclaration,
    /// `export default Name;`
    Identifier,
}

/// The component binding found in an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultExport {
    pub name: String,
    pub shape: DefaultExportShape,
}

/// Find the entry's default-exported component name.
pub fn find_default_export(source: &str) -> Option<DefaultExport> {
    if let Some(caps) = DEFAULT_FUNCTION.captures(source) {
        return Some(DefaultExport {
            name: caps[1].to_string(),
            shape: DefaultExportShape::FunctionDeclaration,
        });
    }

    DEFAULT_IDENTIFIER
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .find(|name| !NON_BINDING_WORDS.contains(&name.as_str()))
        .map(|name| DefaultExport {
            name,
            shape: DefaultExportShape::Identifier,
        })
}

/// The statement appended to the entry.
pub fn global_assignment(global_slot: &str, component: &str) -> String {
    format!("\n;globalThis.{} = {};\n", global_slot, component)
}

/// An entry source with the global assignment appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenEntry {
    pub source: String,
    pub export: DefaultExport,
}

/// Rewrite `source` so its default export lands on `globalThis[global_slot]`.
///
/// `entry_path` only feeds the error message.
pub fn rewrite_entry_source(
    entry_path: &str,
    source: &str,
    global_slot: &str,
) -> Result<RewrittenEntry> {
    let export = find_default_export(source).ok_or_else(|| Error::MissingDefaultExport {
        path: entry_path.to_string(),
    })?;

    let assignment = global_assignment(global_slot, &export.name);
    let mut rewritten = String::with_capacity(source.len() + assignment.len());
    rewritten.push_str(source);
    rewritten.push_str(&assignment);

    Ok(RewrittenEntry {
        source: rewritten,
        export,
    })
}

/// Rewrite the entry file inside `table`, returning the export it found.
pub fn rewrite_entry(
    table: &mut VirtualFileTable,
    entry: &str,
    global_slot: &str,
) -> Result<DefaultExport> {
    let source = table
        .get(entry)
        .ok_or_else(|| Error::EntryNotFound(entry.to_string()))?;
    let RewrittenEntry { source, export } = rewrite_entry_source(entry, source, global_slot)?;

    tracing::debug!(
        entry,
        component = %export.name,
        shape = ?export.shape,
        "Rewrote entry default export"
    );

    table.replace(entry, source);
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::VirtualFile;

    const SLOT: &str = "__FOB_PREVIEW_COMPONENT__";

    #[test]
    fn test_named_function_declaration() {
        let source = "export default function GeneratedPage(){ return null; }";
        let rewritten = rewrite_entry_source("page.tsx", source, SLOT).unwrap().source;
        assert!(rewritten.starts_with(source));
        assert!(rewritten.ends_with("globalThis.__FOB_PREVIEW_COMPONENT__ = GeneratedPage;\n"));
    }

    #[test]
    fn test_separate_identifier_export() {
        let source = "const Dashboard = () => null;\n\nexport default Dashboard;\n";
        let export = find_default_export(source).unwrap();
        assert_eq!(export.name, "Dashboard");
        assert_eq!(export.shape, DefaultExportShape::Identifier);

        let rewritten = rewrite_entry_source("page.tsx", source, SLOT).unwrap().source;
        assert!(rewritten.contains("globalThis.__FOB_PREVIEW_COMPONENT__ = Dashboard;"));
    }

    #[test]
    fn test_identifier_export_without_semicolon() {
        let source = "function Page() { return null }\nexport default Page\n";
        assert_eq!(find_default_export(source).unwrap().name, "Page");
    }

    #[test]
    fn test_function_with_generic_props() {
        let source = "export default   function   Page ( props: Props ) { return null }";
        assert_eq!(
            find_default_export(source).unwrap().shape,
            DefaultExportShape::FunctionDeclaration
        );
    }

    #[test]
    fn test_anonymous_arrow_is_rejected() {
        let err =
            rewrite_entry_source("app/generated/page.tsx", "export default () => null;", SLOT)
                .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("entry must export a named default component"));
        assert!(message.contains("app/generated/page.tsx"));
    }

    #[test]
    fn test_anonymous_function_is_rejected() {
        assert!(find_default_export("export default function () { return null; }").is_none());
        assert!(find_default_export("export default function(){}").is_none());
    }

    #[test]
    fn test_other_shapes_are_rejected() {
        assert!(find_default_export("export default class Page {}").is_none());
        assert!(find_default_export("export default async function Page() {}").is_none());
        assert!(find_default_export("export default memo(Page);").is_none());
        assert!(find_default_export("export const Page = () => null;").is_none());
        assert!(find_default_export("export default null;").is_none());
    }

    #[test]
    fn test_rewrite_entry_in_table() {
        let mut table = VirtualFileTable::from_files([VirtualFile::new(
            "app/generated/page.tsx",
            "export default function GeneratedPage(){ return null; }",
        )]);
        let export = rewrite_entry(&mut table, "app/generated/page.tsx", SLOT).unwrap();
        assert_eq!(export.name, "GeneratedPage");
        assert_eq!(export.shape, DefaultExportShape::FunctionDeclaration);
        assert!(
            table
                .get("app/generated/page.tsx")
                .unwrap()
                .contains("globalThis.__FOB_PREVIEW_COMPONENT__ = GeneratedPage;")
        );
    }

    #[test]
    fn test_missing_entry() {
        let mut table = VirtualFileTable::new();
        match rewrite_entry(&mut table, "app/generated/page.tsx", SLOT) {
            Err(Error::EntryNotFound(path)) => assert_eq!(path, "app/generated/page.tsx"),
            other => panic!("expected EntryNotFound, got {:?}", other),
        }
    }
}

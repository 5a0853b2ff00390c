//! Import policy guard.
//!
//! Generated code may import other generated files (relative specifiers) and
//! a handful of host-provided framework modules. Anything else is rejected
//! before the bundler is ever started, with one violation per offending file.
//!
//! Scanning is textual. It covers static imports and re-exports (with or
//! without whitespace after the keyword), `import("x")` and `require("x")`
//! with quoted or template literals. An import inside a string literal or a
//! comment is reported like a real one, and imports built from non-literal
//! expressions are not seen at all. The resolver is the backstop for what the
//! scan misses: a specifier no plugin claims fails the build.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::files::VirtualFileTable;
use crate::{Error, Result};

/// Bare specifiers the host page provides at run time.
///
/// Each entry has a matching shim in [`crate::plugins::host_shims`].
pub const ALLOWED_BARE_SPECIFIERS: &[&str] =
    &["react", "react-dom", "react-dom/client", "react/jsx-runtime"];

static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s*(?:type\b\s*)?(?:[\w$*{}\s,]+?\s*from\s*)?["']([^"'\n]+)["']"#)
        .expect("static import pattern is valid")
});

static REEXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bexport\s*(?:type\b\s*)?(?:\*(?:\s*as\s+[\w$]+)?|\{[^}]*\})\s*from\s*["']([^"'\n]+)["']"#,
    )
    .expect("re-export pattern is valid")
});

static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s*\(\s*["'`]([^"'`\n]+)["'`]\s*\)"#)
        .expect("dynamic import pattern is valid")
});

static REQUIRE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\s*\(\s*["'`]([^"'`\n]+)["'`]\s*\)"#)
        .expect("require pattern is valid")
});

/// How a specifier is treated by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `./` or `../` prefix, served from the virtual file table.
    Relative,
    /// On [`ALLOWED_BARE_SPECIFIERS`], served by a host shim.
    AllowedBare,
    /// Anything else.
    Disallowed,
}

/// A specifier found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub value: String,
    pub kind: ImportKind,
    /// Byte offset of the import statement in the scanned source.
    pub offset: usize,
}

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

pub fn is_allowed_bare(specifier: &str) -> bool {
    ALLOWED_BARE_SPECIFIERS.contains(&specifier)
}

pub fn classify_specifier(specifier: &str) -> ImportKind {
    if is_relative(specifier) {
        ImportKind::Relative
    } else if is_allowed_bare(specifier) {
        ImportKind::AllowedBare
    } else {
        ImportKind::Disallowed
    }
}

/// Find every import specifier in `source`, in source order.
pub fn scan_import_specifiers(source: &str) -> Vec<ImportSpecifier> {
    let mut found: Vec<ImportSpecifier> = [
        &*STATIC_IMPORT,
        &*REEXPORT,
        &*DYNAMIC_IMPORT,
        &*REQUIRE_CALL,
    ]
        .into_iter()
        .flat_map(|pattern| pattern.captures_iter(source))
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value = caps.get(1)?.as_str().to_string();
            Some(ImportSpecifier {
                kind: classify_specifier(&value),
                value,
                offset: whole.start(),
            })
        })
        .collect();

    found.sort_by_key(|spec| spec.offset);
    found
}

/// All disallowed specifiers in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyViolation {
    pub file: String,
    /// Deduplicated, in order of first appearance.
    pub specifiers: Vec<String>,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self
            .specifiers
            .iter()
            .map(|s| format!("\"{}\"", s))
            .collect();
        write!(
            f,
            "{} imports disallowed module{}: {}",
            self.file,
            if self.specifiers.len() == 1 { "" } else { "s" },
            quoted.join(", ")
        )
    }
}

/// Collect violations for every file in the table, in table order.
pub fn find_violations(table: &VirtualFileTable) -> Vec<PolicyViolation> {
    table
        .iter()
        .filter_map(|(path, source)| {
            let offending: IndexSet<String> = scan_import_specifiers(source)
                .into_iter()
                .filter(|spec| spec.kind == ImportKind::Disallowed)
                .map(|spec| spec.value)
                .collect();

            if offending.is_empty() {
                None
            } else {
                Some(PolicyViolation {
                    file: path.to_string(),
                    specifiers: offending.into_iter().collect(),
                })
            }
        })
        .collect()
}

/// Pre-flight gate: fail if any file imports a disallowed module.
pub fn check_import_policy(table: &VirtualFileTable) -> Result<()> {
    let violations = find_violations(table);
    if violations.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        files = violations.len(),
        "Import policy rejected generated files"
    );
    Err(Error::PolicyViolation(violations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::VirtualFile;

    fn values(source: &str) -> Vec<String> {
        scan_import_specifiers(source)
            .into_iter()
            .map(|s| s.value)
            .collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify_specifier("./Button"), ImportKind::Relative);
        assert_eq!(classify_specifier("../lib/x"), ImportKind::Relative);
        assert_eq!(classify_specifier("react"), ImportKind::AllowedBare);
        assert_eq!(classify_specifier("react-dom/client"), ImportKind::AllowedBare);
        assert_eq!(classify_specifier("left-pad"), ImportKind::Disallowed);
        assert_eq!(classify_specifier("react-dom/server"), ImportKind::Disallowed);
        assert_eq!(classify_specifier("/etc/passwd"), ImportKind::Disallowed);
        assert_eq!(classify_specifier("."), ImportKind::Disallowed);
    }

    #[test]
    fn test_scan_import_forms() {
        let source = r#"
import React, { useState } from "react";
import * as Client from 'react-dom/client';
import type { Props } from "./types";
import "./styles.css";
import Card from "./Card"
export { helper } from "../lib/helpers";
export * from "./constants";
const Lazy = import("./Lazy");
"#;
        assert_eq!(
            values(source),
            vec![
                "react",
                "react-dom/client",
                "./types",
                "./styles.css",
                "./Card",
                "../lib/helpers",
                "./constants",
                "./Lazy",
            ]
        );
    }

    #[test]
    fn test_scan_compact_forms() {
        let source = concat!(
            r#"import{a}from"left-pad";import*as b from"lodash";"#,
            r#"import"./side.css";export*from"axios";export{c}from'./c';"#,
            r#"import type{T}from"./types";"#,
        );
        assert_eq!(
            values(source),
            vec!["left-pad", "lodash", "./side.css", "axios", "./c", "./types"]
        );
    }

    #[test]
    fn test_scan_require_and_template_literals() {
        let source = r#"
const fs = require("fs");
const secret = require ( '/etc/passwd' );
const lazy = import(`/etc/hosts`);
const tpl = require(`./local`);
"#;
        let found = scan_import_specifiers(source);
        let values: Vec<&str> = found.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["fs", "/etc/passwd", "/etc/hosts", "./local"]);
        assert_eq!(found[1].kind, ImportKind::Disallowed);
        assert_eq!(found[3].kind, ImportKind::Relative);
    }

    #[test]
    fn test_scan_ignores_require_lookalikes() {
        assert!(values("const x = unrequire('y'); obj.required = true;").is_empty());
    }

    #[test]
    fn test_scan_multiline_named_imports() {
        let source = "import {\n  a,\n  b as c,\n} from \"lodash\";\n";
        assert_eq!(values(source), vec!["lodash"]);
    }

    #[test]
    fn test_scan_ignores_identifiers_containing_import() {
        assert!(values("const important = reimport('x');").is_empty());
    }

    #[test]
    fn test_scan_reports_string_literal_false_positive() {
        // Accepted limitation of textual scanning.
        let source = r#"const doc = `import x from "left-pad"`;"#;
        assert_eq!(values(source), vec!["left-pad"]);
    }

    #[test]
    fn test_violations_are_per_file_and_deduplicated() {
        let table = VirtualFileTable::from_files([
            VirtualFile::new(
                "app/generated/page.tsx",
                r#"import a from "left-pad";
import b from "lodash";
import c from "left-pad";
import React from "react";"#,
            ),
            VirtualFile::new("app/generated/ok.tsx", r#"import x from "./page";"#),
            VirtualFile::new("app/generated/other.tsx", r#"import fs from "fs";"#),
        ]);

        let violations = find_violations(&table);
        assert_eq!(
            violations,
            vec![
                PolicyViolation {
                    file: "app/generated/page.tsx".into(),
                    specifiers: vec!["left-pad".into(), "lodash".into()],
                },
                PolicyViolation {
                    file: "app/generated/other.tsx".into(),
                    specifiers: vec!["fs".into()],
                },
            ]
        );
    }

    #[test]
    fn test_check_import_policy_error_names_every_specifier() {
        let table = VirtualFileTable::from_files([VirtualFile::new(
            "app/generated/page.tsx",
            r#"import x from "left-pad"; import y from "axios";"#,
        )]);

        let err = check_import_policy(&table).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("left-pad"));
        assert!(message.contains("axios"));
        assert!(message.contains("app/generated/page.tsx"));
    }

    #[test]
    fn test_check_import_policy_accepts_allowed_imports() {
        let table = VirtualFileTable::from_files([VirtualFile::new(
            "app/generated/page.tsx",
            r#"import React from "react"; import { createRoot } from "react-dom/client"; import X from "./X";"#,
        )]);
        assert!(check_import_policy(&table).is_ok());
    }

    #[test]
    fn test_violation_display() {
        let violation = PolicyViolation {
            file: "a.tsx".into(),
            specifiers: vec!["left-pad".into()],
        };
        assert_eq!(
            violation.to_string(),
            "a.tsx imports disallowed module: \"left-pad\""
        );
    }
}

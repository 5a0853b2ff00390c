//! In-memory file set for one preview build.
//!
//! The code generator hands over loosely-typed `{ path, content }` records.
//! [`VirtualFileTable::from_generated`] keeps the ones with a string path and
//! string content, normalizes their paths, and drops everything else without
//! complaint. A table lives for exactly one build.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::normalize_path;
use crate::{Error, Result};

/// A raw record as produced by the code generator.
///
/// Both fields are arbitrary JSON so that malformed records can be skipped
/// instead of failing deserialization of the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedFile {
    #[serde(default)]
    pub path: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: Some(Value::String(path.into())),
            content: Some(Value::String(content.into())),
        }
    }

    /// Returns the record as a [`VirtualFile`] if both fields are strings.
    pub fn to_virtual_file(&self) -> Option<VirtualFile> {
        match (&self.path, &self.content) {
            (Some(Value::String(path)), Some(Value::String(content))) if !path.is_empty() => {
                Some(VirtualFile {
                    path: path.clone(),
                    content: content.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Generator output: either a bare list of records or a list plus entry path.
///
/// ```
/// use fob_preview::GenerationPayload;
///
/// let payload: GenerationPayload = serde_json::from_str(
///     r#"{ "files": [{ "path": "app/generated/page.tsx", "content": "" }],
///          "entryPath": "app/generated/page.tsx" }"#,
/// ).unwrap();
/// assert_eq!(payload.entry_path(), Some("app/generated/page.tsx"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationPayload {
    #[serde(rename_all = "camelCase")]
    WithEntry {
        files: Vec<GeneratedFile>,
        #[serde(default)]
        entry_path: Option<String>,
    },
    Files(Vec<GeneratedFile>),
}

impl GenerationPayload {
    pub fn files(&self) -> &[GeneratedFile] {
        match self {
            Self::WithEntry { files, .. } => files,
            Self::Files(files) => files,
        }
    }

    pub fn entry_path(&self) -> Option<&str> {
        match self {
            Self::WithEntry { entry_path, .. } => entry_path.as_deref(),
            Self::Files(_) => None,
        }
    }
}

/// A validated `{ path, content }` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    pub path: String,
    pub content: String,
}

impl VirtualFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Normalized path to source text, in first-insertion order.
///
/// Later records whose path normalizes to an existing key replace its content
/// but keep its position.
#[derive(Debug, Clone, Default)]
pub struct VirtualFileTable {
    files: IndexMap<String, String>,
}

impl VirtualFileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw generator records, skipping malformed ones.
    pub fn from_generated<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a GeneratedFile>,
    {
        let mut table = Self::new();
        let mut skipped = 0usize;
        for record in records {
            match record.to_virtual_file() {
                Some(file) => table.insert(&file.path, file.content),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "Dropped malformed generated file records");
        }
        table
    }

    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = VirtualFile>,
    {
        let mut table = Self::new();
        for file in files {
            table.insert(&file.path, file.content);
        }
        table
    }

    /// Insert under the normalized form of `path`.
    pub fn insert(&mut self, path: &str, content: impl Into<String>) {
        let key = normalize_path(path);
        if key.is_empty() {
            return;
        }
        self.files.insert(key, content.into());
    }

    /// Look up by an already-normalized path.
    pub fn get(&self, normalized: &str) -> Option<&str> {
        self.files.get(normalized).map(String::as_str)
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.files.contains_key(normalized)
    }

    /// Replace the content of an existing file. Returns `false` if absent.
    pub(crate) fn replace(&mut self, normalized: &str, content: String) -> bool {
        match self.files.get_mut(normalized) {
            Some(slot) => {
                *slot = content;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Fail on the first file whose content exceeds `max_size` bytes.
    pub fn check_sizes(&self, max_size: usize) -> Result<()> {
        for (path, content) in &self.files {
            if content.len() > max_size {
                return Err(Error::FileTooLarge {
                    path: path.clone(),
                    size: content.len(),
                    max_size,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_generated_skips_malformed_records() {
        let records: Vec<GeneratedFile> = serde_json::from_value(json!([
            { "path": "app/generated/page.tsx", "content": "export default function A() {}" },
            { "content": "no path" },
            { "path": "app/data.json", "content": { "not": "a string" } },
            { "path": 42, "content": "numeric path" },
            { "path": "app/empty.ts" },
        ]))
        .unwrap();

        let table = VirtualFileTable::from_generated(&records);
        assert_eq!(table.len(), 1);
        assert!(table.contains("app/generated/page.tsx"));
    }

    #[test]
    fn test_insert_normalizes_paths() {
        let mut table = VirtualFileTable::new();
        table.insert("/app\\generated/./page.tsx", "x");
        assert_eq!(table.get("app/generated/page.tsx"), Some("x"));
    }

    #[test]
    fn test_later_duplicate_wins_and_keeps_position() {
        let table = VirtualFileTable::from_files([
            VirtualFile::new("a.ts", "first"),
            VirtualFile::new("b.ts", "b"),
            VirtualFile::new("./a.ts", "second"),
        ]);
        assert_eq!(table.get("a.ts"), Some("second"));
        assert_eq!(table.paths().collect::<Vec<_>>(), vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_empty_path_is_dropped() {
        let table = VirtualFileTable::from_generated(&[GeneratedFile::new("", "x")]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_check_sizes() {
        let table = VirtualFileTable::from_files([VirtualFile::new("big.ts", "a".repeat(11))]);
        assert!(table.check_sizes(11).is_ok());
        match table.check_sizes(10) {
            Err(Error::FileTooLarge { path, size, max_size }) => {
                assert_eq!(path, "big.ts");
                assert_eq!(size, 11);
                assert_eq!(max_size, 10);
            }
            other => panic!("expected FileTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_accepts_bare_array() {
        let payload: GenerationPayload =
            serde_json::from_value(json!([{ "path": "a.tsx", "content": "" }])).unwrap();
        assert_eq!(payload.files().len(), 1);
        assert_eq!(payload.entry_path(), None);
    }
}

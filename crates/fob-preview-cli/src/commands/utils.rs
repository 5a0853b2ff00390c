//! Payload input and document output shared by the commands.

use crate::error::{CliError, Result};
use fob_preview::GenerationPayload;
use std::io::{Read, Write};
use std::path::Path;

const STDIO: &str = "-";

/// Read a generation payload from `path`, or stdin for `-`.
pub fn read_payload(path: &Path) -> Result<GenerationPayload> {
    let raw = if path.as_os_str() == STDIO {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.to_path_buf()));
        }
        std::fs::read_to_string(path)?
    };

    parse_payload(&raw, path)
}

pub fn parse_payload(raw: &str, path: &Path) -> Result<GenerationPayload> {
    serde_json::from_str(raw).map_err(|source| CliError::InvalidPayload {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to `path`, or stdout when no path is given.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            if !contents.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_bare_array() {
        let payload = parse_payload(
            r#"[{ "path": "app/page.tsx", "content": "export default function A() {}" }]"#,
            Path::new("payload.json"),
        )
        .unwrap();
        assert_eq!(payload.files().len(), 1);
        assert_eq!(payload.entry_path(), None);
    }

    #[test]
    fn test_parse_object_with_entry() {
        let payload = parse_payload(
            r#"{ "files": [], "entryPath": "app/page.tsx" }"#,
            Path::new("payload.json"),
        )
        .unwrap();
        assert_eq!(payload.entry_path(), Some("app/page.tsx"));
    }

    #[test]
    fn test_parse_rejects_non_payload() {
        let err = parse_payload(r#""just a string""#, Path::new("p.json")).unwrap_err();
        assert!(matches!(err, CliError::InvalidPayload { .. }));
        assert!(err.to_string().contains("p.json"));
    }

    #[test]
    fn test_missing_payload_file() {
        let temp = TempDir::new().unwrap();
        let err = read_payload(&temp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    fn test_write_output_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/nested/preview.html");
        write_output(Some(&path), "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }
}

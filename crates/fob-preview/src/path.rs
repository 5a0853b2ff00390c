//! Logical path normalization for virtual files.
//!
//! Virtual file paths are slash-separated identifiers, not filesystem paths.
//! Everything that stores or looks up a path in the
//! [`VirtualFileTable`](crate::VirtualFileTable) goes through [`normalize_path`],
//! so two spellings of the same logical file always land on the same key.
//!
//! A `..` segment at the root is dropped silently rather than reported: the
//! virtual tree has nothing above its root, and resolving `../x` from a
//! top-level file yields `x`.

/// Canonicalize a logical path.
///
/// Backslashes become `/`, leading separators are stripped, empty and `.`
/// segments are dropped, and `..` pops the previous segment.
///
/// ```
/// use fob_preview::path::normalize_path;
///
/// assert_eq!(normalize_path("/app\\generated/./page.tsx"), "app/generated/page.tsx");
/// assert_eq!(normalize_path("app/components/../page.tsx"), "app/page.tsx");
/// ```
pub fn normalize_path(path: &str) -> String {
    fold_segments(&path.replace('\\', "/"))
}

/// Resolve a relative specifier against the file that imports it.
///
/// The importer's containing directory (empty for top-level files) is joined
/// with the specifier and the result is folded segment by segment.
///
/// ```
/// use fob_preview::path::resolve_relative;
///
/// assert_eq!(
///     resolve_relative("app/generated/page.tsx", "./components/Card"),
///     "app/generated/components/Card"
/// );
/// assert_eq!(resolve_relative("page.tsx", "../../theme.ts"), "theme.ts");
/// ```
pub fn resolve_relative(importer: &str, specifier: &str) -> String {
    let importer = importer.replace('\\', "/");
    let dir = importer_dir(&importer);
    let joined = if dir.is_empty() {
        specifier.replace('\\', "/")
    } else {
        format!("{}/{}", dir, specifier.replace('\\', "/"))
    };
    fold_segments(&joined)
}

/// Containing directory of a normalized path, or `""` for top-level files.
pub fn importer_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Extension of the final segment, without the dot.
pub(crate) fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&file_name[idx + 1..]),
    }
}

fn fold_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                // Popping past the root is a no-op.
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

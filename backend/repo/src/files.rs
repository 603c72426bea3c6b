use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use codedoc_core::SourceFile;

const SKIPPED_DIRS: [&str; 2] = ["node_modules", ".git"];

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Collect the files under `root` whose extension is in `extensions`.
///
/// Files over `max_bytes` or not valid UTF-8 are skipped. The result is
/// sorted by relative path so documentation output is stable.
pub fn collect_source_files(root: &Path, extensions: &[String], max_bytes: u64) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let wanted = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if !wanted {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(u64::MAX);
        if size > max_bytes {
            debug!(path = %path.display(), size, "Skipping oversized file");
            continue;
        }

        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let Ok(content) = String::from_utf8(bytes) else {
            warn!(path = %path.display(), "Skipping non-UTF-8 file");
            continue;
        };

        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        files.push(SourceFile {
            path: path.to_path_buf(),
            relative_path,
            content,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts() -> Vec<String> {
        ["js", "ts", "jsx", "tsx"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_collects_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/components")).unwrap();
        fs::create_dir_all(root.join("node_modules/react")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("src/index.ts"), "export {}").unwrap();
        fs::write(root.join("src/components/App.tsx"), "<App />").unwrap();
        fs::write(root.join("app.js"), "1").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();
        fs::write(root.join("node_modules/react/index.js"), "x").unwrap();
        fs::write(root.join(".git/hook.js"), "x").unwrap();

        let files = collect_source_files(root, &exts(), 1024).unwrap();
        let rel: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(rel, vec!["app.js", "src/components/App.tsx", "src/index.ts"]);
        assert_eq!(files[2].content, "export {}");
    }

    #[test]
    fn test_skips_oversized_and_binary() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("big.js"), "x".repeat(64)).unwrap();
        fs::write(root.join("bin.js"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(root.join("ok.js"), "ok").unwrap();

        let files = collect_source_files(root, &exts(), 16).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "ok.js");
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_source_files(&dir.path().join("nope"), &exts(), 16).is_err());
    }
}

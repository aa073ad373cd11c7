//! Classpath scanning over directory roots.

use crate::collaborators::ClasspathScanner;
use crate::model::ClassName;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Lists class files below a directory and maps them to class names.
///
/// `root/com/example/Rules.class` becomes `com.example.Rules`. A root that
/// is a single file yields nothing, since its package cannot be derived.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    extension: String,
}

impl DirectoryScanner {
    /// Creates a scanner for files with the given extension (without dot).
    #[must_use]
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    fn class_name(&self, root: &Path, path: &Path) -> Option<ClassName> {
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return None;
        }
        let relative = path.strip_prefix(root).ok()?.with_extension("");
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(ClassName::new(parts.join(".")))
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new("class")
    }
}

impl ClasspathScanner for DirectoryScanner {
    fn scan(&self, root: &Path) -> Result<Vec<ClassName>, std::io::Error> {
        if !root.is_dir() {
            debug!("Classpath root {} is not a directory", root.display());
            return Ok(Vec::new());
        }

        let mut classes = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(class) = self.class_name(root, entry.path()) {
                classes.push(class);
            }
        }

        debug!("Found {} class files under {}", classes.len(), root.display());
        Ok(classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("has parent")).expect("create dirs");
        fs::write(path, b"").expect("write file");
    }

    #[test]
    fn maps_class_files_to_qualified_names() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "com/example/Rules.class");
        touch(tmp.path(), "com/example/sub/Outer$Inner.class");
        touch(tmp.path(), "com/example/readme.txt");

        let classes = DirectoryScanner::default().scan(tmp.path()).unwrap();
        assert_eq!(
            classes,
            vec![
                ClassName::new("com.example.Rules"),
                ClassName::new("com.example.sub.Outer$Inner"),
            ]
        );
    }

    #[test]
    fn honors_custom_extension() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/B.kclass");
        touch(tmp.path(), "a/C.class");

        let classes = DirectoryScanner::new("kclass").scan(tmp.path()).unwrap();
        assert_eq!(classes, vec![ClassName::new("a.B")]);
    }

    #[test]
    fn missing_or_file_root_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/B.class");
        let scanner = DirectoryScanner::default();
        assert!(scanner.scan(&tmp.path().join("a/B.class")).unwrap().is_empty());
        assert!(scanner.scan(&tmp.path().join("missing")).unwrap().is_empty());
    }
}

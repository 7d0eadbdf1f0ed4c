//! Module resolution for guest entry points.
//!
//! The sandbox defines no module system; it only asks a resolver where a
//! specifier lives and what its source text is.

use std::io;
use std::path::{Component, Path, PathBuf};

pub trait ModuleResolver {
    /// Path of `specifier` as imported from the file `from`, if it exists
    /// and may be loaded.
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf>;

    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Resolves `./` and `../` specifiers to files under a fixed root.
///
/// Tries the path as given, then with each extension, then an `index`
/// file inside it. Paths escaping the root never resolve.
#[derive(Debug, Clone)]
pub struct RelativeFileResolver {
    root: PathBuf,
    extensions: Vec<String>,
}

impl RelativeFileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
            extensions: vec!["js".to_string()],
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, base: &Path) -> Vec<PathBuf> {
        let mut out = vec![base.to_path_buf()];
        for ext in &self.extensions {
            let mut name = base.as_os_str().to_owned();
            name.push(".");
            name.push(ext);
            out.push(PathBuf::from(name));
        }
        for ext in &self.extensions {
            out.push(base.join(format!("index.{ext}")));
        }
        out
    }
}

impl ModuleResolver for RelativeFileResolver {
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf> {
        if !(specifier.starts_with("./") || specifier.starts_with("../")) {
            return None;
        }
        let dir = from.parent().unwrap_or(&self.root);
        let base = normalize(&dir.join(specifier));
        if !base.starts_with(&self.root) {
            return None;
        }
        self.candidates(&base).into_iter().find(|p| p.is_file())
    }

    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Lexically remove `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, RelativeFileResolver) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib/util")).unwrap();
        fs::write(dir.path().join("main.js"), "main").unwrap();
        fs::write(dir.path().join("lib/math.js"), "math").unwrap();
        fs::write(dir.path().join("lib/util/index.js"), "util").unwrap();
        let resolver = RelativeFileResolver::new(dir.path());
        (dir, resolver)
    }

    #[test]
    fn test_resolves_with_extension_and_index() {
        let (dir, resolver) = project();
        let main = dir.path().join("main.js");

        let math = resolver.resolve("./lib/math", &main).unwrap();
        assert_eq!(resolver.load(&math).unwrap(), "math");
        let exact = resolver.resolve("./lib/math.js", &main).unwrap();
        assert_eq!(exact, math);
        let util = resolver.resolve("./lib/util", &main).unwrap();
        assert_eq!(resolver.load(&util).unwrap(), "util");
    }

    #[test]
    fn test_parent_directory_specifier() {
        let (dir, resolver) = project();
        let from = dir.path().join("lib/util/index.js");
        let math = resolver.resolve("../math", &from).unwrap();
        assert_eq!(resolver.load(&math).unwrap(), "math");
    }

    #[test]
    fn test_rejects_bare_missing_and_escaping_specifiers() {
        let (dir, resolver) = project();
        let main = dir.path().join("main.js");
        assert_eq!(resolver.resolve("fs", &main), None);
        assert_eq!(resolver.resolve("./missing", &main), None);
        assert_eq!(resolver.resolve("../../etc/passwd", &main), None);
    }
}

use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Directory names never descended into, regardless of extra skips.
const DEFAULT_SKIP_DIRS: &[&str] = &["target", "vendor", "testdata"];

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks a directory tree collecting Rust
/// source files. Hidden directories, build output (`target`), vendored
/// dependencies (`vendor`), and fixture trees (`testdata`) are skipped, as
/// are files ending in `_test.rs`. Callers that need a stricter walk (the
/// type registry excludes test-only directories too) add skips with
/// [`FileScanner::skip_dirs`].
///
/// # Example
///
/// ```no_run
/// use routedoc::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    extra_skip_dirs: Vec<String>,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// Paths of all discovered `.rs` files.
    pub rust_files: Vec<PathBuf>,
    /// Warnings for entries that could not be accessed. Scanning continues
    /// past them; only the root being unreadable is fatal.
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a scanner rooted at `root_path`.
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            extra_skip_dirs: Vec::new(),
        }
    }

    /// Adds directory names to skip on top of the defaults.
    pub fn skip_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_skip_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Walks the tree and collects every `.rs` file that is not a `_test.rs`
    /// file and does not live under a skipped directory.
    pub fn scan(&self) -> ScanResult {
        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                if !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !self.is_skipped_dir(&name)
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if !path.is_file() {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy();
                    if name.ends_with(".rs") && !name.ends_with("_test.rs") {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        rust_files.sort();

        ScanResult {
            rust_files,
            warnings,
        }
    }

    fn is_skipped_dir(&self, name: &str) -> bool {
        name.starts_with('.')
            || DEFAULT_SKIP_DIRS.contains(&name)
            || self.extra_skip_dirs.iter().any(|s| s == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_normal_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("lib.rs"), "pub fn test() {}").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan();

        assert_eq!(result.rust_files.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/models")).unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("src/lib.rs"), "pub fn test() {}").unwrap();
        fs::write(root.join("src/models/user.rs"), "struct User;").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan();

        assert_eq!(result.rust_files.len(), 3);
    }

    #[test]
    fn test_scan_skips_default_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for dir in ["target", "vendor", "testdata", ".git"] {
            fs::create_dir(root.join(dir)).unwrap();
            fs::write(root.join(dir).join("hidden.rs"), "fn f() {}").unwrap();
        }
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan();

        assert_eq!(result.rust_files.len(), 1);
        assert!(result.rust_files[0].ends_with("main.rs"));
    }

    #[test]
    fn test_scan_skips_test_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("routes.rs"), "fn f() {}").unwrap();
        fs::write(root.join("routes_test.rs"), "fn g() {}").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan();

        assert_eq!(result.rust_files.len(), 1);
        assert!(result.rust_files[0].ends_with("routes.rs"));
    }

    #[test]
    fn test_extra_skip_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("tests")).unwrap();
        fs::write(root.join("tests/fixture.rs"), "fn f() {}").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let default = FileScanner::new(root.to_path_buf()).scan();
        assert_eq!(default.rust_files.len(), 2);

        let strict = FileScanner::new(root.to_path_buf())
            .skip_dirs(["tests"])
            .scan();
        assert_eq!(strict.rust_files.len(), 1);
    }

    #[test]
    fn test_scan_output_is_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("b.rs"), "").unwrap();
        fs::write(root.join("a.rs"), "").unwrap();
        fs::write(root.join("c.rs"), "").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan();
        let names: Vec<_> = result
            .rust_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.rs", "b.rs", "c.rs"]);
    }
}

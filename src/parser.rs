use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// AST parser for Rust source files.
///
/// Uses `syn` to parse source code into a syntax tree, tagging each file
/// with the module name it contributes declarations to. Doc comments are
/// preserved by syn as `#[doc]` attributes, which is all the downstream
/// annotation pass needs.
pub struct AstParser;

/// A successfully parsed source file.
#[derive(Debug)]
pub struct SourceFile {
    /// Path to the source file.
    pub path: PathBuf,
    /// Module name the file belongs to (see [`module_name`]).
    pub package: String,
    /// The parsed syntax tree.
    pub ast: syn::File,
}

impl AstParser {
    /// Parses a single file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`] when the file cannot be read and
    /// [`Error::Parse`] when it is not valid Rust.
    pub fn parse_file(path: &Path) -> Result<SourceFile> {
        debug!("parsing {}", path.display());

        let content = fs::read_to_string(path)?;
        let ast = syn::parse_file(&content).map_err(|e| Error::parse(path, &e))?;

        Ok(SourceFile {
            path: path.to_path_buf(),
            package: module_name(path),
            ast,
        })
    }

    /// Parses a batch of files, failing on the first error.
    ///
    /// A file that cannot be parsed aborts the run: continuing would emit a
    /// document that silently omits part of the API surface.
    pub fn parse_files(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
        paths.iter().map(|p| Self::parse_file(p)).collect()
    }
}

/// Derives the module name a file contributes to.
///
/// The file stem names the module, except for `mod.rs`, `lib.rs`, and
/// `main.rs`, which take their parent directory's name; a parent named `src`
/// defers to the directory above it (the package directory).
pub fn module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    if stem != "mod" && stem != "lib" && stem != "main" {
        return stem;
    }

    let mut dir = path.parent();
    while let Some(d) = dir {
        match d.file_name().map(|n| n.to_string_lossy().to_string()) {
            Some(name) if name == "src" => dir = d.parent(),
            Some(name) if !name.is_empty() => return name,
            _ => break,
        }
    }
    "main".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "users.rs",
            "pub struct User { pub id: u32, pub name: String }",
        );

        let parsed = AstParser::parse_file(&path).unwrap();
        assert_eq!(parsed.package, "users");
        assert_eq!(parsed.ast.items.len(), 1);
    }

    #[test]
    fn test_parse_invalid_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let good = write_file(&dir, "good.rs", "fn ok() {}");
        let bad = write_file(&dir, "bad.rs", "fn broken( {");

        let err = AstParser::parse_files(&[good, bad]).unwrap_err();
        assert!(err.to_string().starts_with("parse: "));
        assert!(err.to_string().contains("bad.rs"));
    }

    #[test]
    fn test_parse_missing_file() {
        let result = AstParser::parse_file(Path::new("/nonexistent/file.rs"));
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_module_name_from_stem() {
        assert_eq!(module_name(Path::new("src/handlers.rs")), "handlers");
        assert_eq!(module_name(Path::new("api/routes.rs")), "routes");
    }

    #[test]
    fn test_module_name_for_mod_and_entry_files() {
        assert_eq!(module_name(Path::new("src/handlers/mod.rs")), "handlers");
        assert_eq!(module_name(Path::new("demo/src/main.rs")), "demo");
        assert_eq!(module_name(Path::new("demo/src/lib.rs")), "demo");
    }

    #[test]
    fn test_parse_preserves_doc_comments() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "annotated.rs",
            r#"
            /// @Summary Health check
            fn health() {}
            "#,
        );

        let parsed = AstParser::parse_file(&path).unwrap();
        let item = &parsed.ast.items[0];
        if let syn::Item::Fn(f) = item {
            assert!(!f.attrs.is_empty(), "doc attribute should survive parsing");
        } else {
            panic!("expected a function item");
        }
    }
}

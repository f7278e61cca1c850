use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Walks parent directories starting from `start` and returns the first
/// directory containing a `Cargo.toml`.
pub fn find_module_root(start: &Path) -> Result<PathBuf> {
    if start.as_os_str().is_empty() {
        return Err(Error::Config("empty start path".to_string()));
    }
    let abs = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()?.join(start)
    };

    let mut dir = abs.as_path();
    loop {
        if dir.join("Cargo.toml").is_file() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }
    Err(Error::Config(format!(
        "Cargo.toml not found above {}",
        start.display()
    )))
}

/// Reads the package name out of the manifest at `root`.
///
/// Only the `[package]` table's `name` key is needed, so the manifest is
/// line-scanned rather than fully deserialized. Hyphens are normalized to
/// underscores so the result compares against import paths.
pub fn module_prefix_from_root(root: &Path) -> Result<String> {
    if root.as_os_str().is_empty() {
        return Err(Error::Config("workspace root required".to_string()));
    }
    let manifest = root.join("Cargo.toml");
    let content = fs::read_to_string(&manifest)?;

    let mut in_package = false;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_package = line == "[package]";
            continue;
        }
        if !in_package {
            continue;
        }
        if let Some(rest) = line.strip_prefix("name") {
            let rest = rest.trim_start();
            if let Some(value) = rest.strip_prefix('=') {
                let value = value.trim().trim_matches('"');
                if !value.is_empty() {
                    return Ok(value.replace('-', "_"));
                }
            }
        }
    }
    Err(Error::Config(format!(
        "package name not found in {}",
        manifest.display()
    )))
}

/// Maps an import path like `crate::handlers` onto the source files that
/// make up that module.
///
/// The leading segment must be `crate` or the module prefix; anything else
/// lives outside the workspace and cannot be analyzed. A module backed by a
/// directory yields every non-test `.rs` file directly inside it; a module
/// backed by a single file yields just that file.
pub fn resolve_import_files(
    root: &Path,
    module_prefix: &str,
    import_path: &str,
) -> Result<Vec<PathBuf>> {
    let import_path = import_path.trim();
    if import_path.is_empty() {
        return Err(Error::HandlerResolution("empty import path".to_string()));
    }
    let module_prefix = module_prefix.trim();
    if module_prefix.is_empty() {
        return Err(Error::HandlerResolution("module prefix unknown".to_string()));
    }

    let mut segments = import_path.split("::");
    let head = segments.next().unwrap_or_default();
    if head != "crate" && head != module_prefix {
        return Err(Error::HandlerResolution(format!(
            "import {} outside module {}",
            import_path, module_prefix
        )));
    }

    let rel: Vec<&str> = segments.collect();
    let src = root.join("src");
    if rel.is_empty() {
        return source_files_in(&src);
    }

    let module_dir = rel.iter().fold(src.clone(), |p, seg| p.join(seg));
    if module_dir.is_dir() {
        return source_files_in(&module_dir);
    }

    let module_file = {
        let mut p = src;
        for seg in &rel[..rel.len() - 1] {
            p = p.join(seg);
        }
        p.join(format!("{}.rs", rel[rel.len() - 1]))
    };
    if module_file.is_file() {
        return Ok(vec![module_file]);
    }

    Err(Error::HandlerResolution(format!(
        "unresolved directory for {}",
        import_path
    )))
}

fn source_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".rs") && !name.ends_with("_test.rs") {
            files.push(path);
        }
    }
    files.sort();
    if files.is_empty() {
        return Err(Error::HandlerResolution(format!(
            "no source files in {}",
            dir.display()
        )));
    }
    Ok(files)
}

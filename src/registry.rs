use crate::error::Result;
use crate::parser::AstParser;
use crate::render::type_to_string;
use crate::scanner::FileScanner;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Workspace-wide index of named type declarations and function result
/// signatures.
///
/// The registry is populated once per run ([`TypeRegistry::index_workspace`])
/// and read-only afterwards. Both the handler analyzer and the schema
/// builder resolve type references against it.
pub struct TypeRegistry {
    packages: HashMap<String, HashMap<String, TypeDecl>>,
    functions: HashMap<String, Vec<FuncSignature>>,
    indexed_workspace: bool,
}

/// A recorded type declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub package: String,
    pub name: String,
    pub file: PathBuf,
    pub item: TypeItem,
}

/// The declaration forms the registry understands.
#[derive(Debug, Clone)]
pub enum TypeItem {
    Struct(syn::ItemStruct),
    Enum(syn::ItemEnum),
    Alias(syn::ItemType),
}

/// A function's (or inherent method's) result types within a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSignature {
    pub package: String,
    pub results: Vec<String>,
}

impl TypeRegistry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self {
            packages: HashMap::new(),
            functions: HashMap::new(),
            indexed_workspace: false,
        }
    }

    /// Records a type declaration. The first declaration of a (package,
    /// name) pair wins.
    pub fn add(&mut self, pkg: &str, file: &Path, item: TypeItem) {
        let name = match &item {
            TypeItem::Struct(s) => s.ident.to_string(),
            TypeItem::Enum(e) => e.ident.to_string(),
            TypeItem::Alias(a) => a.ident.to_string(),
        };
        if name.is_empty() {
            return;
        }
        let pkg = if pkg.trim().is_empty() { "main" } else { pkg.trim() };
        let slot = self.packages.entry(pkg.to_string()).or_default();
        slot.entry(name.clone()).or_insert_with(|| TypeDecl {
            package: pkg.to_string(),
            name,
            file: file.to_path_buf(),
            item,
        });
    }

    /// Registers a function or method signature, deduplicating identical
    /// entries.
    pub fn add_function(&mut self, pkg: &str, name: &str, results: Vec<String>) {
        if name.is_empty() || results.is_empty() {
            return;
        }
        let sig = FuncSignature {
            package: pkg.to_string(),
            results,
        };
        let existing = self.functions.entry(name.to_string()).or_default();
        if existing.contains(&sig) {
            return;
        }
        existing.push(sig);
    }

    /// Returns result types for a function name when the signature is
    /// unambiguous.
    ///
    /// `expected` of 0 accepts any arity; otherwise only signatures with
    /// exactly that many results qualify. An `alias` derived from the call
    /// site narrows the candidate set to one package when any candidate
    /// lives there.
    pub fn lookup_function(
        &self,
        name: &str,
        expected: usize,
        alias: Option<&str>,
    ) -> Option<&[String]> {
        let candidates = self.functions.get(name)?;
        if candidates.is_empty() {
            return None;
        }

        let filtered: Vec<&FuncSignature> = match alias {
            Some(alias) => {
                let alias = alias.trim_start_matches('&').trim_start_matches('*');
                let alias_lower = alias.to_lowercase();
                let matching: Vec<&FuncSignature> = candidates
                    .iter()
                    .filter(|c| c.package.to_lowercase() == alias_lower)
                    .collect();
                if matching.is_empty() {
                    candidates.iter().collect()
                } else {
                    matching
                }
            }
            None => candidates.iter().collect(),
        };

        if filtered.len() == 1 {
            let sig = filtered[0];
            if expected == 0 || sig.results.len() == expected {
                return Some(&sig.results);
            }
            return None;
        }

        let mut found: Option<&[String]> = None;
        for sig in filtered {
            if expected > 0 && sig.results.len() != expected {
                continue;
            }
            if found.is_some() {
                return None;
            }
            found = Some(&sig.results);
        }
        found
    }

    /// Locates a type declaration by name.
    ///
    /// A qualified name like `models::User` takes its package hint from the
    /// segment before the final `::`; an unqualified name uses
    /// `default_pkg`. The exact (package, name) slot is probed first; when
    /// absent, all packages are scanned for a same-named type, preferring an
    /// exact or suffix match on the hint, then the default package. The
    /// returned key is the canonical `package::Name` spelling used for
    /// component bookkeeping.
    pub fn resolve(&self, type_name: &str, default_pkg: &str) -> (Option<&TypeDecl>, String) {
        if type_name.is_empty() {
            return (None, String::new());
        }
        let segments: Vec<&str> = type_name.split("::").collect();
        let name = segments[segments.len() - 1];
        let hint = if segments.len() >= 2 {
            segments[segments.len() - 2]
        } else {
            default_pkg
        };
        let hint = hint.trim();
        if hint.is_empty() {
            return (None, String::new());
        }
        let fallback_key = format!("{}::{}", hint, name);

        if let Some(decl) = self.packages.get(hint).and_then(|m| m.get(name)) {
            return (Some(decl), fallback_key);
        }

        let mut candidates: Vec<&TypeDecl> = Vec::new();
        for pkg_map in self.packages.values() {
            if let Some(decl) = pkg_map.get(name) {
                candidates.push(decl);
            }
        }
        candidates.sort_by(|a, b| a.package.cmp(&b.package));

        match candidates.len() {
            0 => return (None, fallback_key),
            1 => {
                let decl = candidates[0];
                return (Some(decl), format!("{}::{}", decl.package, name));
            }
            _ => {}
        }

        let hint_lower = hint.to_lowercase();
        let mut best: Option<&TypeDecl> = None;
        for decl in &candidates {
            let pkg_lower = decl.package.to_lowercase();
            if hint_lower == pkg_lower || hint_lower.ends_with(&pkg_lower) {
                if best.is_some() {
                    return (None, fallback_key);
                }
                best = Some(decl);
            }
        }
        if let Some(decl) = best {
            return (Some(decl), format!("{}::{}", decl.package, name));
        }

        let default_lower = default_pkg.trim().to_lowercase();
        if !default_lower.is_empty() {
            for decl in &candidates {
                if decl.package.to_lowercase() == default_lower {
                    return (Some(decl), format!("{}::{}", decl.package, name));
                }
            }
        }

        (None, fallback_key)
    }

    /// Walks the workspace rooted at `root` and records every type and
    /// function declaration. Re-indexing is a no-op; a parse error in any
    /// file aborts indexing.
    pub fn index_workspace(&mut self, root: &Path) -> Result<()> {
        if root.as_os_str().is_empty() || self.indexed_workspace {
            return Ok(());
        }

        let scan = FileScanner::new(root.to_path_buf())
            .skip_dirs(["tests", "node_modules"])
            .scan();

        for path in &scan.rust_files {
            let source = AstParser::parse_file(path)?;
            self.index_file_items(&source.package, path, &source.ast.items);
        }

        debug!(
            "indexed workspace {}: {} packages, {} function names",
            root.display(),
            self.packages.len(),
            self.functions.len()
        );
        self.indexed_workspace = true;
        Ok(())
    }

    /// Records the declarations of a single parsed file. Used by the handler
    /// analyzer to fold freshly parsed files into the index.
    pub fn index_file_items(&mut self, pkg: &str, file: &Path, items: &[syn::Item]) {
        for item in items {
            match item {
                syn::Item::Struct(s) => self.add(pkg, file, TypeItem::Struct(s.clone())),
                syn::Item::Enum(e) => self.add(pkg, file, TypeItem::Enum(e.clone())),
                syn::Item::Type(t) => self.add(pkg, file, TypeItem::Alias(t.clone())),
                syn::Item::Fn(f) => {
                    let results = collect_result_types(&f.sig.output);
                    self.add_function(pkg, &f.sig.ident.to_string(), results);
                }
                syn::Item::Impl(imp) => {
                    for impl_item in &imp.items {
                        if let syn::ImplItem::Fn(m) = impl_item {
                            let results = collect_result_types(&m.sig.output);
                            self.add_function(pkg, &m.sig.ident.to_string(), results);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Flattens a return type into result texts; tuple returns contribute one
/// entry per element.
fn collect_result_types(output: &syn::ReturnType) -> Vec<String> {
    match output {
        syn::ReturnType::Default => Vec::new(),
        syn::ReturnType::Type(_, ty) => match ty.as_ref() {
            syn::Type::Tuple(tuple) => tuple.elems.iter().map(type_to_string).collect(),
            other => vec![type_to_string(other)],
        },
    }
}

use crate::error::Result;
use crate::parser::AstParser;
use crate::render::expr_to_string;
use crate::scanner::FileScanner;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use syn::visit::Visit;
use syn::{Expr, ExprMethodCall};

/// HTTP verbs recognized as route-registration methods, matched
/// case-insensitively.
const HTTP_VERBS: &[&str] = &[
    "connect", "delete", "get", "head", "options", "patch", "post", "put", "trace",
];

/// A normalized route registration discovered in source.
#[derive(Debug, Clone)]
pub struct RouteRecord {
    /// HTTP verb, uppercase.
    pub method: String,
    /// Router path with group prefixes applied (`:name` / `*name`
    /// placeholders preserved).
    pub path: String,
    /// Module the registration was found in.
    pub source_package: String,
    /// File the registration was found in.
    pub source_file: PathBuf,
    /// Textual rendering of the handler argument (e.g. `h.get`).
    pub handler_expr: String,
    /// Leaf function identifier.
    pub handler_name: String,
    /// Fully qualified module path when the handler lives in another
    /// module; empty for a same-file handler.
    pub handler_import_path: String,
    /// Stable key correlating the route with its handler description.
    pub handler_id: String,
}

/// Walks a file or directory tree and extracts route registrations.
pub fn find_routes(path: &Path) -> Result<Vec<RouteRecord>> {
    if path.is_dir() {
        return find_routes_in_dir(path);
    }
    find_routes_in_file(path)
}

fn find_routes_in_dir(root: &Path) -> Result<Vec<RouteRecord>> {
    let scan = FileScanner::new(root.to_path_buf()).scan();
    let mut routes = Vec::new();
    for file in &scan.rust_files {
        routes.extend(find_routes_in_file(file)?);
    }
    Ok(routes)
}

/// Extracts route registrations from a single source file.
pub fn find_routes_in_file(path: &Path) -> Result<Vec<RouteRecord>> {
    let source = AstParser::parse_file(path)?;

    let mut visitor = RouteVisitor {
        routes: Vec::new(),
        prefixes: HashMap::new(),
        bindings: HashMap::new(),
        imports: collect_import_aliases(&source.ast.items),
        file: path.to_path_buf(),
        package: source.package.clone(),
    };
    visitor.visit_file(&source.ast);

    debug!(
        "{}: {} route(s) discovered",
        path.display(),
        visitor.routes.len()
    );
    Ok(visitor.routes)
}

/// Builds the import alias table for a file. Aliases default to the last
/// path segment; glob imports and `_` renames are omitted. Module
/// declarations (`mod handlers;`) count as imports of `crate::<name>`.
fn collect_import_aliases(items: &[syn::Item]) -> HashMap<String, String> {
    let mut aliases = HashMap::new();
    for item in items {
        match item {
            syn::Item::Use(use_item) => {
                flatten_use_tree(&use_item.tree, &mut Vec::new(), &mut aliases);
            }
            syn::Item::Mod(module) if module.content.is_none() => {
                let name = module.ident.to_string();
                aliases.insert(name.clone(), format!("crate::{}", name));
            }
            _ => {}
        }
    }
    aliases
}

fn flatten_use_tree(
    tree: &syn::UseTree,
    prefix: &mut Vec<String>,
    aliases: &mut HashMap<String, String>,
) {
    match tree {
        syn::UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            flatten_use_tree(&path.tree, prefix, aliases);
            prefix.pop();
        }
        syn::UseTree::Name(name) => {
            let ident = name.ident.to_string();
            if ident == "self" {
                if let Some(last) = prefix.last() {
                    aliases.insert(last.clone(), prefix.join("::"));
                }
            } else {
                let mut full = prefix.clone();
                full.push(ident.clone());
                aliases.insert(ident, full.join("::"));
            }
        }
        syn::UseTree::Rename(rename) => {
            let alias = rename.rename.to_string();
            if alias == "_" {
                return;
            }
            let ident = rename.ident.to_string();
            let full = if ident == "self" {
                prefix.join("::")
            } else {
                let mut full = prefix.clone();
                full.push(ident);
                full.join("::")
            };
            aliases.insert(alias, full);
        }
        syn::UseTree::Group(group) => {
            for item in &group.items {
                flatten_use_tree(item, prefix, aliases);
            }
        }
        syn::UseTree::Glob(_) => {}
    }
}

struct RouteVisitor {
    routes: Vec<RouteRecord>,
    /// Group-variable name → resolved path prefix.
    prefixes: HashMap<String, String>,
    /// Handler-variable name → module import path.
    bindings: HashMap<String, String>,
    imports: HashMap<String, String>,
    file: PathBuf,
    package: String,
}

impl<'ast> Visit<'ast> for RouteVisitor {
    fn visit_local(&mut self, node: &'ast syn::Local) {
        if let (Some(name), Some(init)) = (pat_ident(&node.pat), node.init.as_ref()) {
            self.track_binding(&name, &init.expr);
        }
        syn::visit::visit_local(self, node);
    }

    fn visit_expr_assign(&mut self, node: &'ast syn::ExprAssign) {
        if let Expr::Path(target) = node.left.as_ref() {
            if let Some(name) = target.path.get_ident().map(|i| i.to_string()) {
                self.track_binding(&name, &node.right);
            }
        }
        syn::visit::visit_expr_assign(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        if let Some(route) = self.extract_route(node) {
            self.routes.push(route);
        }
        syn::visit::visit_expr_method_call(self, node);
    }
}

impl RouteVisitor {
    fn track_binding(&mut self, name: &str, init: &Expr) {
        if name.is_empty() {
            return;
        }
        if let Some(prefix) = self.group_prefix_from_expr(init) {
            self.prefixes.insert(name.to_string(), prefix);
            return;
        }
        let import_path = import_path_from_expr(init, &self.imports, &self.bindings);
        if !import_path.is_empty() {
            self.bindings.insert(name.to_string(), import_path);
        }
    }

    /// Resolves `receiver.group("/prefix")` to the joined prefix.
    fn group_prefix_from_expr(&self, expr: &Expr) -> Option<String> {
        let call = match expr {
            Expr::MethodCall(call) => call,
            _ => return None,
        };
        if !call.method.to_string().eq_ignore_ascii_case("group") {
            return None;
        }
        let mut base = self.compute_prefix(&call.receiver);
        if let Some(lit) = string_literal(call.args.first()) {
            base = join_route_path(&base, &lit);
        }
        Some(base)
    }

    /// Resolves the accumulated prefix of a router expression: a bound
    /// group variable, or an inline `.group(...)` chain.
    fn compute_prefix(&self, expr: &Expr) -> String {
        match expr {
            Expr::Path(path) => path
                .path
                .get_ident()
                .and_then(|i| self.prefixes.get(&i.to_string()))
                .cloned()
                .unwrap_or_default(),
            Expr::MethodCall(_) => self.group_prefix_from_expr(expr).unwrap_or_default(),
            Expr::Field(field) => self.compute_prefix(&field.base),
            Expr::Reference(r) => self.compute_prefix(&r.expr),
            Expr::Paren(p) => self.compute_prefix(&p.expr),
            _ => String::new(),
        }
    }

    fn extract_route(&self, call: &ExprMethodCall) -> Option<RouteRecord> {
        let method_name = call.method.to_string().to_lowercase();
        if !HTTP_VERBS.contains(&method_name.as_str()) {
            return None;
        }
        let path_value = string_literal(call.args.first())?;

        let (handler_expr, handler_name, handler_import) =
            handler_info_from_call(call, &self.imports, &self.bindings);
        if handler_name.is_empty() {
            // Closures, calls, and other computed handler arguments are
            // dropped, not errors.
            return None;
        }

        let prefix = self.compute_prefix(&call.receiver);
        let full_path = join_route_path(&prefix, &path_value);

        Some(RouteRecord {
            method: method_name.to_uppercase(),
            path: full_path,
            source_package: self.package.clone(),
            source_file: self.file.clone(),
            handler_id: build_handler_id(&self.file, &handler_import, &handler_name),
            handler_expr,
            handler_name,
            handler_import_path: handler_import,
        })
    }
}

/// Extracts the handler identity from the second argument of a verb call.
fn handler_info_from_call(
    call: &ExprMethodCall,
    imports: &HashMap<String, String>,
    bindings: &HashMap<String, String>,
) -> (String, String, String) {
    let handler = match call.args.iter().nth(1) {
        Some(expr) => expr,
        None => return (String::new(), String::new(), String::new()),
    };
    match handler {
        Expr::Path(path) => {
            let segments: Vec<String> =
                path.path.segments.iter().map(|s| s.ident.to_string()).collect();
            match segments.len() {
                0 => (String::new(), String::new(), String::new()),
                1 => (segments[0].clone(), segments[0].clone(), String::new()),
                _ => {
                    let name = segments[segments.len() - 1].clone();
                    let import = imports
                        .get(&segments[0])
                        .or_else(|| bindings.get(&segments[0]))
                        .cloned()
                        .unwrap_or_default();
                    (expr_to_string(handler), name, import)
                }
            }
        }
        Expr::Field(field) => {
            let name = match &field.member {
                syn::Member::Named(ident) => ident.to_string(),
                syn::Member::Unnamed(_) => return (expr_to_string(handler), String::new(), String::new()),
            };
            let import = match field.base.as_ref() {
                Expr::Path(base) => base
                    .path
                    .get_ident()
                    .and_then(|i| {
                        let key = i.to_string();
                        imports.get(&key).or_else(|| bindings.get(&key))
                    })
                    .cloned()
                    .unwrap_or_default(),
                _ => String::new(),
            };
            (expr_to_string(handler), name, import)
        }
        other => (expr_to_string(other), String::new(), String::new()),
    }
}

/// Traces an initializer back to the module it came from, through the
/// import table and previously seen bindings.
fn import_path_from_expr(
    expr: &Expr,
    imports: &HashMap<String, String>,
    bindings: &HashMap<String, String>,
) -> String {
    match expr {
        Expr::Call(call) => import_path_from_expr(&call.func, imports, bindings),
        Expr::Path(path) => {
            let segments: Vec<String> =
                path.path.segments.iter().map(|s| s.ident.to_string()).collect();
            if segments.len() >= 2 {
                if let Some(import) = imports.get(&segments[0]) {
                    return import.clone();
                }
                if let Some(import) = bindings.get(&segments[0]) {
                    return import.clone();
                }
                return String::new();
            }
            segments
                .first()
                .and_then(|name| bindings.get(name))
                .cloned()
                .unwrap_or_default()
        }
        Expr::Struct(lit) => {
            let first = lit.path.segments.first().map(|s| s.ident.to_string());
            first
                .and_then(|name| imports.get(&name).or_else(|| bindings.get(&name)).cloned())
                .unwrap_or_default()
        }
        Expr::Reference(r) => import_path_from_expr(&r.expr, imports, bindings),
        Expr::Paren(p) => import_path_from_expr(&p.expr, imports, bindings),
        _ => String::new(),
    }
}

fn pat_ident(pat: &syn::Pat) -> Option<String> {
    match pat {
        syn::Pat::Ident(ident) => Some(ident.ident.to_string()),
        syn::Pat::Type(typed) => pat_ident(&typed.pat),
        _ => None,
    }
}

fn string_literal(expr: Option<&Expr>) -> Option<String> {
    match expr? {
        Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

/// Builds the stable handler key: `import::name`, or `file::name` with the
/// file path normalized to forward slashes.
pub fn build_handler_id(file: &Path, import_path: &str, handler_name: &str) -> String {
    if handler_name.is_empty() {
        return String::new();
    }
    if !import_path.trim().is_empty() {
        return format!("{}::{}", import_path.trim(), handler_name);
    }
    let rel = file.to_string_lossy().replace('\\', "/");
    format!("{}::{}", rel, handler_name)
}

/// Joins a group prefix with a route path.
///
/// An empty prefix yields the path with a guaranteed leading `/`; an empty
/// or `/` path yields the prefix; otherwise the right-trimmed prefix is
/// concatenated with a `/`-prefixed path. The operation is associative over
/// nested groups.
pub fn join_route_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim();
    let path = path.trim();

    if prefix.is_empty() {
        if path.is_empty() {
            return "/".to_string();
        }
        if path.starts_with('/') {
            return path.to_string();
        }
        return format!("/{}", path);
    }

    if path.is_empty() || path == "/" {
        return prefix.to_string();
    }

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    format!("{}{}", prefix.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn routes_from(code: &str) -> Vec<RouteRecord> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("router.rs");
        fs::write(&path, code).unwrap();
        find_routes_in_file(&path).unwrap()
    }

    #[test]
    fn test_simple_route() {
        let routes = routes_from(
            r#"
            fn register(app: &App) {
                app.get("/status", health_handler);
            }
            "#,
        );

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].method, "GET");
        assert_eq!(routes[0].path, "/status");
        assert_eq!(routes[0].handler_name, "health_handler");
        assert!(routes[0].handler_import_path.is_empty());
        assert!(routes[0].handler_id.ends_with("router.rs::health_handler"));
    }

    #[test]
    fn test_group_prefix_binding() {
        let routes = routes_from(
            r#"
            fn register(app: &App) {
                let series = app.group("/series");
                series.get("/history/:sourceId", history_handler);
                series.get("/cheapest", cheapest_handler);
            }
            "#,
        );

        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/series/history/:sourceId", "/series/cheapest"]);
    }

    #[test]
    fn test_nested_group_prefixes() {
        let routes = routes_from(
            r#"
            fn register(app: &App) {
                let api = app.group("/api");
                let v1 = api.group("/v1");
                v1.post("/items", create_item);
            }
            "#,
        );

        assert_eq!(routes[0].path, "/api/v1/items");
        assert_eq!(routes[0].method, "POST");
    }

    #[test]
    fn test_inline_group_chain() {
        let routes = routes_from(
            r#"
            fn register(app: &App) {
                app.group("/admin").post("/upload", upload_handler);
            }
            "#,
        );

        assert_eq!(routes[0].path, "/admin/upload");
    }

    #[test]
    fn test_handler_binding_through_import() {
        let routes = routes_from(
            r#"
            use crate::handlers;

            fn register(router: &App) {
                let h = handlers::UserHandler::new();
                router.get("/users/:id", h.get);
            }
            "#,
        );

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].handler_name, "get");
        assert_eq!(routes[0].handler_import_path, "crate::handlers");
        assert_eq!(routes[0].handler_id, "crate::handlers::get");
        assert_eq!(routes[0].handler_expr, "h.get");
    }

    #[test]
    fn test_qualified_path_handler() {
        let routes = routes_from(
            r#"
            use crate::api::users;

            fn register(app: &App) {
                app.get("/users", users::list);
            }
            "#,
        );

        assert_eq!(routes[0].handler_import_path, "crate::api::users");
        assert_eq!(routes[0].handler_name, "list");
    }

    #[test]
    fn test_computed_handler_is_dropped() {
        let routes = routes_from(
            r#"
            fn register(app: &App) {
                app.get("/closure", |ctx: &mut Ctx| ctx.send_status(204));
                app.get("/ok", fine_handler);
            }
            "#,
        );

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/ok");
    }

    #[test]
    fn test_non_literal_path_is_ignored() {
        let routes = routes_from(
            r#"
            fn register(app: &App) {
                let path = "/computed";
                app.get(path, handler);
            }
            "#,
        );

        assert!(routes.is_empty());
    }

    #[test]
    fn test_verb_set_is_case_insensitive() {
        let routes = routes_from(
            r#"
            fn register(app: &App) {
                app.Get("/a", ha);
                app.head("/b", hb);
                app.not_a_verb("/c", hc);
            }
            "#,
        );

        let methods: Vec<&str> = routes.iter().map(|r| r.method.as_str()).collect();
        assert_eq!(methods, vec!["GET", "HEAD"]);
    }

    #[test]
    fn test_join_route_path_rules() {
        assert_eq!(join_route_path("", ""), "/");
        assert_eq!(join_route_path("", "status"), "/status");
        assert_eq!(join_route_path("/series", ""), "/series");
        assert_eq!(join_route_path("/series", "/"), "/series");
        assert_eq!(join_route_path("/series/", "/history"), "/series/history");
        assert_eq!(join_route_path("/series", "history"), "/series/history");
    }

    #[test]
    fn test_join_route_path_is_associative() {
        let nested = join_route_path(&join_route_path("/api", "/v1"), "/items");
        let flat = join_route_path("/api", &join_route_path("/v1", "/items"));
        assert_eq!(nested, flat);
    }

    #[test]
    fn test_import_alias_forms() {
        let code: syn::File = syn::parse_str(
            r#"
            use crate::handlers;
            use crate::services as svc;
            use crate::models::{self};
            use crate::util::*;
            use crate::noise as _;
            "#,
        )
        .unwrap();

        let aliases = collect_import_aliases(&code.items);
        assert_eq!(aliases.get("handlers").unwrap(), "crate::handlers");
        assert_eq!(aliases.get("svc").unwrap(), "crate::services");
        assert_eq!(aliases.get("models").unwrap(), "crate::models");
        assert!(!aliases.contains_key("util"));
        assert!(!aliases.contains_key("_"));
    }

    #[test]
    fn test_mod_declaration_counts_as_import() {
        let routes = routes_from(
            r#"
            mod handlers;

            fn register(router: &App) {
                let h = handlers::UserHandler::new();
                router.get("/users/:id", h.get);
            }
            "#,
        );

        assert_eq!(routes[0].handler_import_path, "crate::handlers");
        assert_eq!(routes[0].handler_id, "crate::handlers::get");
    }
}

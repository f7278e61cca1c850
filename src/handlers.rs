use crate::error::Result;
use crate::parser::AstParser;
use crate::registry::{TypeItem, TypeRegistry};
use crate::render::{expr_to_string, path_to_string, type_to_string};
use crate::routes::{build_handler_id, RouteRecord};
use crate::schema::component_name;
use crate::workspace::{module_prefix_from_root, resolve_import_files};
use log::debug;
use proc_macro2::{Delimiter, TokenStream, TokenTree};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use syn::visit::Visit;
use syn::Expr;

/// Structured description of a handler's documented and inferred inputs and
/// outputs.
#[derive(Debug, Clone, Default)]
pub struct HandlerInfo {
    pub id: String,
    pub name: String,
    pub package: String,
    pub file: PathBuf,
    /// Self-type name for methods; empty for free functions.
    pub receiver: String,

    pub summary: String,
    pub description: String,
    pub notes: Vec<String>,
    pub tags: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,

    /// Name of the request-body type; empty when the handler takes none.
    pub input_type: String,
    pub output_type: String,
    /// HTTP status → response type name (best effort).
    pub responses: BTreeMap<String, String>,
    /// HTTP status → inline schema, taking precedence over `responses`.
    pub response_schemas: BTreeMap<String, Value>,
    /// Statuses that carry no body.
    pub empty_body_status: BTreeSet<String>,
    /// Type names that must be materialized as components even when nothing
    /// else references them.
    pub needed_components: Vec<String>,

    pub params: Vec<Parameter>,
    pub form_params: Vec<Parameter>,
    pub body_required: bool,
    pub body_defined: bool,

    /// Query parameter name → allow-multiple bit.
    query_hints: HashMap<String, bool>,
    /// Names of request-context parameters of this function.
    ctx_vars: HashSet<String>,
}

/// A non-body input declared by annotation or inferred from the body.
#[derive(Debug, Clone, Default)]
pub struct Parameter {
    pub name: String,
    /// One of `path`, `query`, `header`, `cookie`, `formData`.
    pub location: String,
    /// Host type text (e.g. `string`, `Vec<String>`, `file`).
    pub param_type: String,
    pub required: bool,
    pub description: String,
}

/// Groups routes by file and import path and extracts handler metadata for
/// each one, indexing the workspace's types along the way.
pub fn build_handler_index(
    routes: &[RouteRecord],
    workspace_root: &Path,
) -> Result<(HashMap<String, HandlerInfo>, TypeRegistry)> {
    let mut local: BTreeMap<PathBuf, Vec<&RouteRecord>> = BTreeMap::new();
    let mut external: BTreeMap<String, Vec<&RouteRecord>> = BTreeMap::new();
    for route in routes {
        if route.handler_id.is_empty() || route.handler_name.is_empty() {
            continue;
        }
        if route.handler_import_path.trim().is_empty() {
            local.entry(route.source_file.clone()).or_default().push(route);
        } else {
            external
                .entry(route.handler_import_path.trim().to_string())
                .or_default()
                .push(route);
        }
    }

    let mut registry = TypeRegistry::new();
    if !workspace_root.as_os_str().is_empty() {
        registry.index_workspace(workspace_root)?;
    }

    let mut result = HashMap::new();
    for (file, items) in &local {
        let infos = analyze_handlers_in_file(file, items, "", &mut registry)?;
        result.extend(infos);
    }

    if external.is_empty() {
        return Ok((result, registry));
    }

    let module_prefix = module_prefix_from_root(workspace_root)?;
    for (import_path, items) in &external {
        let files = resolve_import_files(workspace_root, &module_prefix, import_path)?;
        for file in &files {
            let infos = analyze_handlers_in_file(file, items, import_path, &mut registry)?;
            result.extend(infos);
        }
    }

    Ok((result, registry))
}

fn analyze_handlers_in_file(
    path: &Path,
    routes: &[&RouteRecord],
    import_path: &str,
    registry: &mut TypeRegistry,
) -> Result<HashMap<String, HandlerInfo>> {
    let source = AstParser::parse_file(path)?;
    registry.index_file_items(&source.package, path, &source.ast.items);

    let mut needed: HashMap<&str, &RouteRecord> = HashMap::new();
    for route in routes {
        if !route.handler_id.is_empty() {
            needed.insert(route.handler_id.as_str(), *route);
        }
    }

    let mut infos = HashMap::new();
    for item in &source.ast.items {
        match item {
            syn::Item::Fn(func) => {
                analyze_candidate(
                    &func.sig,
                    &func.attrs,
                    &func.block,
                    "",
                    path,
                    import_path,
                    &source.package,
                    &needed,
                    registry,
                    &mut infos,
                );
            }
            syn::Item::Impl(imp) => {
                let receiver = self_type_name(&imp.self_ty);
                for impl_item in &imp.items {
                    if let syn::ImplItem::Fn(method) = impl_item {
                        analyze_candidate(
                            &method.sig,
                            &method.attrs,
                            &method.block,
                            &receiver,
                            path,
                            import_path,
                            &source.package,
                            &needed,
                            registry,
                            &mut infos,
                        );
                    }
                }
            }
            _ => {}
        }
    }

    Ok(infos)
}

#[allow(clippy::too_many_arguments)]
fn analyze_candidate(
    sig: &syn::Signature,
    attrs: &[syn::Attribute],
    block: &syn::Block,
    receiver: &str,
    path: &Path,
    import_path: &str,
    package: &str,
    needed: &HashMap<&str, &RouteRecord>,
    registry: &TypeRegistry,
    infos: &mut HashMap<String, HandlerInfo>,
) {
    let id = build_handler_id(path, import_path, &sig.ident.to_string());
    let route = match needed.get(id.as_str()) {
        Some(route) => *route,
        None => return,
    };
    debug!("analyzing handler {}", id);

    let mut info = HandlerInfo {
        id: route.handler_id.clone(),
        name: sig.ident.to_string(),
        package: package.to_string(),
        file: path.to_path_buf(),
        receiver: receiver.to_string(),
        ctx_vars: collect_ctx_params(sig),
        ..HandlerInfo::default()
    };

    populate_from_doc(attrs, &mut info);
    populate_from_body(block, &mut info, registry);
    ensure_path_parameters(&mut info, route);

    if info.output_type.is_empty() {
        if let Some(success) = info.responses.get("200") {
            info.output_type = success.clone();
        }
    }

    infos.insert(route.handler_id.clone(), info);
}

fn self_type_name(self_ty: &syn::Type) -> String {
    match self_ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|s| s.ident.to_string())
            .unwrap_or_default(),
        syn::Type::Reference(r) => self_type_name(&r.elem),
        _ => String::new(),
    }
}

/// Collects the names of function parameters whose type matches the
/// framework's request-context pattern.
fn collect_ctx_params(sig: &syn::Signature) -> HashSet<String> {
    let mut names = HashSet::new();
    for input in &sig.inputs {
        if let syn::FnArg::Typed(pat_type) = input {
            if !is_ctx_type(&type_to_string(&pat_type.ty)) {
                continue;
            }
            if let syn::Pat::Ident(ident) = pat_type.pat.as_ref() {
                names.insert(ident.ident.to_string());
            }
        }
    }
    names
}

fn is_ctx_type(type_name: &str) -> bool {
    let trimmed = type_name
        .trim()
        .trim_start_matches('&')
        .trim_start_matches("mut ")
        .trim_start_matches('*')
        .trim();
    if trimmed == "Ctx" {
        return true;
    }
    trimmed.ends_with("::Ctx") && trimmed.to_lowercase().contains("fiber")
}

// ---------------------------------------------------------------------------
// Doc-comment pass
// ---------------------------------------------------------------------------

fn populate_from_doc(attrs: &[syn::Attribute], info: &mut HandlerInfo) {
    for line in doc_lines(attrs) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !line.starts_with('@') {
            if info.description.is_empty() {
                info.description = line.to_string();
            } else {
                info.description.push(' ');
                info.description.push_str(line);
            }
            info.notes.push(line.to_string());
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let tag = fields[0];
        let rest = line[tag.len()..].trim();
        match tag {
            "@Summary" => info.summary = rest.to_string(),
            "@Description" => info.description = rest.to_string(),
            "@Tags" => {
                let tags = split_csv(rest);
                append_unique(&mut info.tags, &tags);
            }
            "@Accept" => append_unique(&mut info.consumes, &split_csv(rest)),
            "@Produce" => append_unique(&mut info.produces, &split_csv(rest)),
            "@Param" => parse_param_annotation(rest, info),
            "@Success" | "@Failure" => parse_response_annotation(&fields, info),
            _ => {}
        }
    }
}

/// Extracts the doc-comment lines from `#[doc]` attributes, one entry per
/// source line with the leading space rustdoc inserts stripped.
fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(nv) = &attr.meta {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) = &nv.value
            {
                for raw in lit.value().split('\n') {
                    lines.push(raw.strip_prefix(' ').unwrap_or(raw).to_string());
                }
            }
        }
    }
    lines
}

fn parse_param_annotation(rest: &str, info: &mut HandlerInfo) {
    let parts = split_annotation_fields(rest);
    if parts.len() < 3 {
        return;
    }
    let name = parts[0].clone();
    let location = canonical_param_location(&parts[1]);
    let type_token = clean_type_token(&parts[2]);
    let mut required = parts.get(3).map(|p| parse_bool_token(p)).unwrap_or(false);
    let description = if parts.len() >= 5 {
        parts[4..].join(" ")
    } else {
        String::new()
    };

    match location.as_str() {
        "body" => {
            if info.input_type.is_empty() {
                info.input_type = type_token;
            }
            if !info.body_required {
                info.body_required = required;
            }
            info.body_defined = true;
            return;
        }
        "path" => required = true,
        "formData" => {
            info.form_params.push(Parameter {
                name,
                location,
                param_type: type_token,
                required,
                description,
            });
            return;
        }
        _ => {}
    }

    info.params.push(Parameter {
        name,
        location,
        param_type: type_token,
        required,
        description,
    });
}

fn parse_response_annotation(fields: &[&str], info: &mut HandlerInfo) {
    if fields.len() < 4 {
        return;
    }
    let status = fields[1].to_string();
    // Swagger-style annotations carry an {object} token before the type.
    let type_idx = if fields[2] == "{object}" { 3 } else { 2 };
    if type_idx >= fields.len() {
        return;
    }
    let typ = clean_type_token(fields[type_idx]);
    if typ.is_empty() {
        return;
    }
    if status == "200" && info.output_type.is_empty() {
        info.output_type = typ.clone();
    }
    info.responses.insert(status, typ);
}

/// Splits annotation text on whitespace while keeping quoted phrases
/// together.
fn split_annotation_fields(input: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escape = false;

    for c in input.chars() {
        if escape {
            current.push(c);
            escape = false;
        } else if c == '\\' && in_quote {
            escape = true;
        } else if c == '"' {
            in_quote = !in_quote;
        } else if (c == ' ' || c == '\t') && !in_quote {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

fn parse_bool_token(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "required"
    )
}

fn canonical_param_location(value: &str) -> String {
    let v = value.trim().to_lowercase();
    match v.as_str() {
        "path" | "query" | "header" | "cookie" | "body" => v,
        "formdata" | "form" => "formData".to_string(),
        _ => v,
    }
}

fn clean_type_token(token: &str) -> String {
    token
        .trim()
        .trim_matches(|c| c == '{' || c == '}')
        .trim_start_matches('*')
        .trim_start_matches('&')
        .to_string()
}

// ---------------------------------------------------------------------------
// Body pass
// ---------------------------------------------------------------------------

fn populate_from_body(block: &syn::Block, info: &mut HandlerInfo, registry: &TypeRegistry) {
    let mut var_types = HashMap::new();
    for param in info.params.iter().chain(info.form_params.iter()) {
        if !param.name.is_empty() && !param.param_type.is_empty() {
            var_types.insert(param.name.clone(), param.param_type.clone());
        }
    }

    let mut scan = BodyScan {
        info,
        registry,
        var_types,
        query_bindings: HashMap::new(),
        multipart_vars: HashSet::new(),
    };
    scan.visit_block(block);
}

struct BodyScan<'a, 'r> {
    info: &'a mut HandlerInfo,
    registry: &'r TypeRegistry,
    /// Local variable name → host type text.
    var_types: HashMap<String, String>,
    /// Local variable name → query parameter it was read from.
    query_bindings: HashMap<String, String>,
    /// Locals holding a parsed multipart form.
    multipart_vars: HashSet<String>,
}

impl<'a, 'r, 'ast> Visit<'ast> for BodyScan<'a, 'r> {
    fn visit_local(&mut self, node: &'ast syn::Local) {
        self.track_local(node);
        syn::visit::visit_local(self, node);
    }

    fn visit_expr_assign(&mut self, node: &'ast syn::ExprAssign) {
        self.track_assign(node);
        syn::visit::visit_expr_assign(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        self.track_method_call(node);
        syn::visit::visit_expr_method_call(self, node);
    }

    fn visit_expr_call(&mut self, node: &'ast syn::ExprCall) {
        self.track_helper_call(node);
        syn::visit::visit_expr_call(self, node);
    }
}

impl<'a, 'r> BodyScan<'a, 'r> {
    fn track_local(&mut self, node: &syn::Local) {
        let names = pat_idents(&node.pat);

        // An explicit type annotation wins over inference.
        if let syn::Pat::Type(typed) = &node.pat {
            let type_text = type_to_string(&typed.ty);
            for name in pat_idents(&typed.pat) {
                self.var_types.insert(name, type_text.clone());
            }
        }

        let init = match &node.init {
            Some(init) => init.expr.as_ref(),
            None => return,
        };

        if !matches!(node.pat, syn::Pat::Type(_)) {
            match names.len() {
                1 => {
                    let inferred = self.infer_type(init);
                    if !inferred.is_empty() {
                        self.var_types.insert(names[0].clone(), inferred);
                    }
                }
                n if n > 1 => {
                    // Tuple destructuring picks the i-th result of a known
                    // call.
                    if let Some((fn_name, alias)) = callee_name(init) {
                        if let Some(results) =
                            self.registry.lookup_function(&fn_name, n, alias.as_deref())
                        {
                            for (name, result) in names.iter().zip(results.iter()) {
                                self.var_types.insert(name.clone(), result.clone());
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if contains_multipart_call(init) {
            for name in &names {
                self.multipart_vars.insert(name.clone());
            }
        }

        let query_names = self.collect_query_names(init);
        self.bind_query_names(&names, &query_names);
        for name in query_names {
            ensure_query_param(self.info, &name, false);
        }
    }

    fn track_assign(&mut self, node: &syn::ExprAssign) {
        let target = match node.left.as_ref() {
            Expr::Path(path) => match path.path.get_ident() {
                Some(ident) => ident.to_string(),
                None => return,
            },
            _ => return,
        };

        match node.right.as_ref() {
            Expr::Path(path) => {
                if let Some(ident) = path.path.get_ident() {
                    if let Some(bound) = self.query_bindings.get(&ident.to_string()).cloned() {
                        self.query_bindings.insert(target, bound);
                    }
                }
            }
            other => {
                let names = self.collect_query_names(other);
                self.bind_query_names(&[target], &names);
                for name in names {
                    ensure_query_param(self.info, &name, false);
                }
                let inferred = self.infer_type(other);
                if !inferred.is_empty() {
                    if let Expr::Path(path) = node.left.as_ref() {
                        if let Some(ident) = path.path.get_ident() {
                            self.var_types.insert(ident.to_string(), inferred);
                        }
                    }
                }
            }
        }
    }

    fn track_method_call(&mut self, node: &syn::ExprMethodCall) {
        let method = node.method.to_string();
        match method.as_str() {
            "body_parser" => {
                if self.info.input_type.is_empty() {
                    if let Some(name) = node.args.first().and_then(ref_target_ident) {
                        if let Some(ty) = self.var_types.get(&name) {
                            self.info.input_type = ty.clone();
                        }
                    }
                }
            }
            "form_file" => {
                if let Some(name) = string_arg(node.args.first()) {
                    ensure_form_param(
                        self.info,
                        Parameter {
                            name,
                            location: "formData".to_string(),
                            param_type: "file".to_string(),
                            required: true,
                            description: String::new(),
                        },
                    );
                }
            }
            "form_value" => {
                if let Some(name) = string_arg(node.args.first()) {
                    ensure_form_param(
                        self.info,
                        Parameter {
                            name,
                            location: "formData".to_string(),
                            param_type: "string".to_string(),
                            required: false,
                            description: String::new(),
                        },
                    );
                }
            }
            "query" | "query_int" | "query_bool" | "query_float" => {
                if let Some(name) = string_arg(node.args.first()) {
                    ensure_query_param(self.info, &name, false);
                }
            }
            "query_parser" => {
                if let Some(arg) = node.args.first() {
                    let mut type_name = self.infer_type(arg);
                    if let Some(direct) = self.var_types.get(type_name.trim()) {
                        type_name = direct.clone();
                    }
                    if type_name.is_empty() {
                        if let Some(ident) = ref_target_ident(arg) {
                            type_name = self.var_types.get(&ident).cloned().unwrap_or_default();
                        }
                    }
                    ensure_query_struct_params(self.info, &type_name, self.registry);
                }
            }
            // A keyed file access on a parsed multipart form declares an
            // optional upload field.
            "files" | "file" => {
                if let Expr::Path(base) = node.receiver.as_ref() {
                    let is_form = base
                        .path
                        .get_ident()
                        .map(|i| self.multipart_vars.contains(&i.to_string()))
                        .unwrap_or(false);
                    if is_form {
                        if let Some(name) = string_arg(node.args.first()) {
                            ensure_form_param(
                                self.info,
                                Parameter {
                                    name,
                                    location: "formData".to_string(),
                                    param_type: "file".to_string(),
                                    required: false,
                                    description: String::new(),
                                },
                            );
                        }
                    }
                }
            }
            "push" => {
                if let Some(arg) = node.args.first() {
                    for name in self.collect_query_names(arg) {
                        ensure_query_param(self.info, &name, true);
                    }
                }
            }
            _ => {}
        }

        self.track_response_call(node);
    }

    /// Classifies `ctx.status(code).method(arg)` response chains.
    fn track_response_call(&mut self, node: &syn::ExprMethodCall) {
        let method = node.method.to_string();
        let kind = match method.as_str() {
            "json" => ResponseKind::Json,
            "send_status" => ResponseKind::Empty,
            "send_file" | "send_stream" | "download" => ResponseKind::Binary,
            "send_string" => ResponseKind::Text,
            "redirect" => ResponseKind::Redirect,
            _ => return,
        };

        let mut status = match self.unwrap_ctx_receiver(&node.receiver) {
            Some(status) => status,
            None => return,
        };

        match kind {
            ResponseKind::Json => {
                let arg = match node.args.first() {
                    Some(arg) => arg,
                    None => return,
                };
                if status.is_empty() {
                    status = "200".to_string();
                }
                self.add_response_from_expr(&status, arg);
            }
            ResponseKind::Empty => {
                if let Some(arg) = node.args.first() {
                    let normalized = normalize_status(arg);
                    if !normalized.is_empty() {
                        status = normalized;
                    }
                }
                if status.is_empty() {
                    status = "200".to_string();
                }
                self.info.empty_body_status.insert(status);
            }
            ResponseKind::Redirect => {
                if let Some(arg) = node.args.iter().nth(1) {
                    let normalized = normalize_status(arg);
                    if !normalized.is_empty() {
                        status = normalized;
                    }
                }
                if status.is_empty() {
                    status = "200".to_string();
                }
                self.info.empty_body_status.insert(status);
            }
            ResponseKind::Binary => {
                if status.is_empty() {
                    status = "200".to_string();
                }
                ensure_binary_response(self.info, &status);
                append_unique(
                    &mut self.info.produces,
                    &["application/octet-stream".to_string()],
                );
            }
            ResponseKind::Text => {
                if status.is_empty() {
                    status = "200".to_string();
                }
                ensure_text_response(self.info, &status);
                append_unique(&mut self.info.produces, &["text/plain".to_string()]);
            }
        }
    }

    /// Free-function response helpers (`ok_result`, `bad_request`, ...)
    /// that wrap the context calls.
    fn track_helper_call(&mut self, node: &syn::ExprCall) {
        let name = match node.func.as_ref() {
            Expr::Path(path) => path
                .path
                .segments
                .last()
                .map(|s| s.ident.to_string())
                .unwrap_or_default(),
            _ => return,
        };
        match name.as_str() {
            "ok_result" => {
                if let Some(arg) = node.args.iter().nth(1) {
                    self.add_response_from_expr("200", arg);
                }
            }
            "bad_request" => ensure_error_response(self.info, "400"),
            "not_found" => ensure_error_response(self.info, "404"),
            "internal_error" => ensure_error_response(self.info, "500"),
            _ => {}
        }
    }

    /// Walks a response-call receiver chain back to a context identifier,
    /// accumulating the status set by `.status(code)` links. `None` means
    /// the chain does not ground in a known context variable.
    fn unwrap_ctx_receiver(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::MethodCall(call) => {
                if call.method != "status" {
                    return None;
                }
                self.unwrap_ctx_receiver(&call.receiver)?;
                let status = call
                    .args
                    .first()
                    .map(normalize_status)
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "200".to_string());
                Some(status)
            }
            Expr::Path(path) => {
                let ident = path.path.get_ident()?.to_string();
                if self.info.ctx_vars.contains(&ident) {
                    Some(String::new())
                } else {
                    None
                }
            }
            Expr::Field(field) => match field.base.as_ref() {
                Expr::Path(base) => {
                    let ident = base.path.get_ident()?.to_string();
                    if self.info.ctx_vars.contains(&ident) {
                        Some(String::new())
                    } else {
                        None
                    }
                }
                _ => None,
            },
            Expr::Reference(r) => self.unwrap_ctx_receiver(&r.expr),
            Expr::Paren(p) => self.unwrap_ctx_receiver(&p.expr),
            _ => None,
        }
    }

    fn add_response_from_expr(&mut self, status: &str, expr: &Expr) {
        let mut response_type = self.infer_type(expr);
        if let Expr::Path(path) = expr {
            if let Some(ident) = path.path.get_ident() {
                if let Some(inferred) = self.var_types.get(&ident.to_string()) {
                    response_type = inferred.clone();
                } else if response_type.is_empty() {
                    response_type = ident.to_string();
                }
            }
        }

        if let Some(schema) = self.schema_from_literal(expr) {
            self.info
                .response_schemas
                .entry(status.to_string())
                .or_insert(schema);
        }

        if response_type.is_empty() {
            return;
        }
        self.info
            .responses
            .entry(status.to_string())
            .or_insert_with(|| response_type.clone());
        if status == "200" && self.info.output_type.is_empty() {
            self.info.output_type = response_type;
        }
    }

    // -- type inference ----------------------------------------------------

    fn infer_type(&self, expr: &Expr) -> String {
        match expr {
            Expr::Struct(lit) => path_to_string(&lit.path),
            Expr::Call(call) => {
                if let Expr::Path(path) = call.func.as_ref() {
                    let segments: Vec<String> =
                        path.path.segments.iter().map(|s| s.ident.to_string()).collect();
                    if segments.len() >= 2 {
                        let last = segments[segments.len() - 1].as_str();
                        if matches!(last, "new" | "default" | "with_capacity") {
                            return segments[..segments.len() - 1].join("::");
                        }
                    }
                    let name = segments.last().cloned().unwrap_or_default();
                    let alias = if segments.len() >= 2 {
                        Some(segments[segments.len() - 2].clone())
                    } else {
                        None
                    };
                    if let Some(results) =
                        self.registry.lookup_function(&name, 1, alias.as_deref())
                    {
                        return results[0].clone();
                    }
                }
                String::new()
            }
            Expr::MethodCall(call) => {
                let method = call.method.to_string();
                if matches!(method.as_str(), "len" | "count") {
                    return "usize".to_string();
                }
                self.registry
                    .lookup_function(&method, 1, None)
                    .map(|r| r[0].clone())
                    .unwrap_or_default()
            }
            Expr::Reference(r) => self.infer_type(&r.expr),
            Expr::Paren(p) => self.infer_type(&p.expr),
            Expr::Try(t) => strip_result_wrapper(&self.infer_type(&t.expr)),
            Expr::Await(a) => self.infer_type(&a.base),
            Expr::Cast(c) => type_to_string(&c.ty),
            Expr::Path(path) => path
                .path
                .get_ident()
                .map(|i| i.to_string())
                .unwrap_or_else(|| path_to_string(&path.path)),
            _ => String::new(),
        }
    }

    // -- query tracking ----------------------------------------------------

    fn collect_query_names(&self, expr: &Expr) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_query_names_into(expr, &mut names);
        names
    }

    fn collect_query_names_into(&self, expr: &Expr, names: &mut Vec<String>) {
        match expr {
            Expr::MethodCall(call) => {
                if call.method == "query" {
                    if let Some(name) = string_arg(call.args.first()) {
                        names.push(name);
                    }
                }
                self.collect_query_names_into(&call.receiver, names);
                for arg in &call.args {
                    self.collect_query_names_into(arg, names);
                }
            }
            Expr::Call(call) => {
                for arg in &call.args {
                    self.collect_query_names_into(arg, names);
                }
            }
            Expr::Path(path) => {
                if let Some(ident) = path.path.get_ident() {
                    if let Some(bound) = self.query_bindings.get(&ident.to_string()) {
                        names.push(bound.clone());
                    }
                }
            }
            Expr::Reference(r) => self.collect_query_names_into(&r.expr, names),
            Expr::Paren(p) => self.collect_query_names_into(&p.expr, names),
            Expr::Try(t) => self.collect_query_names_into(&t.expr, names),
            Expr::Cast(c) => self.collect_query_names_into(&c.expr, names),
            Expr::Await(a) => self.collect_query_names_into(&a.base, names),
            _ => {}
        }
    }

    fn bind_query_names(&mut self, targets: &[String], names: &[String]) {
        let selected = match names.first() {
            Some(name) => name.clone(),
            None => return,
        };
        for target in targets {
            if target != "_" {
                self.query_bindings.insert(target.clone(), selected.clone());
            }
        }
    }

    // -- inline literal inference ------------------------------------------

    /// Builds a schema directly from a `json!({...})`, `json!([...])`, or
    /// `vec![...]` literal argument.
    fn schema_from_literal(&mut self, expr: &Expr) -> Option<Value> {
        match expr {
            Expr::Macro(mac) => {
                let name = mac.mac.path.segments.last()?.ident.to_string();
                match name.as_str() {
                    "json" => self.schema_from_json_tokens(mac.mac.tokens.clone()),
                    "vec" => self.schema_from_array_tokens(mac.mac.tokens.clone()),
                    _ => None,
                }
            }
            Expr::Array(array) => {
                let first = array.elems.first()?;
                Some(json!({"type": "array", "items": self.schema_for_value_expr(first)}))
            }
            Expr::Reference(r) => self.schema_from_literal(&r.expr),
            Expr::Paren(p) => self.schema_from_literal(&p.expr),
            _ => None,
        }
    }

    fn schema_from_json_tokens(&mut self, tokens: TokenStream) -> Option<Value> {
        let trees: Vec<TokenTree> = tokens.into_iter().collect();
        if trees.len() == 1 {
            if let TokenTree::Group(group) = &trees[0] {
                match group.delimiter() {
                    Delimiter::Brace => {
                        return Some(self.schema_from_json_object(group.stream()));
                    }
                    Delimiter::Bracket => {
                        return self.schema_from_array_tokens(group.stream());
                    }
                    _ => {}
                }
            }
        }
        let stream: TokenStream = trees.into_iter().collect();
        let expr = syn::parse2::<Expr>(stream).ok()?;
        Some(self.schema_for_value_expr(&expr))
    }

    /// Object literal: keys become required properties, values yield
    /// primitive or nested schemas.
    fn schema_from_json_object(&mut self, tokens: TokenStream) -> Value {
        let trees: Vec<TokenTree> = tokens.into_iter().collect();
        let mut props = Map::new();
        let mut required = Vec::new();

        let mut i = 0;
        while i < trees.len() {
            let key = match &trees[i] {
                TokenTree::Literal(lit) => syn::parse_str::<syn::LitStr>(&lit.to_string())
                    .map(|l| l.value())
                    .unwrap_or_else(|_| lit.to_string().trim_matches('"').to_string()),
                TokenTree::Ident(ident) => ident.to_string(),
                _ => break,
            };
            i += 1;

            match trees.get(i) {
                Some(TokenTree::Punct(p)) if p.as_char() == ':' => i += 1,
                _ => break,
            }

            let mut value_trees = Vec::new();
            while i < trees.len() {
                if let TokenTree::Punct(p) = &trees[i] {
                    if p.as_char() == ',' {
                        i += 1;
                        break;
                    }
                }
                value_trees.push(trees[i].clone());
                i += 1;
            }

            let schema = self.schema_for_value_tokens(&value_trees);
            if !key.is_empty() {
                props.insert(key.clone(), schema);
                required.push(key);
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        if !props.is_empty() {
            schema.insert("properties".to_string(), Value::Object(props));
            schema.insert("additionalProperties".to_string(), json!(false));
        }
        if !required.is_empty() {
            required.sort();
            schema.insert("required".to_string(), json!(required));
        }
        Value::Object(schema)
    }

    fn schema_for_value_tokens(&mut self, trees: &[TokenTree]) -> Value {
        match trees {
            [TokenTree::Group(group)] if group.delimiter() == Delimiter::Brace => {
                return self.schema_from_json_object(group.stream());
            }
            [TokenTree::Group(group)] if group.delimiter() == Delimiter::Bracket => {
                if let Some(schema) = self.schema_from_array_tokens(group.stream()) {
                    return schema;
                }
            }
            _ => {}
        }
        let stream: TokenStream = trees.iter().cloned().collect();
        syn::parse2::<Expr>(stream)
            .map(|expr| self.schema_for_value_expr(&expr))
            .unwrap_or_else(|_| json!({"type": "string"}))
    }

    fn schema_from_array_tokens(&mut self, tokens: TokenStream) -> Option<Value> {
        type ExprList = syn::punctuated::Punctuated<Expr, syn::Token![,]>;
        let parser = |input: syn::parse::ParseStream| ExprList::parse_terminated(input);
        let elems = syn::parse::Parser::parse2(parser, tokens).ok()?;
        let item_schema = elems
            .first()
            .map(|e| self.schema_for_value_expr(e))
            .unwrap_or_else(|| json!({"type": "object"}));
        Some(json!({"type": "array", "items": item_schema}))
    }

    fn schema_for_value_expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Lit(lit) => match &lit.lit {
                syn::Lit::Str(_) | syn::Lit::Char(_) => json!({"type": "string"}),
                syn::Lit::Int(_) | syn::Lit::Byte(_) => json!({"type": "integer"}),
                syn::Lit::Float(_) => json!({"type": "number"}),
                syn::Lit::Bool(_) => json!({"type": "boolean"}),
                _ => json!({"type": "string"}),
            },
            Expr::Macro(_) | Expr::Array(_) => self
                .schema_from_literal(expr)
                .unwrap_or_else(|| json!({"type": "string"})),
            Expr::Reference(r) => {
                let inner = r.expr.clone();
                self.schema_for_value_expr(&inner)
            }
            Expr::Paren(p) => {
                let inner = p.expr.clone();
                self.schema_for_value_expr(&inner)
            }
            Expr::Unary(u) => {
                let inner = u.expr.clone();
                self.schema_for_value_expr(&inner)
            }
            Expr::Cast(c) => schema_from_type_text(&type_to_string(&c.ty), self.info),
            Expr::Struct(lit) => {
                schema_from_type_text(&path_to_string(&lit.path), self.info)
            }
            Expr::Path(path) => {
                if let Some(ident) = path.path.get_ident() {
                    if let Some(type_name) = self.var_types.get(&ident.to_string()).cloned() {
                        return schema_from_type_text(&type_name, self.info);
                    }
                    return json!({"type": "string"});
                }
                schema_from_type_text(&path_to_string(&path.path), self.info)
            }
            Expr::Field(field) => self.schema_for_field_expr(field),
            Expr::MethodCall(_) | Expr::Call(_) => {
                let inferred = self.infer_type(expr);
                if inferred.is_empty() {
                    json!({"type": "string"})
                } else {
                    schema_from_type_text(&inferred, self.info)
                }
            }
            _ => json!({"type": "string"}),
        }
    }

    /// Resolves `binding.field` through the local type table and the
    /// registry to the field's declared type.
    fn schema_for_field_expr(&mut self, field: &syn::ExprField) -> Value {
        let fallback = json!({"type": "string"});
        let base = match field.base.as_ref() {
            Expr::Path(path) => match path.path.get_ident() {
                Some(ident) => ident.to_string(),
                None => return fallback,
            },
            _ => return fallback,
        };
        let member = match &field.member {
            syn::Member::Named(ident) => ident.to_string(),
            syn::Member::Unnamed(_) => return fallback,
        };
        let base_type = match self.var_types.get(&base) {
            Some(t) => t.clone(),
            None => return fallback,
        };

        let package = self.info.package.clone();
        let (decl, _) = self.registry.resolve(base_type.trim(), &package);
        let field_type = decl.and_then(|decl| match &decl.item {
            TypeItem::Struct(item) => item
                .fields
                .iter()
                .find(|f| f.ident.as_ref().map(|i| i == member.as_str()).unwrap_or(false))
                .map(|f| type_to_string(&f.ty)),
            _ => None,
        });
        match field_type {
            Some(field_type) => schema_from_type_text(&field_type, self.info),
            None => fallback,
        }
    }
}

enum ResponseKind {
    Json,
    Empty,
    Binary,
    Text,
    Redirect,
}

/// Analyzer-side schema for a type text: primitives resolve inline, named
/// types emit a `$ref` and are recorded as needed components for the
/// assembler to materialize.
fn schema_from_type_text(type_name: &str, info: &mut HandlerInfo) -> Value {
    let trimmed = type_name
        .trim()
        .trim_start_matches('&')
        .trim_start_matches("mut ")
        .trim_start_matches('*')
        .trim();
    if trimmed.is_empty() {
        return json!({"type": "string"});
    }

    let ty = match syn::parse_str::<syn::Type>(trimmed) {
        Ok(ty) => ty,
        Err(_) => return json!({"type": "string"}),
    };
    schema_from_parsed_type(&ty, info)
}

fn schema_from_parsed_type(ty: &syn::Type, info: &mut HandlerInfo) -> Value {
    match ty {
        syn::Type::Reference(r) => schema_from_parsed_type(&r.elem, info),
        syn::Type::Paren(p) => schema_from_parsed_type(&p.elem, info),
        syn::Type::Slice(s) => {
            json!({"type": "array", "items": schema_from_parsed_type(&s.elem, info)})
        }
        syn::Type::Array(a) => {
            json!({"type": "array", "items": schema_from_parsed_type(&a.elem, info)})
        }
        syn::Type::Path(type_path) => {
            let segment = match type_path.path.segments.last() {
                Some(seg) => seg,
                None => return json!({"type": "string"}),
            };
            let ident = segment.ident.to_string();
            if matches!(ident.as_str(), "Option" | "Box" | "Arc" | "Rc") {
                if let Some(inner) = generic_type_argument(segment, 0) {
                    return schema_from_parsed_type(inner, info);
                }
            }
            if ident == "Vec" {
                if let Some(inner) = generic_type_argument(segment, 0) {
                    if type_to_string(inner) == "u8" {
                        return json!({"type": "string", "format": "byte"});
                    }
                    return json!({"type": "array", "items": schema_from_parsed_type(inner, info)});
                }
            }
            if matches!(ident.as_str(), "HashMap" | "BTreeMap") {
                let inner = generic_type_argument(segment, 1)
                    .map(|t| schema_from_parsed_type(t, info))
                    .unwrap_or_else(|| json!({"type": "object"}));
                return json!({"type": "object", "additionalProperties": inner});
            }
            match ident.to_lowercase().as_str() {
                "string" | "str" | "char" => return json!({"type": "string"}),
                "bool" | "boolean" => return json!({"type": "boolean"}),
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32"
                | "u64" | "u128" | "usize" => return json!({"type": "integer"}),
                "f32" | "f64" => return json!({"type": "number"}),
                _ => {}
            }
            if matches!(
                ident.as_str(),
                "DateTime" | "NaiveDateTime" | "NaiveDate" | "SystemTime"
            ) {
                return json!({"type": "string", "format": "date-time"});
            }
            if ident == "Value" {
                return json!({"type": "object"});
            }

            let rendered: Vec<String> = type_path
                .path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect();
            let name = rendered.join("::");
            record_needed_component(info, &name);
            let qualified = if name.contains("::") || info.package.is_empty() {
                name
            } else {
                format!("{}::{}", info.package, name)
            };
            json!({"$ref": format!("#/components/schemas/{}", component_name(&qualified))})
        }
        _ => json!({"type": "object"}),
    }
}

fn generic_type_argument(segment: &syn::PathSegment, n: usize) -> Option<&syn::Type> {
    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        args.args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .nth(n)
    } else {
        None
    }
}

fn record_needed_component(info: &mut HandlerInfo, type_name: &str) {
    let key = type_name.trim();
    if key.is_empty() || info.needed_components.iter().any(|c| c == key) {
        return;
    }
    info.needed_components.push(key.to_string());
}

// ---------------------------------------------------------------------------
// Parameter bookkeeping
// ---------------------------------------------------------------------------

fn ensure_query_param(info: &mut HandlerInfo, name: &str, allow_multiple: bool) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let key = name.to_lowercase();
    let hint = info.query_hints.entry(key.clone()).or_insert(false);
    if allow_multiple {
        *hint = true;
    }
    let multiple = *hint;

    for param in info.params.iter_mut() {
        if param.location.eq_ignore_ascii_case("query") && param.name.to_lowercase() == key {
            if multiple && !param.param_type.starts_with("Vec<") {
                param.param_type = "Vec<String>".to_string();
            }
            return;
        }
    }

    info.params.push(Parameter {
        name: name.to_string(),
        location: "query".to_string(),
        param_type: if multiple {
            "Vec<String>".to_string()
        } else {
            "string".to_string()
        },
        required: false,
        description: String::new(),
    });
}

fn ensure_form_param(info: &mut HandlerInfo, mut param: Parameter) {
    if param.name.trim().is_empty() {
        return;
    }
    param.location = "formData".to_string();
    if param.param_type.trim().is_empty() {
        param.param_type = "string".to_string();
    }
    let key = param.name.to_lowercase();
    if info.form_params.iter().any(|p| p.name.to_lowercase() == key) {
        return;
    }
    info.form_params.push(param);
}

/// Expands the fields of a query struct into individual query parameters.
/// Serde renames supply the wire name, `skip` suppresses a field, and a
/// `Vec` field allows multiple values.
fn ensure_query_struct_params(info: &mut HandlerInfo, type_name: &str, registry: &TypeRegistry) {
    let mut type_name = type_name.trim();
    while let Some(stripped) = type_name
        .strip_prefix('*')
        .or_else(|| type_name.strip_prefix('&'))
    {
        type_name = stripped.trim_start_matches("mut ").trim();
    }
    if type_name.is_empty() {
        return;
    }

    let package = info.package.clone();
    let (decl, _) = registry.resolve(type_name, &package);
    let item = match decl {
        Some(decl) => match &decl.item {
            TypeItem::Struct(item) => item.clone(),
            _ => return,
        },
        None => return,
    };

    for field in item.fields.iter() {
        let (name, skip) = query_field_name(field);
        if skip || name.is_empty() {
            continue;
        }
        let allow_many = is_vec_type(&field.ty);
        ensure_query_param(info, &name, allow_many);
    }
}

fn query_field_name(field: &syn::Field) -> (String, bool) {
    let mut name = field
        .ident
        .as_ref()
        .map(|i| i.to_string())
        .unwrap_or_default();
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        let _ = attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("rename") {
                let value = nested.value()?;
                let lit: syn::LitStr = value.parse()?;
                name = lit.value();
            } else if nested.path.is_ident("skip") {
                skip = true;
            } else if let Ok(value) = nested.value() {
                let _: syn::Lit = value.parse()?;
            }
            Ok(())
        });
    }
    (name, skip)
}

fn is_vec_type(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(type_path) => {
            let segment = match type_path.path.segments.last() {
                Some(seg) => seg,
                None => return false,
            };
            match segment.ident.to_string().as_str() {
                "Vec" => true,
                "Option" => generic_type_argument(segment, 0)
                    .map(is_vec_type)
                    .unwrap_or(false),
                _ => false,
            }
        }
        syn::Type::Reference(r) => is_vec_type(&r.elem),
        syn::Type::Slice(_) => true,
        _ => false,
    }
}

/// Appends a required path parameter for each `:name` / `*name` segment not
/// already covered by an explicit annotation.
fn ensure_path_parameters(info: &mut HandlerInfo, route: &RouteRecord) {
    let params = extract_path_params(&route.path);
    if params.is_empty() {
        return;
    }
    let mut existing: HashSet<String> = info
        .params
        .iter()
        .filter(|p| p.location.eq_ignore_ascii_case("path"))
        .map(|p| p.name.to_lowercase())
        .collect();
    for name in params {
        let key = name.to_lowercase();
        if existing.contains(&key) {
            continue;
        }
        info.params.push(Parameter {
            name,
            location: "path".to_string(),
            param_type: "string".to_string(),
            required: true,
            description: String::new(),
        });
        existing.insert(key);
    }
}

fn extract_path_params(route_path: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut seen = HashSet::new();
    for segment in route_path.trim().split('/') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let name = if let Some(rest) = segment.strip_prefix(':') {
            let rest = rest.trim();
            if rest.is_empty() {
                continue;
            }
            rest.to_string()
        } else if let Some(rest) = segment.strip_prefix('*') {
            let rest = rest.trim();
            if rest.is_empty() {
                "wildcard".to_string()
            } else {
                rest.to_string()
            }
        } else {
            continue;
        };
        if seen.insert(name.to_lowercase()) {
            params.push(name);
        }
    }
    params
}

// ---------------------------------------------------------------------------
// Response bookkeeping
// ---------------------------------------------------------------------------

fn ensure_error_response(info: &mut HandlerInfo, status: &str) {
    if status.is_empty() {
        return;
    }
    info.responses
        .entry(status.to_string())
        .or_insert_with(|| "serde_json::Value".to_string());
    info.response_schemas
        .entry(status.to_string())
        .or_insert_with(|| {
            json!({
                "type": "object",
                "properties": {"error": {"type": "string"}},
                "required": ["error"],
            })
        });
}

fn ensure_binary_response(info: &mut HandlerInfo, status: &str) {
    info.response_schemas
        .entry(status.to_string())
        .or_insert_with(|| json!({"type": "string", "format": "binary"}));
}

fn ensure_text_response(info: &mut HandlerInfo, status: &str) {
    info.response_schemas
        .entry(status.to_string())
        .or_insert_with(|| json!({"type": "string"}));
}

// ---------------------------------------------------------------------------
// Small shared helpers
// ---------------------------------------------------------------------------

fn pat_idents(pat: &syn::Pat) -> Vec<String> {
    match pat {
        syn::Pat::Ident(ident) => vec![ident.ident.to_string()],
        syn::Pat::Type(typed) => pat_idents(&typed.pat),
        syn::Pat::Tuple(tuple) => tuple.elems.iter().flat_map(pat_idents).collect(),
        _ => Vec::new(),
    }
}

fn ref_target_ident(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Reference(r) => ref_target_ident(&r.expr),
        Expr::Path(path) => path.path.get_ident().map(|i| i.to_string()),
        _ => None,
    }
}

fn string_arg(expr: Option<&Expr>) -> Option<String> {
    match expr? {
        Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Str(s) => {
                let value = s.value().trim().to_string();
                if value.is_empty() {
                    None
                } else {
                    Some(value)
                }
            }
            _ => None,
        },
        _ => None,
    }
}

/// Name and receiver-derived alias of the function behind a call
/// expression.
fn callee_name(expr: &Expr) -> Option<(String, Option<String>)> {
    match expr {
        Expr::Call(call) => match call.func.as_ref() {
            Expr::Path(path) => {
                let segments: Vec<String> =
                    path.path.segments.iter().map(|s| s.ident.to_string()).collect();
                let name = segments.last()?.clone();
                let alias = if segments.len() >= 2 {
                    Some(segments[segments.len() - 2].clone())
                } else {
                    None
                };
                Some((name, alias))
            }
            _ => None,
        },
        Expr::MethodCall(call) => Some((call.method.to_string(), None)),
        Expr::Try(t) => callee_name(&t.expr),
        Expr::Await(a) => callee_name(&a.base),
        _ => None,
    }
}

fn contains_multipart_call(expr: &Expr) -> bool {
    match expr {
        Expr::MethodCall(call) => {
            call.method == "multipart_form" || contains_multipart_call(&call.receiver)
        }
        Expr::Try(t) => contains_multipart_call(&t.expr),
        Expr::Await(a) => contains_multipart_call(&a.base),
        Expr::Match(m) => contains_multipart_call(&m.expr),
        Expr::Paren(p) => contains_multipart_call(&p.expr),
        Expr::Reference(r) => contains_multipart_call(&r.expr),
        _ => false,
    }
}

fn strip_result_wrapper(type_name: &str) -> String {
    let trimmed = type_name.trim();
    let inner = match trimmed
        .strip_prefix("Result<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        Some(inner) => inner,
        None => return trimmed.to_string(),
    };
    let mut depth = 0usize;
    for (idx, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return inner[..idx].trim().to_string(),
            _ => {}
        }
    }
    inner.trim().to_string()
}

fn normalize_status(expr: &Expr) -> String {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Int(int) => int.base10_digits().to_string(),
            syn::Lit::Str(s) => s.value(),
            _ => expr_to_string(expr),
        },
        Expr::Path(path) => {
            let rendered = path_to_string(&path.path);
            if let Some(last) = path.path.segments.last() {
                if let Some(code) = status_code_for(&last.ident.to_string()) {
                    return code.to_string();
                }
            }
            rendered
        }
        other => expr_to_string(other),
    }
}

/// Standard status-constant names, keyed by the final path segment so both
/// `StatusCode::OK` and `http::StatusCode::OK` resolve.
fn status_code_for(name: &str) -> Option<&'static str> {
    let code = match name {
        "OK" => "200",
        "CREATED" => "201",
        "ACCEPTED" => "202",
        "NO_CONTENT" => "204",
        "MOVED_PERMANENTLY" => "301",
        "FOUND" => "302",
        "SEE_OTHER" => "303",
        "NOT_MODIFIED" => "304",
        "TEMPORARY_REDIRECT" => "307",
        "PERMANENT_REDIRECT" => "308",
        "BAD_REQUEST" => "400",
        "UNAUTHORIZED" => "401",
        "PAYMENT_REQUIRED" => "402",
        "FORBIDDEN" => "403",
        "NOT_FOUND" => "404",
        "METHOD_NOT_ALLOWED" => "405",
        "NOT_ACCEPTABLE" => "406",
        "REQUEST_TIMEOUT" => "408",
        "CONFLICT" => "409",
        "GONE" => "410",
        "UNPROCESSABLE_ENTITY" => "422",
        "TOO_MANY_REQUESTS" => "429",
        "INTERNAL_SERVER_ERROR" => "500",
        "NOT_IMPLEMENTED" => "501",
        "BAD_GATEWAY" => "502",
        "SERVICE_UNAVAILABLE" => "503",
        "GATEWAY_TIMEOUT" => "504",
        _ => return None,
    };
    Some(code)
}

pub(crate) fn append_unique(dst: &mut Vec<String>, values: &[String]) {
    let mut existing: HashSet<String> = dst.iter().map(|v| v.to_lowercase()).collect();
    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let key = value.to_lowercase();
        if existing.contains(&key) {
            continue;
        }
        existing.insert(key);
        dst.push(value.to_string());
    }
}

fn split_csv(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(|p| p.trim().to_string()).collect()
}

use crate::error::{Error, Result};
use crate::handlers::HandlerInfo;
use crate::registry::TypeRegistry;
use crate::routes::RouteRecord;
use crate::schema::SchemaBuilder;
use log::debug;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Builds the OpenAPI document from route records and handler descriptions.
///
/// Routes are ordered lexicographically by path, then method; every map in
/// the document serializes with sorted keys, so running the generator twice
/// over an unchanged tree yields byte-identical output.
pub fn generate_openapi(
    routes: &[RouteRecord],
    handlers: &HashMap<String, HandlerInfo>,
    registry: &TypeRegistry,
    project_name: &str,
    enable_auth: bool,
) -> Result<String> {
    if routes.is_empty() {
        return Err(Error::NoRoutes("no routes discovered".to_string()));
    }

    let mut sorted: Vec<&RouteRecord> = routes.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.method.cmp(&b.method)));

    let mut paths: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
    let mut builder = SchemaBuilder::new(registry);

    for route in sorted {
        let handler = match handlers.get(&route.handler_id) {
            Some(handler) => handler,
            None => continue,
        };
        debug!("assembling {} {}", route.method, route.path);

        let spec_path = normalize_openapi_path(&route.path);
        let mut operation = Map::new();

        operation.insert(
            "operationId".to_string(),
            json!(format!("{}.{}", handler.package, handler.name)),
        );
        let summary = if !handler.summary.is_empty() {
            handler.summary.clone()
        } else if let Some(first) = handler.notes.first() {
            first.clone()
        } else {
            handler.name.clone()
        };
        operation.insert("summary".to_string(), json!(summary));

        let description = merge_description(&handler.description, &handler.notes);
        if !description.is_empty() {
            operation.insert("description".to_string(), json!(description));
        }

        let tags = if handler.tags.is_empty() && !handler.package.is_empty() {
            vec![handler.package.clone()]
        } else {
            handler.tags.clone()
        };
        if !tags.is_empty() {
            operation.insert("tags".to_string(), json!(tags));
        }

        let parameters = build_parameters(handler, &mut builder);
        if !parameters.is_empty() {
            operation.insert("parameters".to_string(), Value::Array(parameters));
        }

        if let Some(request_body) = build_request_body(handler, &mut builder) {
            operation.insert("requestBody".to_string(), request_body);
        }

        for type_name in &handler.needed_components {
            builder.ensure_component(type_name, &handler.package);
        }

        operation.insert("responses".to_string(), build_responses(handler, &mut builder));

        paths
            .entry(spec_path)
            .or_default()
            .insert(route.method.to_lowercase(), Value::Object(operation));
    }

    if paths.is_empty() {
        return Err(Error::HandlerResolution(
            "no routes with handler metadata available".to_string(),
        ));
    }

    let title = if project_name.trim().is_empty() {
        "Auto Generated API"
    } else {
        project_name.trim()
    };

    let mut components = Map::new();
    let schemas = builder.into_components();
    if !schemas.is_empty() {
        components.insert("schemas".to_string(), json!(schemas));
    }

    let mut doc = Map::new();
    doc.insert("openapi".to_string(), json!("3.0.0"));
    doc.insert(
        "info".to_string(),
        json!({"title": title, "version": "1.0.0"}),
    );
    doc.insert("paths".to_string(), json!(paths));

    if enable_auth {
        components.insert(
            "securitySchemes".to_string(),
            json!({"bearerAuth": {"type": "http", "scheme": "bearer"}}),
        );
        doc.insert("security".to_string(), json!([{"bearerAuth": []}]));
    }
    doc.insert("components".to_string(), Value::Object(components));

    Ok(serde_json::to_string_pretty(&Value::Object(doc))?)
}

/// Non-form parameters, deduplicated by (in, name), with `string` as the
/// default type.
fn build_parameters(handler: &HandlerInfo, builder: &mut SchemaBuilder) -> Vec<Value> {
    let mut params = Vec::new();
    let mut seen = HashSet::new();

    for p in &handler.params {
        if p.location.eq_ignore_ascii_case("formdata") {
            continue;
        }
        if p.name.is_empty() || p.location.is_empty() {
            continue;
        }
        let key = format!("{}:{}", p.location, p.name);
        if !seen.insert(key) {
            continue;
        }

        let type_name = if p.param_type.trim().is_empty() {
            "string"
        } else {
            p.param_type.trim()
        };
        let schema = builder.schema_or_ref(type_name, &handler.package);

        let mut param = Map::new();
        param.insert("name".to_string(), json!(p.name));
        param.insert("in".to_string(), json!(p.location));
        param.insert("required".to_string(), json!(p.required));
        param.insert("schema".to_string(), schema);
        if !p.description.is_empty() {
            param.insert("description".to_string(), json!(p.description));
        }
        params.push(Value::Object(param));
    }
    params
}

fn build_request_body(handler: &HandlerInfo, builder: &mut SchemaBuilder) -> Option<Value> {
    let input_type = handler.input_type.trim();
    if !input_type.is_empty() {
        let content_type = pick_first(&handler.consumes, "application/json");
        let schema = builder.schema_or_ref(input_type, &handler.package);
        let required = handler.body_required || !handler.body_defined;
        let mut body = Map::new();
        body.insert("required".to_string(), json!(required));
        body.insert("content".to_string(), media_content(&content_type, schema));
        return Some(Value::Object(body));
    }

    if handler.form_params.is_empty() {
        return None;
    }

    let mut props = Map::new();
    let mut required = Vec::new();
    for param in &handler.form_params {
        if param.name.is_empty() {
            continue;
        }
        let schema = builder.form_param_schema(&param.param_type, &handler.package);
        props.insert(param.name.clone(), schema);
        if param.required {
            required.push(param.name.clone());
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    if !props.is_empty() {
        schema.insert("properties".to_string(), Value::Object(props));
        schema.insert("additionalProperties".to_string(), json!(false));
    }
    required.sort();
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }

    let content_type = pick_form_content_type(handler);
    let mut body = Map::new();
    body.insert("required".to_string(), json!(!required.is_empty()));
    body.insert(
        "content".to_string(),
        media_content(&content_type, Value::Object(schema)),
    );
    Some(Value::Object(body))
}

/// Wraps a schema in a `{<content-type>: {"schema": ...}}` media map.
fn media_content(content_type: &str, schema: Value) -> Value {
    let mut media = Map::new();
    media.insert("schema".to_string(), schema);
    let mut content = Map::new();
    content.insert(content_type.to_string(), Value::Object(media));
    Value::Object(content)
}

/// Form bodies default to multipart when a file field is present. A JSON
/// value in `consumes` is ignored here: a form-only handler cannot accept
/// JSON, so the form default wins.
fn pick_form_content_type(handler: &HandlerInfo) -> String {
    let default_ct = if has_file_form_param(handler) {
        "multipart/form-data"
    } else {
        "application/x-www-form-urlencoded"
    };
    let ct = pick_first(&handler.consumes, default_ct);
    if ct.is_empty() || ct.contains("json") {
        return default_ct.to_string();
    }
    ct
}

fn has_file_form_param(handler: &HandlerInfo) -> bool {
    handler.form_params.iter().any(|p| {
        p.param_type.eq_ignore_ascii_case("file") || p.param_type.eq_ignore_ascii_case("binary")
    })
}

fn build_responses(handler: &HandlerInfo, builder: &mut SchemaBuilder) -> Value {
    let mut responses = Map::new();

    if handler.responses.is_empty()
        && handler.empty_body_status.is_empty()
        && handler.response_schemas.is_empty()
    {
        responses.insert("200".to_string(), json!({"description": "Success"}));
        return Value::Object(responses);
    }

    let mut statuses: Vec<String> = handler
        .responses
        .keys()
        .chain(handler.response_schemas.keys())
        .chain(handler.empty_body_status.iter())
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    statuses.sort();

    for status in statuses {
        let mut resp = Map::new();
        resp.insert("description".to_string(), json!(status_description(&status)));

        if handler.empty_body_status.contains(&status) {
            responses.insert(status, Value::Object(resp));
            continue;
        }

        let content_type = pick_first(&handler.produces, "application/json");
        let schema = match handler.response_schemas.get(&status) {
            Some(explicit) => explicit.clone(),
            None => {
                let typ = handler
                    .responses
                    .get(&status)
                    .map(|t| t.trim())
                    .unwrap_or_default();
                builder.schema_or_ref(typ, &handler.package)
            }
        };
        resp.insert("content".to_string(), media_content(&content_type, schema));
        responses.insert(status, Value::Object(resp));
    }

    Value::Object(responses)
}

/// Prepends notes to the description, separated by a blank line, unless the
/// description already contains the first note.
fn merge_description(description: &str, notes: &[String]) -> String {
    let desc = description.trim();
    if notes.is_empty() {
        return desc.to_string();
    }
    let notes_text = notes.join(" ").trim().to_string();
    if notes_text.is_empty() {
        return desc.to_string();
    }
    if desc.is_empty() {
        return notes_text;
    }
    let first_note = notes[0].trim();
    if !first_note.is_empty() && desc.contains(first_note) {
        return desc.to_string();
    }
    format!("{}\n\n{}", notes_text, desc)
}

/// Rewrites `:name` and `*name` segments to `{name}`; empty placeholder
/// names default to `param` and `wildcard`. Idempotent.
pub fn normalize_openapi_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return "/".to_string();
    }
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| {
            let trimmed = segment.trim();
            if let Some(rest) = trimmed.strip_prefix(':') {
                let name = rest.trim();
                let name = if name.is_empty() { "param" } else { name };
                format!("{{{}}}", name)
            } else if let Some(rest) = trimmed.strip_prefix('*') {
                let name = rest.trim();
                let name = if name.is_empty() { "wildcard" } else { name };
                format!("{{{}}}", name)
            } else {
                trimmed.to_string()
            }
        })
        .collect();
    let result = segments.join("/");
    if result.starts_with('/') {
        result
    } else {
        format!("/{}", result)
    }
}

fn pick_first(values: &[String], fallback: &str) -> String {
    for value in values {
        let value = value.trim();
        if !value.is_empty() {
            return canonical_content_type(value, fallback);
        }
    }
    canonical_content_type("", fallback)
}

/// Maps MIME shortcuts (`json`, `form`, ...) onto full content types;
/// unknown values pass through unchanged.
fn canonical_content_type(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        return fallback.to_string();
    }
    match value.to_lowercase().as_str() {
        "json" | "application/json" => "application/json".to_string(),
        "xml" | "application/xml" => "application/xml".to_string(),
        "yaml" | "yml" | "application/x-yaml" | "application/yaml" => {
            "application/x-yaml".to_string()
        }
        "form" | "application/x-www-form-urlencoded" | "x-www-form-urlencoded" => {
            "application/x-www-form-urlencoded".to_string()
        }
        "multipart" | "multipart/form-data" => "multipart/form-data".to_string(),
        "text" | "text/plain" => "text/plain".to_string(),
        "html" | "text/html" => "text/html".to_string(),
        _ => value.to_string(),
    }
}

/// Response description for a status code: a handful of statuses carry the
/// generator's own phrasing, everything else falls back to the standard
/// reason phrase, then to `Response` for unknown codes.
fn status_description(status: &str) -> &'static str {
    let status = status.trim();
    if let Some(desc) = custom_status_description(status) {
        return desc;
    }
    standard_reason_phrase(status).unwrap_or("Response")
}

fn custom_status_description(status: &str) -> Option<&'static str> {
    let desc = match status {
        "200" => "Success",
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No Content",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "409" => "Conflict",
        "500" => "Internal Error",
        "503" => "Service Unavailable",
        _ => return None,
    };
    Some(desc)
}

/// Standard HTTP reason phrases for the IANA-registered status codes.
fn standard_reason_phrase(status: &str) -> Option<&'static str> {
    let phrase = match status {
        "100" => "Continue",
        "101" => "Switching Protocols",
        "102" => "Processing",
        "103" => "Early Hints",
        "200" => "OK",
        "201" => "Created",
        "202" => "Accepted",
        "203" => "Non-Authoritative Information",
        "204" => "No Content",
        "205" => "Reset Content",
        "206" => "Partial Content",
        "207" => "Multi-Status",
        "208" => "Already Reported",
        "226" => "IM Used",
        "300" => "Multiple Choices",
        "301" => "Moved Permanently",
        "302" => "Found",
        "303" => "See Other",
        "304" => "Not Modified",
        "305" => "Use Proxy",
        "307" => "Temporary Redirect",
        "308" => "Permanent Redirect",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "402" => "Payment Required",
        "403" => "Forbidden",
        "404" => "Not Found",
        "405" => "Method Not Allowed",
        "406" => "Not Acceptable",
        "407" => "Proxy Authentication Required",
        "408" => "Request Timeout",
        "409" => "Conflict",
        "410" => "Gone",
        "411" => "Length Required",
        "412" => "Precondition Failed",
        "413" => "Payload Too Large",
        "414" => "URI Too Long",
        "415" => "Unsupported Media Type",
        "416" => "Range Not Satisfiable",
        "417" => "Expectation Failed",
        "418" => "I'm a teapot",
        "421" => "Misdirected Request",
        "422" => "Unprocessable Entity",
        "423" => "Locked",
        "424" => "Failed Dependency",
        "425" => "Too Early",
        "426" => "Upgrade Required",
        "428" => "Precondition Required",
        "429" => "Too Many Requests",
        "431" => "Request Header Fields Too Large",
        "451" => "Unavailable For Legal Reasons",
        "500" => "Internal Server Error",
        "501" => "Not Implemented",
        "502" => "Bad Gateway",
        "503" => "Service Unavailable",
        "504" => "Gateway Timeout",
        "505" => "HTTP Version Not Supported",
        "506" => "Variant Also Negotiates",
        "507" => "Insufficient Storage",
        "508" => "Loop Detected",
        "510" => "Not Extended",
        "511" => "Network Authentication Required",
        _ => return None,
    };
    Some(phrase)
}

use crate::registry::{TypeDecl, TypeItem, TypeRegistry};
use crate::render::type_to_string;
use log::debug;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Derives the stable component identifier for a host type expression:
/// path separators collapse to `_`, generic brackets and spaces are
/// stripped.
pub fn component_name(type_name: &str) -> String {
    type_name
        .trim()
        .trim_start_matches('&')
        .trim_start_matches('*')
        .replace("::", "_")
        .replace(['<', '>', ',', ' '], "")
}

/// Converts host type expressions into JSON-Schema fragments, materializing
/// named types as reusable components through the type registry.
///
/// Recursive type graphs terminate through the `building` set: a component
/// already in progress emits only its `$ref`, leaving installation to the
/// outer frame. Components are installed exactly once.
pub struct SchemaBuilder<'a> {
    registry: &'a TypeRegistry,
    components: BTreeMap<String, Value>,
    building: HashSet<String>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            components: BTreeMap::new(),
            building: HashSet::new(),
        }
    }

    /// Builds a schema fragment for a type expression rendered as text.
    ///
    /// A type-resolution miss is recovered, not fatal: the reference
    /// degrades to `{"type": "object"}`.
    pub fn schema_or_ref(&mut self, type_text: &str, pkg: &str) -> Value {
        let mut text = type_text.trim();
        if text.is_empty() {
            return json!({"type": "string"});
        }
        while let Some(stripped) = text
            .strip_prefix('*')
            .or_else(|| text.strip_prefix('&'))
            .map(|t| t.trim_start_matches("mut ").trim())
        {
            text = stripped;
        }

        match syn::parse_str::<syn::Type>(text) {
            Ok(ty) => self.schema_from_type(&ty, pkg),
            Err(_) => json!({"type": "object"}),
        }
    }

    /// Schema for a form parameter type; the pseudo-types `file` and
    /// `binary` become binary strings.
    pub fn form_param_schema(&mut self, type_name: &str, pkg: &str) -> Value {
        let trimmed = type_name.trim();
        if trimmed.is_empty() {
            return json!({"type": "string"});
        }
        match trimmed.to_lowercase().as_str() {
            "file" | "binary" => json!({"type": "string", "format": "binary"}),
            _ => self.schema_or_ref(trimmed, pkg),
        }
    }

    /// Materializes a named type as a component and returns its name.
    pub fn ensure_component(&mut self, type_name: &str, pkg: &str) -> String {
        let qualified = if type_name.contains("::") || pkg.is_empty() {
            type_name.to_string()
        } else {
            format!("{}::{}", pkg, type_name)
        };
        let comp_name = component_name(&qualified);
        if self.components.contains_key(&comp_name) {
            return comp_name;
        }

        let (decl, key) = self.registry.resolve(type_name, pkg);
        let key = if key.is_empty() { qualified } else { key };
        if self.building.contains(&key) {
            return comp_name;
        }
        self.building.insert(key.clone());

        let schema = match decl {
            Some(decl) => {
                let decl = decl.clone();
                self.schema_from_decl(&decl)
            }
            None => {
                debug!("unresolved type {}, degrading to object", type_name);
                json!({"type": "object"})
            }
        };

        self.components.insert(comp_name.clone(), schema);
        self.building.remove(&key);
        comp_name
    }

    /// Consumes the builder, returning every materialized component.
    pub fn into_components(self) -> BTreeMap<String, Value> {
        self.components
    }

    fn schema_from_decl(&mut self, decl: &TypeDecl) -> Value {
        match &decl.item {
            TypeItem::Struct(item) => match &item.fields {
                syn::Fields::Named(named) => self.object_schema(named, &decl.package),
                _ => json!({"type": "object"}),
            },
            TypeItem::Enum(item) => enum_schema(item),
            TypeItem::Alias(item) => self.schema_from_type(&item.ty, &decl.package),
        }
    }

    /// Builds an object schema from named struct fields, honoring serde
    /// attributes. Fields hidden by `skip` are dropped; `Option` and
    /// `skip_serializing_if` fields are not required. The required list is
    /// sorted lexicographically.
    pub fn object_schema(&mut self, fields: &syn::FieldsNamed, pkg: &str) -> Value {
        let mut props = Map::new();
        let mut required = Vec::new();

        for field in &fields.named {
            let meta = json_field_metadata(field);
            if meta.skip || meta.name.is_empty() {
                continue;
            }
            let field_schema = self.schema_from_type(&field.ty, pkg);
            let optional = meta.omit_empty || is_optional_field(&field.ty);
            if !optional {
                required.push(meta.name.clone());
            }
            props.insert(meta.name, field_schema);
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        if !props.is_empty() {
            schema.insert("properties".to_string(), Value::Object(props));
        }
        if !required.is_empty() {
            required.sort();
            schema.insert("required".to_string(), json!(required));
        }
        Value::Object(schema)
    }

    fn schema_from_type(&mut self, ty: &syn::Type, pkg: &str) -> Value {
        match ty {
            syn::Type::Reference(r) => self.schema_from_type(&r.elem, pkg),
            syn::Type::Paren(p) => self.schema_from_type(&p.elem, pkg),
            syn::Type::Group(g) => self.schema_from_type(&g.elem, pkg),
            syn::Type::Slice(s) => {
                json!({"type": "array", "items": self.schema_from_type(&s.elem, pkg)})
            }
            syn::Type::Array(a) => {
                json!({"type": "array", "items": self.schema_from_type(&a.elem, pkg)})
            }
            syn::Type::TraitObject(_) | syn::Type::ImplTrait(_) | syn::Type::Tuple(_) => {
                json!({"type": "object"})
            }
            syn::Type::Path(type_path) => self.schema_from_type_path(type_path, pkg),
            _ => json!({"type": "object"}),
        }
    }

    fn schema_from_type_path(&mut self, type_path: &syn::TypePath, pkg: &str) -> Value {
        let segment = match type_path.path.segments.last() {
            Some(seg) => seg,
            None => return json!({"type": "object"}),
        };
        let ident = segment.ident.to_string();

        // Pointer-like and optional wrappers are transparent; required-ness
        // of optional fields is decided at the field level.
        if matches!(ident.as_str(), "Option" | "Box" | "Arc" | "Rc" | "Cow") {
            if let Some(inner) = first_type_argument(segment) {
                return self.schema_from_type(inner, pkg);
            }
            return json!({"type": "object"});
        }

        if ident == "Vec" {
            if let Some(inner) = first_type_argument(segment) {
                if type_to_string(inner) == "u8" {
                    return json!({"type": "string", "format": "byte"});
                }
                return json!({"type": "array", "items": self.schema_from_type(inner, pkg)});
            }
            return json!({"type": "array", "items": {"type": "object"}});
        }

        if matches!(ident.as_str(), "HashMap" | "BTreeMap" | "Map") {
            let value_schema = nth_type_argument(segment, 1)
                .map(|inner| self.schema_from_type(inner, pkg))
                .unwrap_or_else(|| json!({"type": "object"}));
            return json!({"type": "object", "additionalProperties": value_schema});
        }

        match ident.to_lowercase().as_str() {
            "string" | "str" | "char" => return json!({"type": "string"}),
            "bool" | "boolean" => return json!({"type": "boolean"}),
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" => return json!({"type": "integer"}),
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
        let comp = self.ensure_component(&rendered.join("::"), pkg);
        json!({"$ref": format!("#/components/schemas/{}", comp)})
    }
}

fn enum_schema(item: &syn::ItemEnum) -> Value {
    let mut values = Vec::new();
    for variant in &item.variants {
        if !matches!(variant.fields, syn::Fields::Unit) {
            return json!({"type": "object"});
        }
        let mut name = variant.ident.to_string();
        for attr in &variant.attrs {
            if !attr.path().is_ident("serde") {
                continue;
            }
            let _ = attr.parse_nested_meta(|nested| {
                if nested.path.is_ident("rename") {
                    let value = nested.value()?;
                    let lit: syn::LitStr = value.parse()?;
                    name = lit.value();
                } else if let Ok(value) = nested.value() {
                    let _: syn::Lit = value.parse()?;
                }
                Ok(())
            });
        }
        values.push(name);
    }
    json!({"type": "string", "enum": values})
}

/// Field naming and visibility details extracted from serde attributes.
struct FieldMeta {
    name: String,
    skip: bool,
    omit_empty: bool,
}

fn json_field_metadata(field: &syn::Field) -> FieldMeta {
    let mut meta = FieldMeta {
        name: field
            .ident
            .as_ref()
            .map(|i| i.to_string())
            .unwrap_or_default(),
        skip: false,
        omit_empty: false,
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        let _ = attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("rename") {
                let value = nested.value()?;
                let lit: syn::LitStr = value.parse()?;
                meta.name = lit.value();
            } else if nested.path.is_ident("skip") || nested.path.is_ident("skip_serializing") {
                meta.skip = true;
            } else if nested.path.is_ident("skip_serializing_if") {
                meta.omit_empty = true;
                let value = nested.value()?;
                let _: syn::LitStr = value.parse()?;
            } else if let Ok(value) = nested.value() {
                let _: syn::Lit = value.parse()?;
            }
            Ok(())
        });
    }
    meta
}

/// `Option` fields and pointer-typed fields (references, `Box`, `Arc`,
/// `Rc`) stay out of `required`.
fn is_optional_field(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Reference(_) => true,
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|s| {
                matches!(
                    s.ident.to_string().as_str(),
                    "Option" | "Box" | "Arc" | "Rc"
                )
            })
            .unwrap_or(false),
        syn::Type::Paren(p) => is_optional_field(&p.elem),
        syn::Type::Group(g) => is_optional_field(&g.elem),
        _ => false,
    }
}

fn first_type_argument(segment: &syn::PathSegment) -> Option<&syn::Type> {
    nth_type_argument(segment, 0)
}

fn nth_type_argument(segment: &syn::PathSegment, n: usize) -> Option<&syn::Type> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use std::path::Path;

    fn registry_from(pkg: &str, code: &str) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        let ast: syn::File = syn::parse_str(code).unwrap();
        registry.index_file_items(pkg, Path::new("test.rs"), &ast.items);
        registry
    }

    #[test]
    fn test_primitive_vocabulary() {
        let registry = TypeRegistry::new();
        let mut builder = SchemaBuilder::new(&registry);

        assert_eq!(builder.schema_or_ref("String", ""), json!({"type": "string"}));
        assert_eq!(builder.schema_or_ref("bool", ""), json!({"type": "boolean"}));
        assert_eq!(builder.schema_or_ref("u64", ""), json!({"type": "integer"}));
        assert_eq!(builder.schema_or_ref("usize", ""), json!({"type": "integer"}));
        assert_eq!(builder.schema_or_ref("f32", ""), json!({"type": "number"}));
        assert_eq!(
            builder.schema_or_ref("Vec<u8>", ""),
            json!({"type": "string", "format": "byte"})
        );
        assert_eq!(
            builder.schema_or_ref("NaiveDateTime", ""),
            json!({"type": "string", "format": "date-time"})
        );
        assert_eq!(
            builder.schema_or_ref("serde_json::Value", ""),
            json!({"type": "object"})
        );
    }

    #[test]
    fn test_array_and_map_forms() {
        let registry = TypeRegistry::new();
        let mut builder = SchemaBuilder::new(&registry);

        assert_eq!(
            builder.schema_or_ref("Vec<String>", ""),
            json!({"type": "array", "items": {"type": "string"}})
        );
        assert_eq!(
            builder.schema_or_ref("&[i64]", ""),
            json!({"type": "array", "items": {"type": "integer"}})
        );
        assert_eq!(
            builder.schema_or_ref("HashMap<String, f64>", ""),
            json!({"type": "object", "additionalProperties": {"type": "number"}})
        );
    }

    #[test]
    fn test_pointer_and_option_wrappers_are_transparent() {
        let registry = TypeRegistry::new();
        let mut builder = SchemaBuilder::new(&registry);

        assert_eq!(builder.schema_or_ref("&mut String", ""), json!({"type": "string"}));
        assert_eq!(builder.schema_or_ref("Box<i32>", ""), json!({"type": "integer"}));
        assert_eq!(
            builder.schema_or_ref("Option<Vec<String>>", ""),
            json!({"type": "array", "items": {"type": "string"}})
        );
    }

    #[test]
    fn test_named_struct_becomes_component_ref() {
        let registry = registry_from(
            "models",
            r#"
            pub struct User {
                pub id: u32,
                #[serde(rename = "userName")]
                pub name: String,
                pub email: Option<String>,
                #[serde(skip)]
                pub password: String,
                #[serde(skip_serializing_if = "Vec::is_empty")]
                pub tags: Vec<String>,
            }
            "#,
        );
        let mut builder = SchemaBuilder::new(&registry);

        let schema = builder.schema_or_ref("User", "models");
        assert_eq!(schema, json!({"$ref": "#/components/schemas/models_User"}));

        let components = builder.into_components();
        let user = components.get("models_User").unwrap();
        assert_eq!(user["type"], "object");
        assert_eq!(user["properties"]["userName"]["type"], "string");
        assert_eq!(user["properties"]["email"]["type"], "string");
        assert!(user["properties"].get("password").is_none());
        // Sorted, with optional and hidden fields excluded.
        assert_eq!(user["required"], json!(["id", "userName"]));
    }

    #[test]
    fn test_cyclic_types_terminate() {
        let registry = registry_from(
            "tree",
            r#"
            pub struct Node {
                pub value: i64,
                pub children: Vec<Node>,
            }
            "#,
        );
        let mut builder = SchemaBuilder::new(&registry);

        let schema = builder.schema_or_ref("Node", "tree");
        assert_eq!(schema["$ref"], "#/components/schemas/tree_Node");

        let components = builder.into_components();
        let node = components.get("tree_Node").unwrap();
        assert_eq!(
            node["properties"]["children"]["items"]["$ref"],
            "#/components/schemas/tree_Node"
        );
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn test_pointer_typed_fields_are_not_required() {
        let registry = registry_from(
            "tree",
            r#"
            pub struct Node {
                pub value: i64,
                pub child: Box<Node>,
                pub meta: Arc<Meta>,
                pub label: Rc<String>,
                pub hint: &'static str,
            }
            pub struct Meta {
                pub key: String,
            }
            "#,
        );
        let mut builder = SchemaBuilder::new(&registry);
        builder.ensure_component("Node", "tree");

        let components = builder.into_components();
        let node = components.get("tree_Node").unwrap();
        // Pointer-typed fields keep their schemas but stay out of required.
        assert_eq!(node["required"], json!(["value"]));
        assert_eq!(
            node["properties"]["child"]["$ref"],
            "#/components/schemas/tree_Node"
        );
        assert_eq!(
            node["properties"]["meta"]["$ref"],
            "#/components/schemas/tree_Meta"
        );
        assert_eq!(node["properties"]["label"]["type"], "string");
        assert_eq!(node["properties"]["hint"]["type"], "string");
    }

    #[test]
    fn test_mutually_recursive_types() {
        let registry = registry_from(
            "graph",
            r#"
            pub struct Node { pub edges: Vec<Edge> }
            pub struct Edge { pub to: Node }
            "#,
        );
        let mut builder = SchemaBuilder::new(&registry);
        builder.ensure_component("Node", "graph");

        let components = builder.into_components();
        assert!(components.contains_key("graph_Node"));
        assert!(components.contains_key("graph_Edge"));
        assert_eq!(
            components["graph_Edge"]["properties"]["to"]["$ref"],
            "#/components/schemas/graph_Node"
        );
    }

    #[test]
    fn test_alias_forwards_to_target() {
        let registry = registry_from("api", "pub type Labels = Vec<String>;");
        let mut builder = SchemaBuilder::new(&registry);

        builder.ensure_component("Labels", "api");
        let components = builder.into_components();
        assert_eq!(
            components["api_Labels"],
            json!({"type": "array", "items": {"type": "string"}})
        );
    }

    #[test]
    fn test_unit_enum_schema() {
        let registry = registry_from(
            "api",
            r#"
            pub enum Status {
                Active,
                #[serde(rename = "off")]
                Inactive,
            }
            "#,
        );
        let mut builder = SchemaBuilder::new(&registry);

        builder.ensure_component("Status", "api");
        let components = builder.into_components();
        assert_eq!(
            components["api_Status"],
            json!({"type": "string", "enum": ["Active", "off"]})
        );
    }

    #[test]
    fn test_unresolved_type_degrades_to_object() {
        let registry = TypeRegistry::new();
        let mut builder = SchemaBuilder::new(&registry);

        let schema = builder.schema_or_ref("Ghost", "api");
        assert_eq!(schema["$ref"], "#/components/schemas/api_Ghost");

        let components = builder.into_components();
        assert_eq!(components["api_Ghost"], json!({"type": "object"}));
    }

    #[test]
    fn test_form_param_pseudo_types() {
        let registry = TypeRegistry::new();
        let mut builder = SchemaBuilder::new(&registry);

        assert_eq!(
            builder.form_param_schema("file", ""),
            json!({"type": "string", "format": "binary"})
        );
        assert_eq!(
            builder.form_param_schema("binary", ""),
            json!({"type": "string", "format": "binary"})
        );
        assert_eq!(builder.form_param_schema("String", ""), json!({"type": "string"}));
    }

    #[test]
    fn test_component_name_derivation() {
        assert_eq!(component_name("models::User"), "models_User");
        assert_eq!(component_name("&models::User"), "models_User");
        assert_eq!(component_name("Page<Item>"), "PageItem");
        assert_eq!(component_name(" spaced ::Name "), "spaced_Name");
    }
}

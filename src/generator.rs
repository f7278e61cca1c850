use crate::error::{Error, Result};
use crate::handlers::build_handler_index;
use crate::openapi::generate_openapi;
use crate::routes::{find_routes, RouteRecord};
use crate::workspace::{find_module_root, module_prefix_from_root};
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Describes how the OpenAPI document should be generated for a project
/// tree. All fields are optional; defaults trigger automatic discovery
/// based on the current module.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    /// Module/workspace root; defaults to the module root above the current
    /// directory.
    pub workspace_root: Option<PathBuf>,
    /// Directories to scan for routes; defaults to the workspace root.
    /// Relative paths resolve against the workspace root.
    pub route_paths: Vec<PathBuf>,
    /// URL prefixes to exclude from the generated document. The UI mount
    /// prefixes `/swagger` and `/redoc` are always excluded.
    pub skip_prefixes: Vec<String>,
    /// Destination for [`generate_and_save_openapi`]; relative paths
    /// resolve against the workspace root. Defaults to `openapi.json`.
    pub output_path: Option<PathBuf>,
    /// Override for the generated document title.
    pub project_name: Option<String>,
    /// Include a bearer security scheme and a global security requirement.
    pub enable_auth_ui: bool,
}

/// Discovers routes and handlers for the configured project and returns the
/// generated OpenAPI document.
pub fn generate_project_openapi(config: &ProjectConfig) -> Result<String> {
    let root = resolve_workspace_root(config.workspace_root.as_deref())?;
    info!("workspace root: {}", root.display());

    let inputs = resolve_route_inputs(&root, &config.route_paths);
    let routes = collect_routes(&inputs, &config.skip_prefixes)?;
    info!("{} route(s) after skip filtering", routes.len());

    let (handlers, registry) = build_handler_index(&routes, &root)?;
    if handlers.is_empty() {
        return Err(Error::HandlerResolution(format!(
            "no handlers discovered under {}",
            root.display()
        )));
    }

    let project_name = match &config.project_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => derive_project_name(&root),
    };

    generate_openapi(&routes, &handlers, &registry, &project_name, config.enable_auth_ui)
}

/// Builds the document and writes it to disk, returning the output path and
/// the emitted bytes.
pub fn generate_and_save_openapi(config: &ProjectConfig) -> Result<(PathBuf, String)> {
    let spec = generate_project_openapi(config)?;
    let root = resolve_workspace_root(config.workspace_root.as_deref())?;

    let output = match &config.output_path {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => root.join(path),
        None => root.join("openapi.json"),
    };

    write_output(&output, &spec)?;
    Ok((output, spec))
}

fn resolve_workspace_root(root: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = root {
        if root.as_os_str().is_empty() {
            return Err(Error::Config("workspace root is empty".to_string()));
        }
        let abs = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        if !abs.is_dir() {
            return Err(Error::Config(format!(
                "workspace root is not a directory: {}",
                abs.display()
            )));
        }
        return Ok(abs);
    }

    let cwd = std::env::current_dir()?;
    match find_module_root(&cwd) {
        Ok(root) => Ok(root),
        Err(_) => Ok(cwd),
    }
}

fn resolve_route_inputs(root: &Path, inputs: &[PathBuf]) -> Vec<PathBuf> {
    if inputs.is_empty() {
        return vec![root.to_path_buf()];
    }

    let mut seen = HashSet::new();
    let mut paths = Vec::new();
    for input in inputs {
        if input.as_os_str().is_empty() {
            continue;
        }
        let abs = if input.is_absolute() {
            input.clone()
        } else {
            root.join(input)
        };
        if seen.insert(abs.clone()) {
            paths.push(abs);
        }
    }

    if paths.is_empty() {
        return vec![root.to_path_buf()];
    }
    paths
}

fn collect_routes(paths: &[PathBuf], skip_prefixes: &[String]) -> Result<Vec<RouteRecord>> {
    if paths.is_empty() {
        return Err(Error::Config("no input paths provided".to_string()));
    }

    let skipper = RouteSkipper::new(skip_prefixes);
    let mut route_set: BTreeMap<String, RouteRecord> = BTreeMap::new();

    for dir in paths {
        for route in find_routes(dir)? {
            if skipper.skip(&route) {
                debug!("skipping {} {}", route.method, route.path);
                continue;
            }
            let key = format!(
                "{}|{}|{}",
                route.source_file.to_string_lossy().replace('\\', "/"),
                route.method,
                route.path
            );
            route_set.insert(key, route);
        }
    }

    if route_set.is_empty() {
        return Err(Error::NoRoutes("no routes discovered".to_string()));
    }

    let mut routes: Vec<RouteRecord> = route_set.into_values().collect();
    routes.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.method.cmp(&b.method)));
    Ok(routes)
}

fn derive_project_name(root: &Path) -> String {
    if let Ok(prefix) = module_prefix_from_root(root) {
        if !prefix.trim().is_empty() {
            return prefix;
        }
    }
    root.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Project".to_string())
}

/// Filters routes out of the document by URL prefix and by defining file.
struct RouteSkipper {
    prefixes: Vec<String>,
}

impl RouteSkipper {
    fn new(prefixes: &[String]) -> Self {
        let defaults = ["/swagger", "/redoc"];
        let mut seen = HashSet::new();
        let mut filtered = Vec::new();
        for prefix in defaults.iter().map(|p| p.to_string()).chain(prefixes.iter().cloned()) {
            let trimmed = prefix.trim();
            if trimmed.is_empty() {
                continue;
            }
            let normalized = if trimmed.starts_with('/') {
                trimmed.to_string()
            } else {
                format!("/{}", trimmed)
            };
            if seen.insert(normalized.to_lowercase()) {
                filtered.push(normalized);
            }
        }
        Self { prefixes: filtered }
    }

    fn skip(&self, route: &RouteRecord) -> bool {
        let path = route.path.trim();
        if path.is_empty() {
            return true;
        }
        let path_lower = path.to_lowercase();
        if self
            .prefixes
            .iter()
            .any(|prefix| path_lower.starts_with(&prefix.to_lowercase()))
        {
            return true;
        }
        // Any file under a swagger directory is treated as UI glue, even if
        // it holds legitimate user handlers.
        let file = route.source_file.to_string_lossy().replace('\\', "/");
        file.to_lowercase().contains("/swagger")
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder.create(parent)?;
    }
    fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    }
    debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

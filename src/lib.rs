//! routedoc - OpenAPI 3.0 documentation from fiber-style Rust web services.
//!
//! This library statically analyzes a Rust source tree to find HTTP route
//! registrations, infer each handler's inputs and outputs, and emit an
//! OpenAPI document. The analyzed code never runs.
//!
//! # Pipeline
//!
//! 1. [`scanner`] / [`parser`] - walk the workspace and parse source files
//! 2. [`registry`] - index named types and function signatures
//! 3. [`routes`] - extract route registrations (verbs, group prefixes,
//!    handler identities)
//! 4. [`handlers`] - analyze each handler's doc annotations and body
//! 5. [`schema`] - convert type expressions into JSON-Schema components
//! 6. [`openapi`] - assemble and serialize the final document
//!
//! The [`generator`] module drives the stages end to end from a
//! [`generator::ProjectConfig`]; [`cli`] wraps it for the `routedoc`
//! binary.
//!
//! # Example
//!
//! ```no_run
//! use routedoc::generator::{generate_and_save_openapi, ProjectConfig};
//! use std::path::PathBuf;
//!
//! let config = ProjectConfig {
//!     workspace_root: Some(PathBuf::from("./my-service")),
//!     ..ProjectConfig::default()
//! };
//! let (path, _spec) = generate_and_save_openapi(&config).unwrap();
//! println!("wrote {}", path.display());
//! ```

pub mod cli;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod openapi;
pub mod parser;
pub mod registry;
pub mod render;
pub mod routes;
pub mod scanner;
pub mod schema;
pub mod workspace;

use std::path::{Path, PathBuf};

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by the pipeline, each prefixed with the stage that
/// produced it.
#[derive(Debug)]
pub enum Error {
    /// Invalid or missing configuration (workspace root, paths).
    Config(String),
    /// A scanned file failed to parse. Always fatal: a silently skipped file
    /// would produce a misleading document.
    Parse { file: PathBuf, message: String },
    /// Zero route records survived discovery.
    NoRoutes(String),
    /// A route exists but its handler could not be reached.
    HandlerResolution(String),
    IoError(std::io::Error),
    SerializationError(serde_json::Error),
}

impl Error {
    /// Attach a file path to a syn parse error.
    pub fn parse(file: &Path, err: &syn::Error) -> Self {
        Error::Parse {
            file: file.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config: {}", msg),
            Error::Parse { file, message } => {
                write!(f, "parse: {}: {}", file.display(), message)
            }
            Error::NoRoutes(msg) => write!(f, "routes: {}", msg),
            Error::HandlerResolution(msg) => write!(f, "handlers: {}", msg),
            Error::IoError(e) => write!(f, "io: {}", e),
            Error::SerializationError(e) => write!(f, "serialize: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::SerializationError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err)
    }
}

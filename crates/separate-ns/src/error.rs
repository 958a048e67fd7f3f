//! Error types for the upgrade

use std::path::PathBuf;

/// Upgrade Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Upgrade errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("malformed manifest {}: {message}", path.display())]
    MalformedManifest { path: PathBuf, message: String },

    #[error("no cluster declaration given, pass --cluster-declaration or set {env}")]
    MissingDeclaration { env: &'static str },

    #[error("nothing to do")]
    NothingToDo,

    #[error("command failed: {message}")]
    CommandFailed { message: String },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::MalformedManifest {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }

    /// Whether this error, or any error it wraps, means there is nothing to do.
    pub fn is_nothing_to_do(&self) -> bool {
        match self {
            Error::NothingToDo => true,
            Error::Context { source, .. } => source.is_nothing_to_do(),
            _ => false,
        }
    }
}

/// Extension trait for attaching a description of the operation in progress.
///
/// Mirrors the `"doing x: {err}"` chains the operator reads when a run aborts.
pub trait ResultExt<T> {
    /// Wrap the error with a fixed context message.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Wrap the error with a lazily built context message.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Context {
            context: context.into(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Context {
            context: f(),
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_chains_read_outermost_first() {
        let inner: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));

        let err = inner
            .context("reading namespace.yaml")
            .context("migrating app-one")
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "migrating app-one: reading namespace.yaml: io error: denied"
        );
    }

    #[test]
    fn nothing_to_do_is_found_through_context() {
        let err: Result<()> = Err(Error::NothingToDo);
        let wrapped = err.context("running preflight").unwrap_err();

        assert!(wrapped.is_nothing_to_do());
        assert!(!Error::command_failed("boom").is_nothing_to_do());
    }
}

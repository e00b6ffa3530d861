use camino::Utf8PathBuf;

use braid_domain::{ActionFailure, ConflictError, GraphError, Label, ParseError};

/// State-directory I/O failures. Completion state is load-bearing for
/// correctness, so nothing here is recovered silently: a lost marker only
/// costs a rebuild, but a marker we invented would suppress one.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("state I/O failed for {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to persist wildcard label {0}")]
    WildcardLabel(Label),
    #[error("could not format a marker timestamp")]
    Timestamp {
        #[source]
        source: time::error::Format,
    },
    #[error("instruction record {path} has unsupported version {found} (supported: {supported})")]
    UnsupportedVersion {
        path: Utf8PathBuf,
        found: u32,
        supported: u32,
    },
    #[error("instruction record {path} is malformed")]
    Malformed {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("instructions only apply to package labels (got {0})")]
    NotAPackage(Label),
}

/// Everything a `build_label` run can fail with.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed building {label}")]
    Action {
        label: Label,
        #[source]
        source: ActionFailure,
    },
}

/// Failures while including a sub-build as a domain.
#[derive(Debug, thiserror::Error)]
pub enum IncludeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

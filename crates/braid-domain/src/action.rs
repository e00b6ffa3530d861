use std::error::Error as StdError;
use std::fmt;

use crate::env::Environment;
use crate::label::Label;

/// An action's execution failed. Wraps whatever the collaborator raised;
/// the driver adds the label context on the way up.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ActionFailure {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ActionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        ActionFailure {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        ActionFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A unit of work: bring `label` to its tagged state, given that every
/// dependency the owning rule lists has already been satisfied.
///
/// Concrete implementations (VCS fetches, make invocations, deployment
/// packing) live outside this workspace; the engine only needs this contract.
/// The composed environment is passed by value rather than installed
/// process-globally, so implementations must read configuration from `env`,
/// not from `std::env`.
pub trait Action: fmt::Debug + Send + Sync {
    fn build_label(&self, label: &Label, env: &Environment) -> Result<(), ActionFailure>;
}

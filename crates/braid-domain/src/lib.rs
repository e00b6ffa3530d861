#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod action;
pub mod env;
pub mod error;
pub mod graph;
pub mod label;
pub mod rule;

pub use action::{Action, ActionFailure};
pub use env::{EnvBuilder, EnvMode, EnvStore, EnvType, Environment};
pub use error::{ConflictError, GraphError, ParseError};
pub use graph::{needed_to_build, required_by};
pub use label::{
    tags, DomainPart, DomainPath, KindPart, Label, LabelKind, NamePart, RolePart, TagPart,
    Unification,
};
pub use rule::{Rule, RuleSet};

#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod driver;
pub mod error;
pub mod instructions;
pub mod store;

pub use driver::{BuildOptions, BuildReport, Builder};
pub use error::{BuildError, IncludeError, PersistenceError};
pub use instructions::{
    DeviceKind, Instruction, InstructionFile, InstructionStore, INSTRUCTIONS_VERSION,
};
pub use store::TagStore;

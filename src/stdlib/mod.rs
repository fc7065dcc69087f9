//! Standard library definitions

pub mod builtins;

pub use builtins::{root_class, ROOT_CLASS};

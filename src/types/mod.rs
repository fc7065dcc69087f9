//! Type definitions

pub mod type_system;

pub use type_system::{ClassChain, PrimitiveType, Type};

//! Utility module

mod diagnostics;
mod error;
mod span;

pub use diagnostics::Diagnostics;
pub use error::{Error, ErrorKind};
pub use span::Span;

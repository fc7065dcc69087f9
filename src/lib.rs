//! vsopc - semantic analyzer for the VSOP language
//!
//! Checks a parsed VSOP program: class hierarchy, member tables,
//! expression types, and the program entry point.

pub mod feedback;
pub mod frontend;
pub mod stdlib;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use feedback::FeedbackReport;
pub use frontend::ast::Program;
pub use frontend::semantic::{analyze_program, AnalyzerOptions, ClassTable, SemanticAnalyzer};
pub use utils::{Diagnostics, Error, ErrorKind, Span};

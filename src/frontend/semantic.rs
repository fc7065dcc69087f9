//! Semantic Analysis for VSOP
//!
//! Runs five passes over a parsed program, in order:
//! - class table construction
//! - hierarchy validation (undefined parents, cycles)
//! - member resolution and inheritance merge
//! - expression type checking
//! - entry point validation
//!
//! Every pass runs even after errors; problems are repaired in place so
//! later passes always see a well-formed table.

pub mod checker;
pub mod class_table;
pub mod entry;
pub mod hierarchy;
pub mod members;
pub mod scope;

use log::debug;

pub use class_table::{ClassDef, ClassId, ClassMembers, ClassTable, DeclaredType, FieldDef, FormalDef, MethodDef};

use crate::frontend::ast::Program;
use crate::utils::Diagnostics;

/// Reserved identifier naming the receiver
pub const SELF: &str = "self";

/// Analyzer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Require `Main.main(): int32`; disable when checking program fragments
    pub check_entry_point: bool,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self { check_entry_point: true }
    }
}

/// Semantic analyzer
#[derive(Debug, Clone, Default)]
pub struct SemanticAnalyzer {
    options: AnalyzerOptions,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    /// Analyze a program.
    ///
    /// The resolved class table is stored on the program; every problem
    /// found is returned in report order.
    pub fn analyze(&self, program: &mut Program) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        // Pass 1: collect classes
        let mut table = ClassTable::build(&program.classes, &mut diagnostics);

        // Pass 2: parent links and cycles
        hierarchy::validate(&mut table, &mut diagnostics);

        // Pass 3: members and inheritance
        members::resolve_all(&mut table, &mut diagnostics);

        // Pass 4: expressions
        checker::check_program(&table, &mut diagnostics);

        // Pass 5: entry point
        if self.options.check_entry_point {
            entry::check_entry_point(&table, &mut diagnostics);
        }

        debug!(
            "semantic analysis finished: {} classes, {} errors",
            table.len(),
            diagnostics.len()
        );
        program.class_table = Some(table);
        diagnostics
    }
}

/// Analyze a program with default options
pub fn analyze_program(program: &mut Program) -> Diagnostics {
    SemanticAnalyzer::new().analyze(program)
}

//! Structured Feedback Module
//!
//! Machine-readable analysis results:
//! - JSON diagnostic reports with stable codes
//! - Class table statistics

use serde::Serialize;

use crate::frontend::semantic::ClassTable;
use crate::utils::{Diagnostics, Error, ErrorKind};

// ==================== Diagnostic Report ====================

/// One diagnostic, flattened for serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    /// Stable code per error kind (e.g., "E0006")
    pub code: String,
    pub kind: ErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl DiagnosticReport {
    pub fn from_error(error: &Error) -> Self {
        let span = error.span();
        let kind = error.kind();
        Self {
            code: kind.code().to_string(),
            kind,
            message: error.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

// ==================== Analysis Feedback ====================

/// Counts over the user-declared classes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    pub class_count: usize,
    pub method_count: usize,
    pub field_count: usize,
}

impl AnalysisStats {
    pub fn from_table(table: &ClassTable) -> Self {
        table
            .iter()
            .filter(|class| !class.builtin)
            .fold(Self::default(), |mut stats, class| {
                stats.class_count += 1;
                if let Some(members) = class.resolved() {
                    stats.method_count += members.methods.len();
                    stats.field_count += members.fields.len();
                }
                stats
            })
    }
}

/// Complete analysis feedback for one input file
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReport {
    pub success: bool,
    pub source_file: String,
    pub diagnostics: Vec<DiagnosticReport>,
    pub stats: AnalysisStats,
}

impl FeedbackReport {
    pub fn new(source_file: impl Into<String>, diagnostics: &Diagnostics, table: Option<&ClassTable>) -> Self {
        Self {
            success: diagnostics.is_empty(),
            source_file: source_file.into(),
            diagnostics: diagnostics.iter().map(DiagnosticReport::from_error).collect(),
            stats: table.map(AnalysisStats::from_table).unwrap_or_default(),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as compact JSON (for programmatic use)
    pub fn to_json_compact(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{ClassDecl, Expr, FieldDecl, MethodDecl, Program};
    use crate::frontend::semantic::analyze_program;
    use crate::utils::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_from_error() {
        let error = Error::UndefinedVariable {
            name: "x".to_string(),
            span: Span::new(4, 9),
        };
        let report = DiagnosticReport::from_error(&error);
        assert_eq!(report.code, "E0007");
        assert_eq!(report.kind, ErrorKind::UnresolvedName);
        assert_eq!((report.line, report.column), (4, 9));
        assert_eq!(report.message, error.to_string());
    }

    #[test]
    fn test_feedback_json_shape() {
        let mut program = Program::new(vec![ClassDecl::new("Main")
            .field(FieldDecl::new("n", "int32"))
            .method(MethodDecl::new("main", vec![], "int32", Expr::string("oops")))]);
        let diags = analyze_program(&mut program);
        let report = FeedbackReport::new("main.json", &diags, program.class_table.as_ref());

        assert!(!report.success);
        assert_eq!(
            report.stats,
            AnalysisStats {
                class_count: 1,
                method_count: 1,
                field_count: 1,
            }
        );

        let value: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(value["source_file"], "main.json");
        assert_eq!(value["diagnostics"][0]["kind"], "type_mismatch");
        assert_eq!(value["diagnostics"][0]["code"], "E0006");
    }
}

//! Semantic diagnostics for VSOP

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::utils::Span;

/// Diagnostic category, independent of the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Redefinition,
    ReservedName,
    UnknownType,
    HierarchyError,
    OverrideMismatch,
    TypeMismatch,
    UnresolvedName,
    EntryPointError,
}

impl ErrorKind {
    /// Stable code used in structured feedback
    pub fn code(&self) -> &'static str {
        match self {
            Self::Redefinition => "E0001",
            Self::ReservedName => "E0002",
            Self::UnknownType => "E0003",
            Self::HierarchyError => "E0004",
            Self::OverrideMismatch => "E0005",
            Self::TypeMismatch => "E0006",
            Self::UnresolvedName => "E0007",
            Self::EntryPointError => "E0008",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Redefinition => "redefinition",
            Self::ReservedName => "reserved name",
            Self::UnknownType => "unknown type",
            Self::HierarchyError => "hierarchy error",
            Self::OverrideMismatch => "override mismatch",
            Self::TypeMismatch => "type mismatch",
            Self::UnresolvedName => "unresolved name",
            Self::EntryPointError => "entry point error",
        };
        f.write_str(name)
    }
}

/// Semantic error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ==================== Redefinition ====================

    #[error("class {name} is already defined")]
    ClassRedefinition { name: String, span: Span },

    #[error("redefinition of field {name} in class {class}, first defined at {first}")]
    FieldRedefinition {
        name: String,
        class: String,
        first: Span,
        span: Span,
    },

    #[error("field {name} of class {class} is already defined in an ancestor class")]
    InheritedFieldRedefinition { name: String, class: String, span: Span },

    #[error("method {name} is defined multiple times in class {class}")]
    MethodRedefinition { name: String, class: String, span: Span },

    #[error("formal {name} is used multiple times in method {method}")]
    FormalRedefinition { name: String, method: String, span: Span },

    // ==================== Reserved names ====================

    #[error("a {what} named self is forbidden")]
    ReservedName { what: String, span: Span },

    #[error("cannot assign to self")]
    AssignToSelf { span: Span },

    #[error("self cannot be used in a field initializer")]
    SelfInInitializer { span: Span },

    // ==================== Unknown types ====================

    #[error("{context} has type {name}, which does not exist")]
    UnknownType {
        name: String,
        context: String,
        span: Span,
    },

    #[error("cannot instantiate undefined class {name}")]
    UndefinedClass { name: String, span: Span },

    // ==================== Hierarchy ====================

    #[error("parent class {parent} of class {class} is not defined")]
    UndefinedParent {
        class: String,
        parent: String,
        span: Span,
    },

    #[error("class {class} cannot extend {parent}: inheritance cycle")]
    InheritanceCycle {
        class: String,
        parent: String,
        span: Span,
    },

    // ==================== Overrides ====================

    #[error("override of method {method} in class {class} has {got} formal(s), expected {expected}")]
    OverrideArity {
        method: String,
        class: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("override of method {method} in class {class}: formal {position} has type {got}, expected {expected}")]
    OverrideFormalType {
        method: String,
        class: String,
        position: usize,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("override of method {method} in class {class} returns {got}, expected {expected}")]
    OverrideReturnType {
        method: String,
        class: String,
        expected: String,
        got: String,
        span: Span,
    },

    // ==================== Type mismatches ====================

    #[error("integer literal {value} does not fit in int32")]
    IntegerOutOfRange { value: String, span: Span },

    #[error("operator {op} expects {expected} operand(s), got {got}")]
    InvalidOperand {
        op: String,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("cannot compare {left} with {right}")]
    IncomparableTypes { left: String, right: String, span: Span },

    #[error("cannot assign a value of type {got} to {name} of type {expected}")]
    AssignMismatch {
        name: String,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("condition of {construct} must be bool, got {got}")]
    ConditionNotBool {
        construct: String,
        got: String,
        span: Span,
    },

    #[error("branches of if have incompatible types {then_ty} and {else_ty}")]
    BranchMismatch {
        then_ty: String,
        else_ty: String,
        span: Span,
    },

    #[error("method {method} expects {expected} argument(s), got {got}")]
    ArgCountMismatch {
        method: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("argument {position} of method {method} has type {got}, expected {expected}")]
    ArgumentMismatch {
        method: String,
        position: usize,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("cannot call method {method} on a value of type {ty}")]
    DispatchOnPrimitive { method: String, ty: String, span: Span },

    #[error("initializer of {name} has type {got}, expected {expected}")]
    InitializerMismatch {
        name: String,
        expected: String,
        got: String,
        span: Span,
    },

    #[error("body of method {method} has type {got}, expected {expected}")]
    ReturnMismatch {
        method: String,
        expected: String,
        got: String,
        span: Span,
    },

    // ==================== Unresolved names ====================

    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String, span: Span },

    #[error("class {class} has no method {method}")]
    UndefinedMethod {
        method: String,
        class: String,
        span: Span,
    },

    // ==================== Entry point ====================

    #[error("class {class} is missing")]
    MissingEntryClass { class: String, span: Span },

    #[error("method {method} in class {class} is missing")]
    MissingEntryMethod {
        class: String,
        method: String,
        span: Span,
    },

    #[error("method {method} should not have formals, found {count}")]
    EntryMethodFormals {
        method: String,
        count: usize,
        span: Span,
    },

    #[error("method {method} should return int32, found {got}")]
    EntryMethodReturn {
        method: String,
        got: String,
        span: Span,
    },
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::ClassRedefinition { span, .. }
            | Self::FieldRedefinition { span, .. }
            | Self::InheritedFieldRedefinition { span, .. }
            | Self::MethodRedefinition { span, .. }
            | Self::FormalRedefinition { span, .. }
            | Self::ReservedName { span, .. }
            | Self::AssignToSelf { span }
            | Self::SelfInInitializer { span }
            | Self::UnknownType { span, .. }
            | Self::UndefinedClass { span, .. }
            | Self::UndefinedParent { span, .. }
            | Self::InheritanceCycle { span, .. }
            | Self::OverrideArity { span, .. }
            | Self::OverrideFormalType { span, .. }
            | Self::OverrideReturnType { span, .. }
            | Self::IntegerOutOfRange { span, .. }
            | Self::InvalidOperand { span, .. }
            | Self::IncomparableTypes { span, .. }
            | Self::AssignMismatch { span, .. }
            | Self::ConditionNotBool { span, .. }
            | Self::BranchMismatch { span, .. }
            | Self::ArgCountMismatch { span, .. }
            | Self::ArgumentMismatch { span, .. }
            | Self::DispatchOnPrimitive { span, .. }
            | Self::InitializerMismatch { span, .. }
            | Self::ReturnMismatch { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::UndefinedMethod { span, .. }
            | Self::MissingEntryClass { span, .. }
            | Self::MissingEntryMethod { span, .. }
            | Self::EntryMethodFormals { span, .. }
            | Self::EntryMethodReturn { span, .. } => *span,
        }
    }

    /// Taxonomy bucket of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClassRedefinition { .. }
            | Self::FieldRedefinition { .. }
            | Self::InheritedFieldRedefinition { .. }
            | Self::MethodRedefinition { .. }
            | Self::FormalRedefinition { .. } => ErrorKind::Redefinition,

            Self::ReservedName { .. } | Self::AssignToSelf { .. } | Self::SelfInInitializer { .. } => {
                ErrorKind::ReservedName
            }

            Self::UnknownType { .. } | Self::UndefinedClass { .. } => ErrorKind::UnknownType,

            Self::UndefinedParent { .. } | Self::InheritanceCycle { .. } => ErrorKind::HierarchyError,

            Self::OverrideArity { .. }
            | Self::OverrideFormalType { .. }
            | Self::OverrideReturnType { .. } => ErrorKind::OverrideMismatch,

            Self::IntegerOutOfRange { .. }
            | Self::InvalidOperand { .. }
            | Self::IncomparableTypes { .. }
            | Self::AssignMismatch { .. }
            | Self::ConditionNotBool { .. }
            | Self::BranchMismatch { .. }
            | Self::ArgCountMismatch { .. }
            | Self::ArgumentMismatch { .. }
            | Self::DispatchOnPrimitive { .. }
            | Self::InitializerMismatch { .. }
            | Self::ReturnMismatch { .. } => ErrorKind::TypeMismatch,

            Self::UndefinedVariable { .. } | Self::UndefinedMethod { .. } => ErrorKind::UnresolvedName,

            Self::MissingEntryClass { .. }
            | Self::MissingEntryMethod { .. }
            | Self::EntryMethodFormals { .. }
            | Self::EntryMethodReturn { .. } => ErrorKind::EntryPointError,
        }
    }

    /// Render as `line:column: semantic error: message`
    pub fn render(&self) -> String {
        format!("{}: semantic error: {}", self.span(), self)
    }
}

//! Program entry point validation

use log::debug;

use super::class_table::ClassTable;
use crate::types::Type;
use crate::utils::{Diagnostics, Error, Span};

pub const ENTRY_CLASS: &str = "Main";
pub const ENTRY_METHOD: &str = "main";

/// Require `Main.main(): int32` with no formals, own or inherited
pub fn check_entry_point(table: &ClassTable, diagnostics: &mut Diagnostics) {
    let Some(class) = table.by_name(ENTRY_CLASS) else {
        diagnostics.report(Error::MissingEntryClass {
            class: ENTRY_CLASS.to_string(),
            span: Span::new(1, 1),
        });
        return;
    };

    let Some(method) = table.find_method(class.id, ENTRY_METHOD) else {
        diagnostics.report(Error::MissingEntryMethod {
            class: ENTRY_CLASS.to_string(),
            method: ENTRY_METHOD.to_string(),
            span: class.span,
        });
        return;
    };

    if !method.formals.is_empty() {
        diagnostics.report(Error::EntryMethodFormals {
            method: ENTRY_METHOD.to_string(),
            count: method.formals.len(),
            span: method.span,
        });
    }

    let ret = table.type_of(&method.ret_type);
    if ret != Type::INT32 && !ret.is_error() {
        diagnostics.report(Error::EntryMethodReturn {
            method: ENTRY_METHOD.to_string(),
            got: ret.to_string(),
            span: method.span,
        });
    }
    debug!("entry point checked");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{ClassDecl, Expr, Formal, MethodDecl};
    use crate::frontend::semantic::{hierarchy, members};
    use crate::utils::ErrorKind;
    use pretty_assertions::assert_eq;

    fn entry_errors(decls: Vec<ClassDecl>) -> Vec<Error> {
        let mut diags = Diagnostics::new();
        let mut table = ClassTable::build(&decls, &mut diags);
        hierarchy::validate(&mut table, &mut diags);
        members::resolve_all(&mut table, &mut diags);
        let before = diags.len();
        check_entry_point(&table, &mut diags);
        diags.into_vec().split_off(before)
    }

    fn main_method(formals: Vec<Formal>, ret: &str) -> MethodDecl {
        MethodDecl::new(ENTRY_METHOD, formals, ret, Expr::int(0))
    }

    #[test]
    fn test_valid_entry_point() {
        let errors = entry_errors(vec![ClassDecl::new("Main").method(main_method(vec![], "int32"))]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_inherited_entry_method() {
        let errors = entry_errors(vec![
            ClassDecl::new("Base").method(main_method(vec![], "int32")),
            ClassDecl::new("Main").extends("Base"),
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_missing_class() {
        let errors = entry_errors(vec![ClassDecl::new("Other")]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::MissingEntryClass { .. }));
        assert_eq!(errors[0].span(), Span::new(1, 1));
        assert_eq!(errors[0].kind(), ErrorKind::EntryPointError);
    }

    #[test]
    fn test_missing_method() {
        let errors = entry_errors(vec![ClassDecl::new("Main").at(3, 1)]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::MissingEntryMethod { .. }));
        assert_eq!(errors[0].span(), Span::new(3, 1));
    }

    #[test]
    fn test_wrong_signature_reports_each_problem() {
        let errors = entry_errors(vec![
            ClassDecl::new("Main").method(main_method(vec![Formal::new("argc", "int32")], "bool"))
        ]);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], Error::EntryMethodFormals { count: 1, .. }));
        assert!(matches!(errors[1], Error::EntryMethodReturn { .. }));
    }
}

//! Member resolution
//!
//! Validates each class's own fields and methods, then merges them with the
//! parent's resolved tables. Resolution recurses into the parent first and is
//! memoized per class, so a shared ancestor is resolved exactly once.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, trace};

use super::class_table::{
    ClassId, ClassMembers, ClassTable, DeclaredType, FieldDef, FormalDef, MethodDef, OwnMembers,
    Resolution,
};
use crate::frontend::ast::{Ident, MethodDecl};
use crate::frontend::semantic::SELF;
use crate::types::ClassChain;
use crate::utils::{Diagnostics, Error};

/// Resolve the member tables of every class
pub fn resolve_all(table: &mut ClassTable, diagnostics: &mut Diagnostics) {
    let ids: Vec<ClassId> = table.ids().collect();
    for id in ids {
        resolve_class(table, id, diagnostics);
    }
    debug!("member tables resolved for {} classes", table.len());
}

/// Resolve one class, resolving its ancestors first. Idempotent.
pub fn resolve_class(table: &mut ClassTable, id: ClassId, diagnostics: &mut Diagnostics) {
    match table.get(id).members {
        Resolution::Resolved(_) => return,
        Resolution::Resolving => {
            // Only reachable through a parent cycle, which the hierarchy
            // validator has already broken.
            trace!("re-entered {} while resolving", table.get(id).name);
            return;
        }
        Resolution::Unresolved => {}
    }
    table.get_mut(id).members = Resolution::Resolving;
    trace!("resolving members of {}", table.get(id).name);

    if table.get(id).own.is_none() {
        let own = validate_own(table, id, diagnostics);
        table.get_mut(id).own = Some(own);
    }

    let parent = table.get(id).parent;
    if let Some(parent) = parent {
        resolve_class(table, parent, diagnostics);
    }

    let members = merge(table, id, parent, diagnostics);
    table.get_mut(id).members = Resolution::Resolved(Box::new(members));
}

/// Own-member validation: reserved names, duplicates, and declared types
fn validate_own(table: &ClassTable, id: ClassId, diagnostics: &mut Diagnostics) -> OwnMembers {
    let class = table.get(id);
    let mut own = OwnMembers::default();

    for decl in &class.decl_fields {
        let name = &decl.name.name;
        if name == SELF {
            diagnostics.report(Error::ReservedName {
                what: "field".to_string(),
                span: decl.name.span,
            });
            continue;
        }
        if let Some(first) = own.fields.get(name) {
            diagnostics.report(Error::FieldRedefinition {
                name: name.clone(),
                class: class.name.clone(),
                first: first.span,
                span: decl.name.span,
            });
            continue;
        }

        let ty = resolve_declared(table, &decl.ty, || format!("field {}", name), diagnostics);
        own.fields.insert(
            name.clone(),
            Rc::new(FieldDef {
                name: name.clone(),
                ty,
                init: decl.init.clone(),
                owner: id,
                span: decl.span,
            }),
        );
    }

    for decl in &class.decl_methods {
        let name = &decl.name.name;
        if own.methods.contains_key(name) {
            diagnostics.report(Error::MethodRedefinition {
                name: name.clone(),
                class: class.name.clone(),
                span: decl.name.span,
            });
            continue;
        }
        let method = validate_method(table, id, decl, diagnostics);
        own.methods.insert(name.clone(), Rc::new(method));
    }

    own
}

fn validate_method(
    table: &ClassTable,
    owner: ClassId,
    decl: &MethodDecl,
    diagnostics: &mut Diagnostics,
) -> MethodDef {
    let method_name = &decl.name.name;
    let mut seen = HashSet::new();
    let mut formals = Vec::with_capacity(decl.formals.len());

    for formal in &decl.formals {
        let name = &formal.name.name;
        let bound = if name == SELF {
            diagnostics.report(Error::ReservedName {
                what: "formal".to_string(),
                span: formal.name.span,
            });
            false
        } else if !seen.insert(name.as_str()) {
            diagnostics.report(Error::FormalRedefinition {
                name: name.clone(),
                method: method_name.clone(),
                span: formal.name.span,
            });
            false
        } else {
            true
        };

        let ty = resolve_declared(
            table,
            &formal.ty,
            || format!("formal {} of method {}", name, method_name),
            diagnostics,
        );
        formals.push(FormalDef {
            name: name.clone(),
            ty,
            span: formal.span,
            bound,
        });
    }

    let ret_type = resolve_declared(
        table,
        &decl.ret_type,
        || format!("return type of method {}", method_name),
        diagnostics,
    );

    MethodDef {
        name: method_name.clone(),
        formals,
        ret_type,
        body: decl.body.clone(),
        owner,
        span: decl.span,
    }
}

/// Resolve a declared type name, reporting unknown names
fn resolve_declared(
    table: &ClassTable,
    ty: &Ident,
    context: impl FnOnce() -> String,
    diagnostics: &mut Diagnostics,
) -> DeclaredType {
    match table.declared_type(&ty.name) {
        Some(declared) => declared,
        None => {
            diagnostics.report(Error::UnknownType {
                name: ty.name.clone(),
                context: context(),
                span: ty.span,
            });
            DeclaredType::Unknown(ty.name.clone())
        }
    }
}

/// Inheritance merge of a class's own members with its parent's tables
fn merge(
    table: &ClassTable,
    id: ClassId,
    parent: Option<ClassId>,
    diagnostics: &mut Diagnostics,
) -> ClassMembers {
    let class = table.get(id);
    let own = class.own.clone().unwrap_or_default();

    let parent_members = parent.and_then(|p| table.get(p).resolved());
    debug_assert!(
        parent.is_none() || parent_members.is_some(),
        "parent of {} must be resolved first",
        class.name
    );
    let (inherited_fields, inherited_methods, ancestors) = match parent_members {
        Some(pm) => {
            let mut fields = pm.inherited_fields.clone();
            fields.extend(pm.fields.iter().map(|(k, v)| (k.clone(), Rc::clone(v))));
            let mut methods = pm.inherited_methods.clone();
            methods.extend(pm.methods.iter().map(|(k, v)| (k.clone(), Rc::clone(v))));
            (fields, methods, pm.ancestors.child(&class.name))
        }
        None => (IndexMap::new(), IndexMap::new(), ClassChain::root(&class.name)),
    };

    let mut fields = IndexMap::with_capacity(own.fields.len());
    for (name, field) in own.fields {
        if inherited_fields.contains_key(&name) {
            diagnostics.report(Error::InheritedFieldRedefinition {
                name: name.clone(),
                class: class.name.clone(),
                span: field.span,
            });
            continue;
        }
        fields.insert(name, field);
    }

    let mut methods = IndexMap::with_capacity(own.methods.len());
    for (name, method) in own.methods {
        if let Some(inherited) = inherited_methods.get(&name) {
            if let Some(error) = override_mismatch(&class.name, inherited, &method) {
                diagnostics.report(error);
                continue;
            }
        }
        methods.insert(name, method);
    }

    ClassMembers {
        fields,
        methods,
        inherited_fields,
        inherited_methods,
        ancestors,
    }
}

/// Check that `method` overrides `inherited` with the identical signature
fn override_mismatch(class: &str, inherited: &MethodDef, method: &MethodDef) -> Option<Error> {
    if inherited.formals.len() != method.formals.len() {
        return Some(Error::OverrideArity {
            method: method.name.clone(),
            class: class.to_string(),
            expected: inherited.formals.len(),
            got: method.formals.len(),
            span: method.span,
        });
    }

    let formal_mismatch = inherited
        .formals
        .iter()
        .zip(&method.formals)
        .position(|(expected, got)| expected.ty.name() != got.ty.name());
    if let Some(index) = formal_mismatch {
        return Some(Error::OverrideFormalType {
            method: method.name.clone(),
            class: class.to_string(),
            position: index + 1,
            expected: inherited.formals[index].ty.name().to_string(),
            got: method.formals[index].ty.name().to_string(),
            span: method.formals[index].span,
        });
    }

    if inherited.ret_type.name() != method.ret_type.name() {
        return Some(Error::OverrideReturnType {
            method: method.name.clone(),
            class: class.to_string(),
            expected: inherited.ret_type.name().to_string(),
            got: method.ret_type.name().to_string(),
            span: method.span,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{ClassDecl, Expr, FieldDecl, Formal, MethodDecl};
    use crate::frontend::semantic::hierarchy;
    use crate::utils::ErrorKind;
    use pretty_assertions::assert_eq;

    fn resolved(decls: Vec<ClassDecl>) -> (ClassTable, Diagnostics) {
        let mut diags = Diagnostics::new();
        let mut table = ClassTable::build(&decls, &mut diags);
        hierarchy::validate(&mut table, &mut diags);
        resolve_all(&mut table, &mut diags);
        (table, diags)
    }

    fn members<'a>(table: &'a ClassTable, name: &str) -> &'a ClassMembers {
        table.by_name(name).and_then(|c| c.resolved()).unwrap()
    }

    fn unit_method(name: &str, formals: Vec<Formal>, ret: &str) -> MethodDecl {
        MethodDecl::new(name, formals, ret, Expr::unit())
    }

    #[test]
    fn test_ancestor_chain_and_inheritance() {
        let (table, diags) = resolved(vec![
            ClassDecl::new("B").extends("A").field(FieldDecl::new("y", "bool")),
            ClassDecl::new("A")
                .field(FieldDecl::new("x", "int32"))
                .method(unit_method("m", vec![], "unit")),
        ]);
        assert!(diags.is_empty(), "{:?}", diags);

        let b = members(&table, "B");
        assert_eq!(b.ancestors.names(), &["Object".to_string(), "A".to_string(), "B".to_string()]);
        assert!(b.fields.contains_key("y"));
        assert!(b.inherited_fields.contains_key("x"));
        assert!(b.inherited_methods.contains_key("m"));
        assert!(b.inherited_methods.contains_key("print"));
        assert_eq!(members(&table, "Object").ancestors.names(), &["Object".to_string()]);
    }

    #[test]
    fn test_field_rules() {
        let (table, diags) = resolved(vec![
            ClassDecl::new("A").field(FieldDecl::new("x", "int32")),
            ClassDecl::new("B")
                .extends("A")
                .field(FieldDecl::new("self", "int32"))
                .field(FieldDecl::new("x", "bool"))
                .field(FieldDecl::new("z", "int32"))
                .field(FieldDecl::new("z", "string"))
                .field(FieldDecl::new("w", "Nowhere")),
        ]);
        assert_eq!(diags.count_kind(ErrorKind::ReservedName), 1);
        assert_eq!(diags.count_kind(ErrorKind::Redefinition), 2);
        assert_eq!(diags.count_kind(ErrorKind::UnknownType), 1);

        let b = members(&table, "B");
        let own: Vec<_> = b.fields.keys().cloned().collect();
        assert_eq!(own, vec!["z".to_string(), "w".to_string()]);
        assert_eq!(b.fields["z"].ty.name(), "int32");
        assert_eq!(b.fields["w"].ty, DeclaredType::Unknown("Nowhere".to_string()));
        // The parent's field stays visible.
        assert_eq!(b.inherited_fields["x"].ty.name(), "int32");
    }

    #[test]
    fn test_method_and_formal_rules() {
        let (table, diags) = resolved(vec![ClassDecl::new("A")
            .method(unit_method("m", vec![Formal::new("a", "int32"), Formal::new("a", "bool")], "unit"))
            .method(unit_method("m", vec![], "unit"))
            .method(unit_method("n", vec![Formal::new("self", "int32")], "Ghost"))]);

        assert_eq!(diags.count_kind(ErrorKind::Redefinition), 2);
        assert_eq!(diags.count_kind(ErrorKind::ReservedName), 1);
        assert_eq!(diags.count_kind(ErrorKind::UnknownType), 1);

        let a = members(&table, "A");
        let m = &a.methods["m"];
        assert_eq!(m.formals.len(), 2);
        assert!(m.formals[0].bound);
        assert!(!m.formals[1].bound);
        assert!(!a.methods["n"].formals[0].bound);
    }

    #[test]
    fn test_compatible_override_replaces_parent_method() {
        let (table, diags) = resolved(vec![
            ClassDecl::new("A").method(unit_method("m", vec![Formal::new("x", "int32")], "bool")),
            ClassDecl::new("B").extends("A").method(unit_method("m", vec![Formal::new("y", "int32")], "bool")),
            ClassDecl::new("C").extends("B"),
        ]);
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(table.get(members(&table, "C").method("m").unwrap().owner).name, "B");
    }

    #[test]
    fn test_incompatible_overrides() {
        let (table, diags) = resolved(vec![
            ClassDecl::new("A")
                .method(unit_method("arity", vec![Formal::new("x", "int32")], "unit"))
                .method(unit_method("formal", vec![Formal::new("x", "int32")], "unit"))
                .method(unit_method("ret", vec![], "int32")),
            ClassDecl::new("B")
                .extends("A")
                .method(unit_method("arity", vec![], "unit"))
                .method(unit_method("formal", vec![Formal::new("x", "bool")], "unit"))
                .method(unit_method("ret", vec![], "bool")),
            ClassDecl::new("C").extends("B"),
        ]);
        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count_kind(ErrorKind::OverrideMismatch), 3);

        let b = members(&table, "B");
        assert!(b.methods.is_empty());
        let c = members(&table, "C");
        for name in ["arity", "formal", "ret"] {
            assert_eq!(table.get(c.method(name).unwrap().owner).name, "A");
        }
    }

    #[test]
    fn test_override_of_builtin() {
        let (_, diags) = resolved(vec![ClassDecl::new("A").method(unit_method(
            "print",
            vec![Formal::new("s", "string")],
            "Object",
        ))]);
        assert!(diags.is_empty());

        let (_, diags) = resolved(vec![ClassDecl::new("A").method(unit_method("inputInt32", vec![], "bool"))]);
        assert_eq!(diags.count_kind(ErrorKind::OverrideMismatch), 1);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let (mut table, mut diags) = resolved(vec![
            ClassDecl::new("A").field(FieldDecl::new("x", "int32")),
            ClassDecl::new("B").extends("A").field(FieldDecl::new("x", "int32")),
            ClassDecl::new("C").extends("A").field(FieldDecl::new("x", "int32")),
        ]);
        assert_eq!(diags.len(), 2);

        let before = members(&table, "B").ancestors.clone();
        resolve_all(&mut table, &mut diags);
        let id = table.lookup("C").unwrap();
        resolve_class(&mut table, id, &mut diags);
        assert_eq!(diags.len(), 2);
        assert_eq!(members(&table, "B").ancestors, before);
    }

    #[test]
    fn test_cycle_members_resolve_as_root_children() {
        let (table, diags) = resolved(vec![
            ClassDecl::new("A").extends("B").field(FieldDecl::new("a", "int32")),
            ClassDecl::new("B").extends("A").field(FieldDecl::new("b", "int32")),
        ]);
        assert_eq!(diags.count_kind(ErrorKind::HierarchyError), 1);
        assert_eq!(members(&table, "A").ancestors.names(), &["Object".to_string(), "A".to_string()]);
        assert_eq!(members(&table, "B").ancestors.names(), &["Object".to_string(), "B".to_string()]);
        assert!(members(&table, "B").all_fields().all(|f| f.name != "a"));
    }
}

//! Inheritance hierarchy validation
//!
//! Rebinds undefined parents to the root class and breaks cycles so that
//! every parent chain reaches the root afterwards.

use log::{debug, trace};

use super::class_table::{ClassId, ClassTable, HierarchyState};
use crate::utils::{Diagnostics, Error};

/// Link every class to its parent, then check every chain for cycles
pub fn validate(table: &mut ClassTable, diagnostics: &mut Diagnostics) {
    link_parents(table, diagnostics);

    let ids: Vec<ClassId> = table.ids().collect();
    for id in ids {
        check_cycles(table, id, diagnostics);
    }
    debug!("hierarchy validated for {} classes", table.len());
}

fn link_parents(table: &mut ClassTable, diagnostics: &mut Diagnostics) {
    let ids: Vec<ClassId> = table.ids().collect();
    for id in ids {
        let class = table.get(id);
        let Some(parent_name) = class.parent_name.clone() else {
            continue;
        };

        let parent = match table.lookup(&parent_name.name) {
            Some(parent) => parent,
            None => {
                let span = if parent_name.span.is_dummy() { class.span } else { parent_name.span };
                diagnostics.report(Error::UndefinedParent {
                    class: class.name.clone(),
                    parent: parent_name.name.clone(),
                    span,
                });
                ClassId::ROOT
            }
        };
        table.get_mut(id).parent = Some(parent);
    }
}

/// Walk the parent chain of `start`.
///
/// Stops at the root or at a class already known to be clean. A class seen
/// twice in the same walk closes a cycle: the cycle is reported once and
/// each of its members is rebound to the root.
fn check_cycles(table: &mut ClassTable, start: ClassId, diagnostics: &mut Diagnostics) {
    if table.get(start).hierarchy == HierarchyState::Clean {
        return;
    }

    let mut path = vec![start];
    let mut current = start;
    while let Some(parent) = table.get(current).parent {
        if table.get(parent).hierarchy == HierarchyState::Clean {
            break;
        }
        if let Some(pos) = path.iter().position(|&id| id == parent) {
            let cycle = path[pos..].to_vec();
            let culprit = table.get(parent);
            diagnostics.report(Error::InheritanceCycle {
                class: culprit.name.clone(),
                parent: culprit
                    .parent_name
                    .as_ref()
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                span: culprit.span,
            });
            for id in cycle {
                trace!("rebinding {} to the root class", table.get(id).name);
                table.get_mut(id).parent = Some(ClassId::ROOT);
            }
            break;
        }
        path.push(parent);
        current = parent;
    }

    for id in path {
        table.get_mut(id).hierarchy = HierarchyState::Clean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::ClassDecl;
    use crate::utils::ErrorKind;

    fn validated(decls: Vec<ClassDecl>) -> (ClassTable, Diagnostics) {
        let mut diags = Diagnostics::new();
        let mut table = ClassTable::build(&decls, &mut diags);
        validate(&mut table, &mut diags);
        (table, diags)
    }

    fn parent_of<'a>(table: &'a ClassTable, name: &str) -> &'a str {
        let class = table.by_name(name).unwrap();
        &table.get(class.parent.unwrap()).name
    }

    #[test]
    fn test_valid_chain() {
        let (table, diags) = validated(vec![
            ClassDecl::new("C").extends("B"),
            ClassDecl::new("B").extends("A"),
            ClassDecl::new("A"),
        ]);
        assert!(diags.is_empty());
        assert_eq!(parent_of(&table, "C"), "B");
        assert_eq!(parent_of(&table, "B"), "A");
        assert_eq!(parent_of(&table, "A"), "Object");
        assert!(table.iter().all(|c| c.hierarchy == HierarchyState::Clean));
    }

    #[test]
    fn test_undefined_parent_rebinds_to_root() {
        let (table, diags) = validated(vec![ClassDecl::new("A").extends("Ghost")]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.count_kind(ErrorKind::HierarchyError), 1);
        assert_eq!(parent_of(&table, "A"), "Object");
    }

    #[test]
    fn test_two_class_cycle_reported_once() {
        let (table, diags) = validated(vec![
            ClassDecl::new("A").extends("B"),
            ClassDecl::new("B").extends("A"),
        ]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.count_kind(ErrorKind::HierarchyError), 1);
        assert_eq!(parent_of(&table, "A"), "Object");
        assert_eq!(parent_of(&table, "B"), "Object");
    }

    #[test]
    fn test_self_cycle() {
        let (table, diags) = validated(vec![ClassDecl::new("A").extends("A")]);
        assert_eq!(diags.count_kind(ErrorKind::HierarchyError), 1);
        assert_eq!(parent_of(&table, "A"), "Object");
    }

    #[test]
    fn test_tail_into_cycle_keeps_its_link() {
        let (table, diags) = validated(vec![
            ClassDecl::new("C").extends("A"),
            ClassDecl::new("A").extends("B"),
            ClassDecl::new("B").extends("A"),
        ]);
        assert_eq!(diags.count_kind(ErrorKind::HierarchyError), 1);
        assert_eq!(parent_of(&table, "C"), "A");
        assert_eq!(parent_of(&table, "A"), "Object");
        assert_eq!(parent_of(&table, "B"), "Object");
    }
}

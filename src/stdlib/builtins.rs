//! Built-in root class
//!
//! Every program implicitly contains the root class `Object` with a fixed
//! set of I/O methods. The printing methods return `Object` so that calls
//! can be chained.

use crate::frontend::ast::{ClassDecl, Expr, Formal, MethodDecl};

/// Name of the class at the top of every hierarchy
pub const ROOT_CLASS: &str = "Object";

/// Built-in method signature
#[derive(Debug, Clone, Copy)]
pub struct BuiltinMethod {
    pub name: &'static str,
    /// (formal name, type name)
    pub formals: &'static [(&'static str, &'static str)],
    pub ret_type: &'static str,
}

/// Methods of the root class
pub const ROOT_METHODS: &[BuiltinMethod] = &[
    // Output
    BuiltinMethod { name: "print", formals: &[("s", "string")], ret_type: ROOT_CLASS },
    BuiltinMethod { name: "printBool", formals: &[("b", "bool")], ret_type: ROOT_CLASS },
    BuiltinMethod { name: "printInt32", formals: &[("i", "int32")], ret_type: ROOT_CLASS },
    // Input
    BuiltinMethod { name: "inputLine", formals: &[], ret_type: "string" },
    BuiltinMethod { name: "inputBool", formals: &[], ret_type: "bool" },
    BuiltinMethod { name: "inputInt32", formals: &[], ret_type: "int32" },
];

/// Synthesize the root class declaration.
///
/// Builtin bodies are empty blocks; they are never type-checked.
pub fn root_class() -> ClassDecl {
    ROOT_METHODS.iter().fold(ClassDecl::new(ROOT_CLASS), |class, builtin| {
        let formals = builtin
            .formals
            .iter()
            .map(|(name, ty)| Formal::new(*name, *ty))
            .collect();
        class.method(MethodDecl::new(builtin.name, formals, builtin.ret_type, Expr::block(Vec::new())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_class_shape() {
        let root = root_class();
        assert_eq!(root.name.name, ROOT_CLASS);
        assert!(root.parent.is_none());
        assert!(root.fields.is_empty());
        assert_eq!(root.methods.len(), 6);

        let print = root.methods.iter().find(|m| m.name.name == "printInt32").unwrap();
        assert_eq!(print.formals.len(), 1);
        assert_eq!(print.formals[0].ty.name, "int32");
        assert_eq!(print.ret_type.name, ROOT_CLASS);

        let input = root.methods.iter().find(|m| m.name.name == "inputLine").unwrap();
        assert!(input.formals.is_empty());
        assert_eq!(input.ret_type.name, "string");
    }
}

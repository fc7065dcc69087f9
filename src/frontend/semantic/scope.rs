//! Identifier scope for type checking: locals, then formals, then fields

use std::collections::HashMap;

use crate::types::Type;

/// Layered lookup used while checking one field initializer or method body
#[derive(Debug)]
pub struct Scope<'a> {
    /// `let` bindings, innermost last
    locals: Vec<(String, Type)>,
    formals: HashMap<String, Type>,
    fields: Option<&'a HashMap<String, Type>>,
    /// Type of `self`; absent in field initializers
    self_type: Option<Type>,
}

impl<'a> Scope<'a> {
    /// Scope of a field initializer: nothing is visible
    pub fn empty() -> Self {
        Self {
            locals: Vec::new(),
            formals: HashMap::new(),
            fields: None,
            self_type: None,
        }
    }

    /// Scope of a method body
    pub fn method(formals: HashMap<String, Type>, fields: &'a HashMap<String, Type>, self_type: Type) -> Self {
        Self {
            locals: Vec::new(),
            formals,
            fields: Some(fields),
            self_type: Some(self_type),
        }
    }

    pub fn self_type(&self) -> Option<&Type> {
        self.self_type.as_ref()
    }

    /// Resolve a name: innermost local, then formal, then field
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, ty)| ty)
            .or_else(|| self.formals.get(name))
            .or_else(|| self.fields.and_then(|fields| fields.get(name)))
    }

    /// Bind a local for the extent of a `let` body
    pub fn push_local(&mut self, name: String, ty: Type) {
        self.locals.push((name, ty));
    }

    /// Drop the innermost local, uncovering any binding it shadowed
    pub fn pop_local(&mut self) {
        self.locals.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_order() {
        let fields: HashMap<String, Type> = [("x".to_string(), Type::STRING), ("f".to_string(), Type::UNIT)]
            .into_iter()
            .collect();
        let formals: HashMap<String, Type> = [("x".to_string(), Type::BOOL)].into_iter().collect();
        let mut scope = Scope::method(formals, &fields, Type::Error);

        assert_eq!(scope.lookup("x"), Some(&Type::BOOL));
        assert_eq!(scope.lookup("f"), Some(&Type::UNIT));

        scope.push_local("x".to_string(), Type::INT32);
        assert_eq!(scope.lookup("x"), Some(&Type::INT32));
        scope.push_local("x".to_string(), Type::UNIT);
        assert_eq!(scope.lookup("x"), Some(&Type::UNIT));
        scope.pop_local();
        assert_eq!(scope.lookup("x"), Some(&Type::INT32));
        scope.pop_local();
        assert_eq!(scope.lookup("x"), Some(&Type::BOOL));
        scope.pop_local();
        assert_eq!(scope.lookup("x"), Some(&Type::BOOL));
    }

    #[test]
    fn test_empty_scope_sees_nothing() {
        let scope = Scope::empty();
        assert!(scope.lookup("x").is_none());
        assert!(scope.self_type().is_none());
    }
}

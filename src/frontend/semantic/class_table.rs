//! Global class table
//!
//! Classes live in an arena indexed by `ClassId`; parent links and member
//! owners are ids into that arena. The root class always has id 0.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::frontend::ast::{ClassDecl, Expr, FieldDecl, Ident, MethodDecl};
use crate::stdlib::{root_class, ROOT_CLASS};
use crate::types::{ClassChain, PrimitiveType, Type};
use crate::utils::{Diagnostics, Error, Span};

/// Index of a class in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

impl ClassId {
    pub const ROOT: ClassId = ClassId(0);
}

/// Type written in a declaration, after name resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Primitive(PrimitiveType),
    Class(String),
    /// Names nothing; already reported
    Unknown(String),
}

impl DeclaredType {
    pub fn name(&self) -> &str {
        match self {
            DeclaredType::Primitive(p) => p.name(),
            DeclaredType::Class(name) | DeclaredType::Unknown(name) => name,
        }
    }
}

/// Resolved field
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: DeclaredType,
    pub init: Option<Expr>,
    pub owner: ClassId,
    pub span: Span,
}

/// Resolved formal parameter
#[derive(Debug, Clone)]
pub struct FormalDef {
    pub name: String,
    pub ty: DeclaredType,
    pub span: Span,
    /// False for a rejected formal (`self` or duplicate); it keeps its slot
    /// in the signature but is not visible in the method body
    pub bound: bool,
}

/// Resolved method
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub formals: Vec<FormalDef>,
    pub ret_type: DeclaredType,
    pub body: Expr,
    pub owner: ClassId,
    pub span: Span,
}

/// Own members that passed validation, in declaration order
#[derive(Debug, Clone, Default)]
pub struct OwnMembers {
    pub fields: IndexMap<String, Rc<FieldDef>>,
    pub methods: IndexMap<String, Rc<MethodDef>>,
}

/// Final member tables of a class
#[derive(Debug, Clone)]
pub struct ClassMembers {
    /// Own fields, minus those clashing with an inherited one
    pub fields: IndexMap<String, Rc<FieldDef>>,
    /// Own methods, minus incompatible overrides
    pub methods: IndexMap<String, Rc<MethodDef>>,
    pub inherited_fields: IndexMap<String, Rc<FieldDef>>,
    pub inherited_methods: IndexMap<String, Rc<MethodDef>>,
    /// Root ... self
    pub ancestors: ClassChain,
}

impl ClassMembers {
    pub fn method(&self, name: &str) -> Option<&Rc<MethodDef>> {
        self.methods.get(name).or_else(|| self.inherited_methods.get(name))
    }

    /// Own and inherited fields, ancestors first
    pub fn all_fields(&self) -> impl Iterator<Item = &Rc<FieldDef>> {
        self.inherited_fields.values().chain(self.fields.values())
    }
}

/// Progress of the inheritance merge for one class
#[derive(Debug, Clone)]
pub enum Resolution {
    Unresolved,
    Resolving,
    Resolved(Box<ClassMembers>),
}

/// Progress of the cycle check for one class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyState {
    Unchecked,
    /// The parent chain reaches the root
    Clean,
}

/// A class in the table
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub id: ClassId,
    pub name: String,
    pub span: Span,
    /// `extends` clause as written; `None` for the root class
    pub parent_name: Option<Ident>,
    /// Resolved parent link; `None` only for the root class
    pub parent: Option<ClassId>,
    pub builtin: bool,
    pub decl_fields: Vec<FieldDecl>,
    pub decl_methods: Vec<MethodDecl>,
    pub hierarchy: HierarchyState,
    pub own: Option<OwnMembers>,
    pub members: Resolution,
}

impl ClassDef {
    fn from_decl(id: ClassId, decl: &ClassDecl, builtin: bool) -> Self {
        let parent_name = if builtin {
            None
        } else {
            Some(decl.parent.clone().unwrap_or_else(|| Ident::new(ROOT_CLASS)))
        };
        Self {
            id,
            name: decl.name.name.clone(),
            span: decl.name.span,
            parent_name,
            parent: if builtin { None } else { Some(ClassId::ROOT) },
            builtin,
            decl_fields: decl.fields.clone(),
            decl_methods: decl.methods.clone(),
            hierarchy: HierarchyState::Unchecked,
            own: None,
            members: Resolution::Unresolved,
        }
    }

    /// Resolved member tables, once the member resolver has run
    pub fn resolved(&self) -> Option<&ClassMembers> {
        match &self.members {
            Resolution::Resolved(members) => Some(members),
            _ => None,
        }
    }
}

/// Name → class table
#[derive(Debug, Clone)]
pub struct ClassTable {
    classes: Vec<ClassDef>,
    index: HashMap<String, ClassId>,
}

impl ClassTable {
    /// Build the table from the declared classes.
    ///
    /// The root class is synthesized first. A redeclared name is reported
    /// and the later declaration dropped.
    pub fn build(decls: &[ClassDecl], diagnostics: &mut Diagnostics) -> Self {
        let mut table = Self {
            classes: Vec::with_capacity(decls.len() + 1),
            index: HashMap::new(),
        };
        table.insert(&root_class(), true);

        for decl in decls {
            if table.index.contains_key(&decl.name.name) {
                diagnostics.report(Error::ClassRedefinition {
                    name: decl.name.name.clone(),
                    span: decl.name.span,
                });
                continue;
            }
            table.insert(decl, false);
        }

        debug!("class table built with {} classes", table.classes.len());
        table
    }

    fn insert(&mut self, decl: &ClassDecl, builtin: bool) {
        let id = ClassId(self.classes.len());
        self.index.insert(decl.name.name.clone(), id);
        self.classes.push(ClassDef::from_decl(id, decl, builtin));
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0]
    }

    pub fn by_name(&self, name: &str) -> Option<&ClassDef> {
        self.lookup(name).map(|id| self.get(id))
    }

    /// Class ids in table order: root first, then declaration order
    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.iter()
    }

    /// Resolve a type name written in a declaration
    pub fn declared_type(&self, name: &str) -> Option<DeclaredType> {
        if let Some(p) = PrimitiveType::from_name(name) {
            Some(DeclaredType::Primitive(p))
        } else if self.contains(name) {
            Some(DeclaredType::Class(name.to_string()))
        } else {
            None
        }
    }

    /// Ancestor chain of a resolved class
    pub fn ancestors(&self, id: ClassId) -> Option<&ClassChain> {
        self.get(id).resolved().map(|m| &m.ancestors)
    }

    /// Static type of a value of the named class
    pub fn class_type(&self, name: &str) -> Option<Type> {
        let id = self.lookup(name)?;
        self.ancestors(id).map(|chain| Type::Class(chain.clone()))
    }

    /// Expression type of a declared type; `Error` for unknown names
    pub fn type_of(&self, declared: &DeclaredType) -> Type {
        match declared {
            DeclaredType::Primitive(p) => Type::Primitive(*p),
            DeclaredType::Class(name) => self.class_type(name).unwrap_or(Type::Error),
            DeclaredType::Unknown(_) => Type::Error,
        }
    }

    /// Method visible on a class, own first then inherited
    pub fn find_method(&self, id: ClassId, name: &str) -> Option<&Rc<MethodDef>> {
        self.get(id).resolved().and_then(|m| m.method(name))
    }
}

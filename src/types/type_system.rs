//! Type System for VSOP

use std::fmt;

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int32,
    Bool,
    String,
    Unit,
}

impl PrimitiveType {
    /// Parse a primitive type name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int32" => Some(Self::Int32),
            "bool" => Some(Self::Bool),
            "string" => Some(Self::String),
            "unit" => Some(Self::Unit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Unit => "unit",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered class names from the root class down to a value's static class.
///
/// Never empty; the first element is always the root class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassChain(Vec<String>);

impl ClassChain {
    /// Build a chain. Returns `None` for an empty list.
    pub fn new(names: Vec<String>) -> Option<Self> {
        if names.is_empty() {
            None
        } else {
            Some(Self(names))
        }
    }

    /// Chain of a class with no ancestors
    pub fn root(name: &str) -> Self {
        Self(vec![name.to_string()])
    }

    /// The most specific class of the chain
    pub fn class_name(&self) -> &str {
        // Non-empty by construction.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Whether `name` is this class or one of its ancestors
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Extend the chain with a direct subclass
    pub fn child(&self, name: &str) -> Self {
        let mut names = self.0.clone();
        names.push(name.to_string());
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Most specific common ancestor of two chains.
    ///
    /// Scans `self` from the root end and keeps the last class that also
    /// appears in `other`. Both chains share the root, so the result is
    /// always non-empty.
    pub fn join(&self, other: &ClassChain) -> ClassChain {
        let last_common = self
            .0
            .iter()
            .rposition(|name| other.contains(name))
            .unwrap_or(0);
        Self(self.0[..=last_common].to_vec())
    }
}

impl fmt::Display for ClassChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Type of an expression, computed during checking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(PrimitiveType),
    Class(ClassChain),
    /// Already reported upstream; never triggers another diagnostic
    Error,
}

impl Type {
    pub const INT32: Self = Self::Primitive(PrimitiveType::Int32);
    pub const BOOL: Self = Self::Primitive(PrimitiveType::Bool);
    pub const STRING: Self = Self::Primitive(PrimitiveType::String);
    pub const UNIT: Self = Self::Primitive(PrimitiveType::Unit);

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Whether a value of type `value` may be stored where `self` is declared.
    ///
    /// Primitives must match exactly; a class-typed value is accepted when
    /// its chain contains the declared class. `Error` on either side is
    /// accepted silently.
    pub fn accepts(&self, value: &Type) -> bool {
        match (self, value) {
            (Type::Error, _) | (_, Type::Error) => true,
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            (Type::Class(declared), Type::Class(chain)) => chain.contains(declared.class_name()),
            _ => false,
        }
    }

    /// Type of an `if`/`else` with branches of types `self` and `other`.
    ///
    /// Returns `None` when the branches cannot be joined.
    pub fn join(&self, other: &Type) -> Option<Type> {
        match (self, other) {
            (Type::Primitive(PrimitiveType::Unit), _) | (_, Type::Primitive(PrimitiveType::Unit)) => {
                Some(Type::UNIT)
            }
            (Type::Error, _) | (_, Type::Error) => Some(Type::Error),
            (Type::Primitive(a), Type::Primitive(b)) if a == b => Some(Type::Primitive(*a)),
            (Type::Class(a), Type::Class(b)) => Some(Type::Class(a.join(b))),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{}", p),
            Type::Class(chain) => write!(f, "{}", chain),
            Type::Error => f.write_str("<error>"),
        }
    }
}

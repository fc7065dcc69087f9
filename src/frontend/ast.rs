//! Abstract Syntax Tree definitions for VSOP
//!
//! The tree is produced by the parser (outside this crate) and handed over
//! either directly or as JSON. Every node carries the position of its first
//! token; positions default to `0:0` when a producer omits them.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::frontend::semantic::ClassTable;
use crate::utils::Span;

/// A complete program (compilation unit)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
    /// Resolved class table, filled in by semantic analysis
    #[serde(skip)]
    pub class_table: Option<ClassTable>,
}

/// An identifier with its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), span: Span::dummy() }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.span = Span::new(line, column);
        self
    }
}

/// Class declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Ident,
    /// `extends` clause; absent means the root class
    #[serde(default)]
    pub parent: Option<Ident>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub span: Span,
}

/// Field declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: Ident,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

/// Method declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: Ident,
    #[serde(default)]
    pub formals: Vec<Formal>,
    pub ret_type: Ident,
    pub body: Expr,
    #[serde(default)]
    pub span: Span,
}

/// Method formal parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formal {
    pub name: Ident,
    pub ty: Ident,
    #[serde(default)]
    pub span: Span,
}

/// Integer literal as written, of any magnitude.
///
/// Only the decimal text is kept; range checking happens during analysis.
/// Decodes from a JSON integer, a decimal string, or an integral float
/// (how JSON readers hand over integers beyond 64 bits).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntLiteral(String);

impl IntLiteral {
    pub fn new(value: i64) -> Self {
        Self(value.to_string())
    }

    /// Parse decimal text: an optional `-` followed by digits
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(text.to_string()))
    }

    /// The value, if it fits in an `int32`
    pub fn to_i32(&self) -> Option<i32> {
        self.0.parse().ok()
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for IntLiteral {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(value) => serializer.serialize_i64(value),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

struct IntLiteralVisitor;

impl<'de> Visitor<'de> for IntLiteralVisitor {
    type Value = IntLiteral;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<IntLiteral, E> {
        Ok(IntLiteral::new(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<IntLiteral, E> {
        Ok(IntLiteral(value.to_string()))
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> Result<IntLiteral, E> {
        Ok(IntLiteral(value.to_string()))
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> Result<IntLiteral, E> {
        Ok(IntLiteral(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<IntLiteral, E> {
        if value.is_finite() && value.fract() == 0.0 {
            Ok(IntLiteral(format!("{:.0}", value)))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<IntLiteral, E> {
        IntLiteral::parse(value).ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

impl<'de> Deserialize<'de> for IntLiteral {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IntLiteralVisitor)
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(IntLiteral),
    Bool(bool),
    String(String),
    Unit,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnOp {
    /// `not`
    Not,
    /// `-`
    Neg,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Eq,
    And,
}

impl BinOp {
    /// Source spelling of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Eq => "=",
            BinOp::And => "and",
        }
    }
}

/// Expressions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
        #[serde(default)]
        span: Span,
    },

    /// Variable reference, including `self`
    Ident {
        name: String,
        #[serde(default)]
        span: Span,
    },

    Unary {
        op: UnOp,
        expr: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    /// `name <- value`
    Assign {
        target: Ident,
        value: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        #[serde(default)]
        else_branch: Option<Box<Expr>>,
        #[serde(default)]
        span: Span,
    },

    While {
        cond: Box<Expr>,
        body: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    /// `let name : ty [<- init] in body`
    Let {
        name: Ident,
        ty: Ident,
        #[serde(default)]
        init: Option<Box<Expr>>,
        body: Box<Expr>,
        #[serde(default)]
        span: Span,
    },

    /// `[receiver.]method(args)`; no receiver means `self`
    Call {
        #[serde(default)]
        receiver: Option<Box<Expr>>,
        method: Ident,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },

    New {
        class: Ident,
        #[serde(default)]
        span: Span,
    },

    Block {
        exprs: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
}

impl Expr {
    /// Position of the expression
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::If { span, .. }
            | Expr::While { span, .. }
            | Expr::Let { span, .. }
            | Expr::Call { span, .. }
            | Expr::New { span, .. }
            | Expr::Block { span, .. } => *span,
        }
    }

    /// Replace the position of the expression
    pub fn at(mut self, line: u32, column: u32) -> Self {
        let new_span = Span::new(line, column);
        match &mut self {
            Expr::Literal { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::If { span, .. }
            | Expr::While { span, .. }
            | Expr::Let { span, .. }
            | Expr::Call { span, .. }
            | Expr::New { span, .. }
            | Expr::Block { span, .. } => *span = new_span,
        }
        self
    }

    // ==================== Constructors ====================

    pub fn int(value: i64) -> Self {
        Expr::Literal { value: Literal::Int(IntLiteral::new(value)), span: Span::dummy() }
    }

    pub fn bool(value: bool) -> Self {
        Expr::Literal { value: Literal::Bool(value), span: Span::dummy() }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal { value: Literal::String(value.into()), span: Span::dummy() }
    }

    pub fn unit() -> Self {
        Expr::Literal { value: Literal::Unit, span: Span::dummy() }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident { name: name.into(), span: Span::dummy() }
    }

    pub fn unary(op: UnOp, expr: Expr) -> Self {
        Expr::Unary { op, expr: Box::new(expr), span: Span::dummy() }
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            span: Span::dummy(),
        }
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Expr::Assign {
            target: Ident::new(target),
            value: Box::new(value),
            span: Span::dummy(),
        }
    }

    pub fn if_then(cond: Expr, then_branch: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: None,
            span: Span::dummy(),
        }
    }

    pub fn if_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
            span: Span::dummy(),
        }
    }

    pub fn while_loop(cond: Expr, body: Expr) -> Self {
        Expr::While {
            cond: Box::new(cond),
            body: Box::new(body),
            span: Span::dummy(),
        }
    }

    pub fn let_in(name: impl Into<String>, ty: impl Into<String>, init: Option<Expr>, body: Expr) -> Self {
        Expr::Let {
            name: Ident::new(name),
            ty: Ident::new(ty),
            init: init.map(Box::new),
            body: Box::new(body),
            span: Span::dummy(),
        }
    }

    /// Call on an implicit `self`
    pub fn call(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: None,
            method: Ident::new(method),
            args,
            span: Span::dummy(),
        }
    }

    /// Call on an explicit receiver
    pub fn dispatch(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: Some(Box::new(receiver)),
            method: Ident::new(method),
            args,
            span: Span::dummy(),
        }
    }

    pub fn new_object(class: impl Into<String>) -> Self {
        Expr::New { class: Ident::new(class), span: Span::dummy() }
    }

    pub fn block(exprs: Vec<Expr>) -> Self {
        Expr::Block { exprs, span: Span::dummy() }
    }
}

impl ClassDecl {
    /// Class with no explicit parent and no members
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Ident::new(name),
            parent: None,
            fields: Vec::new(),
            methods: Vec::new(),
            span: Span::dummy(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(Ident::new(parent));
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.span = Span::new(line, column);
        self.name.span = self.span;
        self
    }
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Ident::new(name),
            ty: Ident::new(ty),
            init: None,
            span: Span::dummy(),
        }
    }

    pub fn init(mut self, expr: Expr) -> Self {
        self.init = Some(expr);
        self
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.span = Span::new(line, column);
        self.name.span = self.span;
        self
    }
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, formals: Vec<Formal>, ret_type: impl Into<String>, body: Expr) -> Self {
        Self {
            name: Ident::new(name),
            formals,
            ret_type: Ident::new(ret_type),
            body,
            span: Span::dummy(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.span = Span::new(line, column);
        self.name.span = self.span;
        self
    }
}

impl Formal {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Ident::new(name),
            ty: Ident::new(ty),
            span: Span::dummy(),
        }
    }
}

impl Program {
    pub fn new(classes: Vec<ClassDecl>) -> Self {
        Self { classes, class_table: None }
    }

    /// Decode a program from its JSON form
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_program() {
        let source = r#"{
            "classes": [{
                "name": {"name": "Main", "span": {"line": 1, "column": 1}},
                "methods": [{
                    "name": {"name": "main"},
                    "ret_type": {"name": "int32"},
                    "body": {"kind": "block", "exprs": [
                        {"kind": "call", "method": {"name": "printInt32"},
                         "args": [{"kind": "literal", "value": {"int": 42}}]},
                        {"kind": "literal", "value": {"int": 0}}
                    ]}
                }]
            }]
        }"#;
        let program = Program::from_json(source).unwrap();
        assert_eq!(program.classes.len(), 1);
        assert_eq!(program.classes[0].name.span, Span::new(1, 1));
        assert!(program.classes[0].parent.is_none());
        assert!(matches!(program.classes[0].methods[0].body, Expr::Block { ref exprs, .. } if exprs.len() == 2));
    }

    #[test]
    fn test_decode_unit_literal() {
        let expr: Expr = serde_json::from_str(r#"{"kind": "literal", "value": "unit"}"#).unwrap();
        assert!(matches!(expr, Expr::Literal { value: Literal::Unit, .. }));
    }

    #[test]
    fn test_decode_oversized_int_literal() {
        for (source, text) in [
            (r#"{"kind": "literal", "value": {"int": 2147483648}}"#, "2147483648"),
            (r#"{"kind": "literal", "value": {"int": 9223372036854775808}}"#, "9223372036854775808"),
            (r#"{"kind": "literal", "value": {"int": "99999999999999999999"}}"#, "99999999999999999999"),
        ] {
            let expr: Expr = serde_json::from_str(source).unwrap();
            match expr {
                Expr::Literal { value: Literal::Int(n), .. } => {
                    assert_eq!(n.text(), text);
                    assert_eq!(n.to_i32(), None);
                }
                other => panic!("expected an int literal, got {:?}", other),
            }
        }

        // beyond u64, JSON readers produce a float
        let expr: Expr = serde_json::from_str(r#"{"kind": "literal", "value": {"int": 99999999999999999999}}"#).unwrap();
        assert!(matches!(expr, Expr::Literal { value: Literal::Int(ref n), .. } if n.to_i32().is_none()));
    }

    #[test]
    fn test_int_literal_rejects_fractions() {
        assert!(serde_json::from_str::<IntLiteral>("1.5").is_err());
        assert!(serde_json::from_str::<IntLiteral>(r#""12a""#).is_err());
        assert_eq!(serde_json::from_str::<IntLiteral>("-7").unwrap().to_i32(), Some(-7));
    }

    #[test]
    fn test_at_sets_span() {
        let expr = Expr::int(1).at(4, 2);
        assert_eq!(expr.span(), Span::new(4, 2));
    }
}

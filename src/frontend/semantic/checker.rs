//! Expression type checking
//!
//! Walks field initializers and method bodies of every resolved class.
//! Each rule reports at most once per offending node and then yields
//! `Type::Error`, which every later rule accepts without complaint.

use std::collections::HashMap;

use log::{debug, trace};

use super::class_table::{ClassId, ClassTable, MethodDef};
use super::scope::Scope;
use super::SELF;
use crate::frontend::ast::{BinOp, Expr, Ident, Literal, UnOp};
use crate::types::{PrimitiveType, Type};
use crate::utils::{Diagnostics, Error, Span};

/// Type-check every user-defined class
pub fn check_program(table: &ClassTable, diagnostics: &mut Diagnostics) {
    for class in table.iter().filter(|c| !c.builtin) {
        check_class(table, class.id, diagnostics);
    }
    debug!("type checking done");
}

/// Type-check the field initializers and method bodies of one class
pub fn check_class(table: &ClassTable, id: ClassId, diagnostics: &mut Diagnostics) {
    let Some(members) = table.get(id).resolved() else {
        return;
    };
    trace!("checking class {}", table.get(id).name);

    let field_types: HashMap<String, Type> = members
        .all_fields()
        .map(|field| (field.name.clone(), table.type_of(&field.ty)))
        .collect();
    let self_type = Type::Class(members.ancestors.clone());

    for field in members.fields.values() {
        let Some(init) = &field.init else {
            continue;
        };
        let got = TypeChecker::new(table, Scope::empty(), diagnostics).check_expr(init);
        let expected = table.type_of(&field.ty);
        if !expected.accepts(&got) {
            diagnostics.report(Error::InitializerMismatch {
                name: field.name.clone(),
                expected: expected.to_string(),
                got: got.to_string(),
                span: field.span,
            });
        }
    }

    for method in members.methods.values() {
        let formals = method
            .formals
            .iter()
            .filter(|formal| formal.bound)
            .map(|formal| (formal.name.clone(), table.type_of(&formal.ty)))
            .collect();
        let scope = Scope::method(formals, &field_types, self_type.clone());
        let got = TypeChecker::new(table, scope, diagnostics).check_expr(&method.body);
        let expected = table.type_of(&method.ret_type);
        if !expected.accepts(&got) {
            diagnostics.report(Error::ReturnMismatch {
                method: method.name.clone(),
                expected: expected.to_string(),
                got: got.to_string(),
                span: method.span,
            });
        }
    }
}

/// Checker for one initializer or method body
pub struct TypeChecker<'a, 'd> {
    table: &'a ClassTable,
    scope: Scope<'a>,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> TypeChecker<'a, 'd> {
    pub fn new(table: &'a ClassTable, scope: Scope<'a>, diagnostics: &'d mut Diagnostics) -> Self {
        Self { table, scope, diagnostics }
    }

    /// Compute the type of an expression, reporting errors along the way
    pub fn check_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Literal { value, span } => self.check_literal(value, *span),

            Expr::Ident { name, span } => self.check_ident(name, *span),

            Expr::Unary { op, expr, span } => {
                let ty = self.check_expr(expr);
                self.check_unary(*op, ty, *span)
            }

            Expr::Binary { left, op, right, span } => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                self.check_binary(*op, left_ty, right_ty, *span)
            }

            Expr::Assign { target, value, span } => self.check_assign(target, value, *span),

            Expr::If { cond, then_branch, else_branch, span } => {
                let cond_ty = self.check_expr(cond);
                let then_ty = self.check_expr(then_branch);
                let else_ty = else_branch.as_ref().map(|e| self.check_expr(e));

                if !Type::BOOL.accepts(&cond_ty) {
                    self.report(Error::ConditionNotBool {
                        construct: "if".to_string(),
                        got: cond_ty.to_string(),
                        span: cond.span(),
                    });
                    return Type::Error;
                }

                match else_ty {
                    None => then_ty,
                    Some(else_ty) => match then_ty.join(&else_ty) {
                        Some(ty) => ty,
                        None => {
                            self.report(Error::BranchMismatch {
                                then_ty: then_ty.to_string(),
                                else_ty: else_ty.to_string(),
                                span: *span,
                            });
                            Type::Error
                        }
                    },
                }
            }

            Expr::While { cond, body, .. } => {
                let cond_ty = self.check_expr(cond);
                if !Type::BOOL.accepts(&cond_ty) {
                    self.report(Error::ConditionNotBool {
                        construct: "while".to_string(),
                        got: cond_ty.to_string(),
                        span: cond.span(),
                    });
                }
                self.check_expr(body);
                Type::UNIT
            }

            Expr::Let { name, ty, init, body, .. } => self.check_let(name, ty, init.as_deref(), body),

            Expr::Call { receiver, method, args, span } => self.check_call(receiver.as_deref(), method, args, *span),

            Expr::New { class, span } => match self.table.class_type(&class.name) {
                Some(ty) => ty,
                None => {
                    self.report(Error::UndefinedClass {
                        name: class.name.clone(),
                        span: *span,
                    });
                    Type::Error
                }
            },

            Expr::Block { exprs, .. } => {
                let mut last = Type::UNIT;
                for e in exprs {
                    last = self.check_expr(e);
                }
                last
            }
        }
    }

    fn report(&mut self, error: Error) {
        self.diagnostics.report(error);
    }

    fn check_literal(&mut self, value: &Literal, span: Span) -> Type {
        match value {
            Literal::Int(n) => match n.to_i32() {
                Some(_) => Type::INT32,
                None => {
                    self.report(Error::IntegerOutOfRange {
                        value: n.to_string(),
                        span,
                    });
                    Type::Error
                }
            },
            Literal::Bool(_) => Type::BOOL,
            Literal::String(_) => Type::STRING,
            Literal::Unit => Type::UNIT,
        }
    }

    fn check_ident(&mut self, name: &str, span: Span) -> Type {
        if name == SELF {
            return match self.scope.self_type() {
                Some(ty) => ty.clone(),
                None => {
                    self.report(Error::SelfInInitializer { span });
                    Type::Error
                }
            };
        }
        match self.scope.lookup(name) {
            Some(ty) => ty.clone(),
            None => {
                self.report(Error::UndefinedVariable {
                    name: name.to_string(),
                    span,
                });
                Type::Error
            }
        }
    }

    fn check_unary(&mut self, op: UnOp, ty: Type, span: Span) -> Type {
        let (expected, symbol) = match op {
            UnOp::Not => (Type::BOOL, "not"),
            UnOp::Neg => (Type::INT32, "-"),
        };
        if ty.is_error() {
            return Type::Error;
        }
        if ty != expected {
            self.report(Error::InvalidOperand {
                op: symbol.to_string(),
                expected: expected.to_string(),
                got: ty.to_string(),
                span,
            });
            return Type::Error;
        }
        expected
    }

    fn check_binary(&mut self, op: BinOp, left: Type, right: Type, span: Span) -> Type {
        if left.is_error() || right.is_error() {
            return Type::Error;
        }

        let (operand, result) = match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Pow => (Type::INT32, Type::INT32),
            BinOp::Lt | BinOp::Le => (Type::INT32, Type::BOOL),
            BinOp::And => (Type::BOOL, Type::BOOL),
            BinOp::Eq => {
                let comparable = match (&left, &right) {
                    (Type::Class(_), Type::Class(_)) => true,
                    (Type::Primitive(a), Type::Primitive(b)) => a == b,
                    _ => false,
                };
                if !comparable {
                    self.report(Error::IncomparableTypes {
                        left: left.to_string(),
                        right: right.to_string(),
                        span,
                    });
                    return Type::Error;
                }
                return Type::BOOL;
            }
        };

        if left != operand || right != operand {
            self.report(Error::InvalidOperand {
                op: op.symbol().to_string(),
                expected: operand.to_string(),
                got: format!("{} and {}", left, right),
                span,
            });
            return Type::Error;
        }
        result
    }

    fn check_assign(&mut self, target: &Ident, value: &Expr, span: Span) -> Type {
        if target.name == SELF {
            self.check_expr(value);
            self.report(Error::AssignToSelf { span });
            return Type::Error;
        }

        let target_ty = self.scope.lookup(&target.name).cloned();
        let value_ty = self.check_expr(value);
        let Some(target_ty) = target_ty else {
            self.report(Error::UndefinedVariable {
                name: target.name.clone(),
                span: target.span,
            });
            return Type::Error;
        };

        if !target_ty.accepts(&value_ty) {
            self.report(Error::AssignMismatch {
                name: target.name.clone(),
                expected: target_ty.to_string(),
                got: value_ty.to_string(),
                span,
            });
            return Type::Error;
        }
        Type::UNIT
    }

    fn check_let(&mut self, name: &Ident, ty: &Ident, init: Option<&Expr>, body: &Expr) -> Type {
        let declared = match PrimitiveType::from_name(&ty.name) {
            Some(p) => Type::Primitive(p),
            None => match self.table.class_type(&ty.name) {
                Some(class_ty) => class_ty,
                None => {
                    self.report(Error::UnknownType {
                        name: ty.name.clone(),
                        context: format!("local variable {}", name.name),
                        span: ty.span,
                    });
                    Type::Error
                }
            },
        };

        if let Some(init) = init {
            let init_ty = self.check_expr(init);
            if !declared.accepts(&init_ty) {
                self.report(Error::InitializerMismatch {
                    name: name.name.clone(),
                    expected: declared.to_string(),
                    got: init_ty.to_string(),
                    span: init.span(),
                });
            }
        }

        if name.name == SELF {
            self.report(Error::ReservedName {
                what: "local variable".to_string(),
                span: name.span,
            });
            return self.check_expr(body);
        }

        self.scope.push_local(name.name.clone(), declared);
        let body_ty = self.check_expr(body);
        self.scope.pop_local();
        body_ty
    }

    fn check_call(&mut self, receiver: Option<&Expr>, method: &Ident, args: &[Expr], span: Span) -> Type {
        let receiver_ty = match receiver {
            Some(expr) => self.check_expr(expr),
            None => match self.scope.self_type() {
                Some(ty) => ty.clone(),
                None => {
                    self.report(Error::SelfInInitializer { span });
                    Type::Error
                }
            },
        };
        let arg_types: Vec<Type> = args.iter().map(|arg| self.check_expr(arg)).collect();

        let chain = match receiver_ty {
            Type::Class(chain) => chain,
            Type::Error => return Type::Error,
            Type::Primitive(p) => {
                self.report(Error::DispatchOnPrimitive {
                    method: method.name.clone(),
                    ty: p.to_string(),
                    span,
                });
                return Type::Error;
            }
        };

        // Static dispatch target: the receiver's declared class
        let table = self.table;
        let Some(class_id) = table.lookup(chain.class_name()) else {
            return Type::Error;
        };
        let Some(target) = table.find_method(class_id, &method.name) else {
            self.report(Error::UndefinedMethod {
                method: method.name.clone(),
                class: chain.class_name().to_string(),
                span: method.span,
            });
            return Type::Error;
        };

        if self.check_arguments(target, args, &arg_types, span) {
            table.type_of(&target.ret_type)
        } else {
            Type::Error
        }
    }

    /// Arity and per-argument acceptance, in declaration order
    fn check_arguments(&mut self, target: &MethodDef, args: &[Expr], arg_types: &[Type], span: Span) -> bool {
        if args.len() != target.formals.len() {
            self.report(Error::ArgCountMismatch {
                method: target.name.clone(),
                expected: target.formals.len(),
                got: args.len(),
                span,
            });
            return false;
        }

        let mut ok = true;
        for (position, ((arg, arg_ty), formal)) in args.iter().zip(arg_types).zip(&target.formals).enumerate() {
            let expected = self.table.type_of(&formal.ty);
            if !expected.accepts(arg_ty) {
                self.report(Error::ArgumentMismatch {
                    method: target.name.clone(),
                    position: position + 1,
                    expected: expected.to_string(),
                    got: arg_ty.to_string(),
                    span: arg.span(),
                });
                ok = false;
            }
        }
        ok
    }
}

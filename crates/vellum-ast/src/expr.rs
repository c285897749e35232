//! Expression nodes.
//!
//! The planner compiles five kinds of expression:
//!
//! - [`ExprKind::Literal`] - constant scalar or string
//! - [`ExprKind::Select`] - variable reference with an optional access chain
//! - [`ExprKind::Binary`] - arithmetic, comparison or logical operator
//! - [`ExprKind::Parentheses`] - grouping, compiled as its inner expression
//! - [`ExprKind::Evaluate`] - run-time sub-template over a string expression
//!
//! A selector such as `user.address.city.upper()` is a root identifier
//! (`user`) followed by [`Step`]s. A step with `call: Some(args)` invokes
//! the registered function named by the step, with the value reached so far
//! passed as argument zero.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::span::Span;

/// Expression node with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn literal(literal: Literal, span: Span) -> Self {
        Self::new(ExprKind::Literal(literal), span)
    }

    pub fn select(selector: Selector, span: Span) -> Self {
        Self::new(ExprKind::Select(selector), span)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let span = left.span.join(right.span);
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn parentheses(inner: Expr, span: Span) -> Self {
        Self::new(ExprKind::Parentheses(Box::new(inner)), span)
    }

    pub fn evaluate(inner: Expr, span: Span) -> Self {
        Self::new(ExprKind::Evaluate(Box::new(inner)), span)
    }
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),
    Select(Selector),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Parentheses(Box<Expr>),
    /// Treat the string value of the inner expression as a nested template.
    Evaluate(Box<Expr>),
}

/// Constant value written in the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Variable reference: root identifier plus access chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    /// Root identifier, looked up among top-level variables.
    pub id: String,
    /// Field accesses and method calls, left to right.
    pub steps: Vec<Step>,
}

impl Selector {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Append a field access step.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.steps.push(Step::field(name));
        self
    }

    /// Append a method call step.
    pub fn call(mut self, name: impl Into<String>, args: Vec<Expr>) -> Self {
        self.steps.push(Step::call(name, args));
        self
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        for step in &self.steps {
            write!(f, ".{}", step.name)?;
            if let Some(args) = &step.call {
                write!(f, "({} args)", args.len())?;
            }
        }
        Ok(())
    }
}

/// One link of a selector chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// Call arguments when the step is a method call (receiver excluded).
    pub call: Option<Vec<Expr>>,
}

impl Step {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            call: None,
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            call: Some(args),
        }
    }

    pub fn is_call(&self) -> bool {
        self.call.is_some()
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition or string concatenation (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Remainder (%)
    Mod,
    /// Equality (==)
    Eq,
    /// Inequality (!=)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Logical AND (&&)
    And,
    /// Logical OR (||)
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Source token for this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

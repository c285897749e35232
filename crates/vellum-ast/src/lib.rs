// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! AST types for Vellum templates
//!
//! This crate contains the node definitions shared by the parser and the
//! planner. It carries no behavior beyond small classification helpers.

pub mod expr;
pub mod span;
pub mod stmt;

pub use expr::{BinaryOp, Expr, ExprKind, Literal, Selector, Step};
pub use span::Span;
pub use stmt::{Block, Stmt};

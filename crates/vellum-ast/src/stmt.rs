//! Statement nodes.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// Template body: a flat sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[Stmt] {
        &self.stmts
    }

    pub fn add_statement(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Literal text copied to the output verbatim.
    Text(String),
    /// `{{ expr }}` interpolation.
    Output(Expr),
}

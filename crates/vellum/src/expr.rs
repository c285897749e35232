//! Expression compiler.

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use vellum_ast::{BinaryOp, Expr, ExprKind, Literal};
use vellum_runtime::{Control, New, Operand, Type, Value, compute, deferred};

use crate::error::{CompileError, Result};
use crate::planner::{CompileContext, Scope};
use crate::selector::{Access, Selector, SelectorId};

/// Compiled expression: unified result type, the selector holding the
/// result when there is one, and the deferred computation.
pub struct Expression {
    pub ty: Option<Type>,
    pub selector: Option<SelectorId>,
    new: New,
}

impl Expression {
    pub fn new(ty: Option<Type>, selector: Option<SelectorId>, new: New) -> Self {
        Self { ty, selector, new }
    }

    /// Claim runtime resources and produce the runnable operand.
    pub fn operand(self, control: &mut Control) -> vellum_runtime::Result<Operand> {
        Operand::build(self.ty, self.new, control)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("ty", &self.ty)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(n) => Value::Float(*n),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

/// Static type of a binary node, when it does not depend on operands.
fn static_type(op: BinaryOp) -> Option<Type> {
    (op.is_comparison() || op.is_logical()).then_some(Type::Bool)
}

impl Scope {
    pub(crate) fn compile_expr(&mut self, ctx: &mut CompileContext, expr: &Expr) -> Result<Expression> {
        match &expr.kind {
            ExprKind::Literal(literal) => {
                let value = literal_value(literal);
                Ok(Expression::new(
                    value.type_of(),
                    None,
                    deferred(move |_| Ok(compute(move |_| value.clone()))),
                ))
            }
            ExprKind::Select(selector) => {
                let id = self.select(ctx, selector)?;
                let reader = self.selectors.reader(id);
                Ok(Expression::new(
                    Some(self.selectors[id].ty.clone()),
                    Some(id),
                    deferred(move |_| Ok(reader)),
                ))
            }
            ExprKind::Binary { op, left, right } => self.compile_binary(ctx, *op, left, right),
            ExprKind::Parentheses(inner) => self.compile_expr(ctx, inner),
            ExprKind::Evaluate(inner) => {
                let inner = self.compile_expr(ctx, inner)?;
                let evaluator = Arc::new(self.evaluator());
                Ok(Expression::new(
                    Some(Type::Str),
                    None,
                    deferred(move |control| {
                        let inner = inner.operand(control)?;
                        Ok(compute(move |state| {
                            let text = inner.exec(state);
                            match text.as_str() {
                                Some(text) => evaluator.evaluate(state, text),
                                None => evaluator.evaluate(state, &text.to_string()),
                            }
                        }))
                    }),
                ))
            }
        }
    }

    fn compile_binary(
        &mut self,
        ctx: &mut CompileContext,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Expression> {
        let left = self.compile_expr(ctx, left)?;
        let right = self.compile_expr(ctx, right)?;

        let temporary = self.temporary(ctx);
        let unified = static_type(op)
            .or_else(|| left.ty.clone())
            .or_else(|| right.ty.clone())
            .ok_or_else(|| CompileError::EmptySelectorType(temporary.clone()))?;
        let left_ty = left.ty.clone().unwrap_or_else(|| unified.clone());
        let right_ty = right.ty.clone().unwrap_or_else(|| unified.clone());
        let kernel = vellum_runtime::binary(op, &unified, &left_ty, &right_ty)?;

        self.layout.add_field(&temporary, &temporary, unified.clone())?;
        let accessor = self
            .layout
            .accessor(&temporary)
            .cloned()
            .ok_or_else(|| CompileError::UnknownVariable(temporary.clone()))?;
        let slot = accessor.slot;

        let mut accumulator = Selector::new(
            temporary.clone(),
            temporary.clone(),
            unified.clone(),
            Access::Slot(accessor),
        );
        accumulator.transient = true;
        let id = self.selectors.push(accumulator);
        trace!(%op, ty = %unified, temporary = %temporary, "compiled binary");

        Ok(Expression::new(
            Some(unified),
            Some(id),
            deferred(move |control| {
                let left = left.operand(control)?;
                let right = right.operand(control)?;
                Ok(compute(move |state| {
                    let a = left.exec(state);
                    let b = right.exec(state);
                    let value = kernel(&a, &b);
                    state.store(slot, value.clone());
                    value
                }))
            }),
        ))
    }
}

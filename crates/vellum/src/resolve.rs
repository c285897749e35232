//! Selector resolution.
//!
//! Walks `root.step.step(...)` chains against the structural type of each
//! step and binds them to selectors registered up front, or, for method
//! calls, to fresh call selectors backed by a temporary.

use tracing::trace;
use vellum_ast::{Selector as SelectorExpr, Step};
use vellum_runtime::{Operand, StructType, Type};

use crate::error::{CompileError, Result};
use crate::planner::{CompileContext, Scope};
use crate::selector::{Access, Call, SEPARATOR, Selector, SelectorId, display_id};

impl Scope {
    /// Resolve a selector expression to the selector holding its value.
    pub(crate) fn select(&mut self, ctx: &mut CompileContext, expr: &SelectorExpr) -> Result<SelectorId> {
        let mut current = self
            .selectors
            .lookup(&expr.id)
            .ok_or_else(|| CompileError::UnknownVariable(expr.id.clone()))?;
        if expr.steps.is_empty() {
            return Ok(current);
        }

        let mut cursor = self.selectors[current].ty.clone();
        let mut composite = self.selectors[current].id.clone();
        // Once a pointer has been crossed every later step is indirect.
        let mut indirect = false;

        for step in &expr.steps {
            if cursor.is_ptr() {
                cursor = cursor.deref().clone();
                indirect = true;
            }
            composite = format!("{}{}{}", composite, SEPARATOR, step.name);

            current = match &step.call {
                Some(args) => self.select_call(ctx, current, step, args, &composite)?,
                None => {
                    let (id, through_ptr) = self.select_field(&cursor, step, &composite)?;
                    indirect |= through_ptr;
                    id
                }
            };
            if indirect {
                self.selectors[current].indirect = true;
            }
            cursor = self.selectors[current].ty.clone();
        }

        trace!(selector = %display_id(&composite), indirect, "resolved selector");
        Ok(current)
    }

    /// Selector of a struct member, and whether reaching it from `cursor`
    /// crosses a pointer on the way through anonymous members.
    fn select_field(&self, cursor: &Type, step: &Step, composite: &str) -> Result<(SelectorId, bool)> {
        let not_found = || CompileError::FieldNotFound {
            field: step.name.clone(),
            ty: cursor.to_string(),
        };
        let Type::Struct(st) = cursor else {
            return Err(not_found());
        };
        let found = st
            .field_by_name(&step.name)
            .or_else(|| st.field_by_tag_name(&step.name))
            .ok_or_else(not_found)?;
        if found.field.tag.omit {
            return Err(CompileError::FieldOmitted(display_id(composite)));
        }

        let through_ptr = promoted_through_ptr(st, &found.indices);
        let id = self
            .selectors
            .lookup(composite)
            .ok_or_else(|| CompileError::SelectorNotFound(display_id(composite)))?;
        Ok((id, through_ptr))
    }

    fn select_call(
        &mut self,
        ctx: &mut CompileContext,
        receiver: SelectorId,
        step: &Step,
        args: &[vellum_ast::Expr],
        composite: &str,
    ) -> Result<SelectorId> {
        let function = self
            .functions
            .lookup_by_name(&step.name)
            .ok_or_else(|| CompileError::UnknownFunction(step.name.clone()))?;
        if !function.arity.accepts(args.len() + 1) {
            return Err(CompileError::ArityMismatch {
                name: function.name.clone(),
                expected: function.arity.to_string(),
                found: args.len() + 1,
            });
        }

        let mut operands = Vec::with_capacity(args.len() + 1);
        operands.push(Operand::new(
            Some(self.selectors[receiver].ty.clone()),
            self.selectors.reader(receiver),
        ));
        for arg in args {
            let compiled = self.compile_expr(ctx, arg)?;
            operands.push(compiled.operand(&mut ctx.control)?);
        }

        let temporary = self.temporary(ctx);
        self.layout
            .add_field(&temporary, &step.name, function.result_type.clone())?;
        let result = self
            .layout
            .accessor(&temporary)
            .cloned()
            .ok_or_else(|| CompileError::UnknownVariable(temporary.clone()))?;

        let ty = function.result_type.clone();
        let call = Call {
            function,
            args: operands,
            result,
            control: ctx.control.allocate(),
        };
        let mut selector = Selector::new(composite, step.name.clone(), ty, Access::Call(call))
            .with_parent(receiver);
        selector.transient = true;

        trace!(function = %step.name, temporary = %temporary, "bound call");
        Ok(self.selectors.push(selector))
    }
}

fn promoted_through_ptr(st: &StructType, indices: &[usize]) -> bool {
    let Some((_, anonymous)) = indices.split_last() else {
        return false;
    };
    let mut st = st;
    for &index in anonymous {
        let Some(field) = st.fields.get(index) else {
            return false;
        };
        if field.ty.is_ptr() {
            return true;
        }
        match field.ty.as_struct() {
            Some(inner) => st = inner.as_ref(),
            None => return false,
        }
    }
    false
}

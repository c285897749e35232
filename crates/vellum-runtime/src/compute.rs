//! Build-once, run-many computations.
//!
//! Compilation produces [`New`] builders. Each builder is invoked exactly
//! once against the compile pass's [`Control`] to claim the runtime
//! resources it needs and returns a [`Compute`] closure that can then be
//! run against any number of [`State`]s.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::state::State;
use crate::types::Type;
use crate::value::Value;

/// Compiled computation over an execution state.
pub type Compute = Arc<dyn Fn(&mut State) -> Value + Send + Sync>;

/// Deferred builder of a [`Compute`].
pub type New = Box<dyn FnOnce(&mut Control) -> Result<Compute>>;

/// Wrap a closure as a [`Compute`].
pub fn compute<F>(f: F) -> Compute
where
    F: Fn(&mut State) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a builder closure as a [`New`].
pub fn deferred<F>(f: F) -> New
where
    F: FnOnce(&mut Control) -> Result<Compute> + 'static,
{
    Box::new(f)
}

/// Monotonic counter of control resources for one compile pass.
#[derive(Debug, Clone, Default)]
pub struct Control {
    next: usize,
}

impl Control {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh resource index.
    pub fn allocate(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Number of resources minted so far.
    pub fn count(&self) -> usize {
        self.next
    }
}

/// Typed, runnable operand.
#[derive(Clone)]
pub struct Operand {
    /// Static type, when known at compile time.
    pub ty: Option<Type>,
    compute: Compute,
}

impl Operand {
    pub fn new(ty: Option<Type>, compute: Compute) -> Self {
        Self { ty, compute }
    }

    /// Run a builder against `control` and wrap the result.
    pub fn build(ty: Option<Type>, new: New, control: &mut Control) -> Result<Self> {
        Ok(Self::new(ty, new(control)?))
    }

    /// Operand producing a fixed value.
    pub fn constant(value: Value) -> Self {
        let ty = value.type_of();
        Self::new(ty, compute(move |_| value.clone()))
    }

    pub fn exec(&self, state: &mut State) -> Value {
        (self.compute)(state)
    }

    pub fn compute(&self) -> &Compute {
        &self.compute
    }

    pub fn into_compute(self) -> Compute {
        self.compute
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operand").field("ty", &self.ty).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ScopeType;

    #[test]
    fn test_control_is_monotonic() {
        let mut control = Control::new();
        assert_eq!(control.allocate(), 0);
        assert_eq!(control.allocate(), 1);
        assert_eq!(control.count(), 2);
    }

    #[test]
    fn test_build_claims_resources_once() {
        let mut control = Control::new();
        let new = deferred(|control| {
            let index = control.allocate();
            Ok(compute(move |_| Value::Int(index as i64)))
        });
        let operand = Operand::build(Some(Type::Int), new, &mut control).unwrap();
        assert_eq!(control.count(), 1);

        let mut state = State::new(Arc::new(ScopeType::new()), control.count(), 0);
        assert_eq!(operand.exec(&mut state), Value::Int(0));
        assert_eq!(operand.exec(&mut state), Value::Int(0));
    }

    #[test]
    fn test_constant_operand() {
        let operand = Operand::constant(Value::from("hi"));
        assert_eq!(operand.ty, Some(Type::Str));
        let mut state = State::new(Arc::new(ScopeType::new()), 0, 0);
        assert_eq!(operand.exec(&mut state), Value::from("hi"));
    }
}

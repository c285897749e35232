//! Statement compiler and compiled templates.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use vellum_ast::{Block, Stmt};
use vellum_runtime::{Compute, Operand, ScopeType, State, Value, compute};

use crate::error::Result;
use crate::planner::{CompileContext, Scope};

enum Step<E> {
    Text(Arc<str>),
    Output(E),
}

/// Compiled template, runnable against any number of states.
#[derive(Clone)]
pub struct Execution {
    layout: Arc<ScopeType>,
    compute: Compute,
    controls: usize,
    buffer_size: usize,
    defaults: Arc<[(usize, Value)]>,
}

impl Execution {
    /// Layout the template was compiled against.
    pub fn layout(&self) -> &Arc<ScopeType> {
        &self.layout
    }

    /// Number of control resources a state must provide.
    pub fn controls(&self) -> usize {
        self.controls
    }

    /// Fresh state seeded with the values variables were declared with.
    pub fn new_state(&self) -> State {
        let mut state = State::new(Arc::clone(&self.layout), self.controls, self.buffer_size);
        for (slot, value) in self.defaults.iter() {
            state.store(*slot, value.clone());
        }
        state
    }

    /// Run the template, appending to the state's buffer.
    pub fn exec(&self, state: &mut State) {
        (self.compute)(state);
    }

    /// Run the template and return only the text this run produced.
    pub fn render(&self, state: &mut State) -> String {
        let mark = state.buffer().len();
        self.exec(state);
        state.buffer_mut().split_off(mark)
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("fields", &self.layout.len())
            .field("controls", &self.controls)
            .finish_non_exhaustive()
    }
}

impl Scope {
    pub(crate) fn compile_block(&mut self, ctx: &mut CompileContext, block: &Block) -> Result<Execution> {
        // Compile every expression first: the layout must be complete
        // before it is frozen into the execution.
        let mut pending = Vec::with_capacity(block.stmts.len());
        for stmt in &block.stmts {
            pending.push(match stmt {
                Stmt::Text(text) => Step::Text(Arc::from(text.as_str())),
                Stmt::Output(expr) => Step::Output(self.compile_expr(ctx, expr)?),
            });
        }

        let mut steps: Vec<Step<Operand>> = Vec::with_capacity(pending.len());
        for step in pending {
            steps.push(match step {
                Step::Text(text) => Step::Text(text),
                Step::Output(expr) => Step::Output(expr.operand(&mut ctx.control)?),
            });
        }

        debug!(
            steps = steps.len(),
            fields = self.layout.len(),
            size = self.layout.size(),
            controls = ctx.control.count(),
            temporaries = ctx.temporaries(),
            "compiled block"
        );

        Ok(Execution {
            layout: Arc::new(self.layout.clone()),
            compute: compute(move |state| {
                for step in &steps {
                    match step {
                        Step::Text(text) => state.buffer_mut().push_str(text),
                        Step::Output(operand) => {
                            let value = operand.exec(state);
                            state.buffer_mut().push_value(&value);
                        }
                    }
                }
                Value::Nil
            }),
            controls: ctx.control.count(),
            buffer_size: self.config.buffer_size,
            defaults: self.defaults.clone().into(),
        })
    }
}

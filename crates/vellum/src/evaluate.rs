//! Dynamic sub-template evaluator.
//!
//! `evaluate(expr)` treats the string value of `expr` as template text
//! discovered at run time. The text is parsed and compiled by a child
//! planner that sees the same top-level variables as the enclosing scope;
//! the result is cached per literal text so identical sub-templates are
//! compiled once.
//!
//! Failures never reach the enclosing template: the evaluation yields an
//! empty string, logs a warning, and records an [`EvaluateError`] in the
//! state's diagnostics.

use std::sync::Arc;

use tracing::{debug, warn};
use vellum_functions::Functions;
use vellum_runtime::{Buffer, State, Value};

use crate::cache::PlanCache;
use crate::config::PlannerConfig;
use crate::error::EvaluateError;
use crate::planner::{Planner, RootVariable};
use crate::stmt::Execution;

/// Cached result of compiling one sub-template.
#[derive(Debug)]
pub struct Plan {
    /// Child planner the template was compiled with.
    pub planner: Planner,
    pub execution: Execution,
}

/// Runs dynamic sub-templates against an enclosing state.
#[derive(Debug, Clone)]
pub struct Evaluator {
    roots: Vec<RootVariable>,
    functions: Arc<Functions>,
    config: PlannerConfig,
    cache: Arc<PlanCache>,
}

impl Evaluator {
    pub(crate) fn new(
        roots: Vec<RootVariable>,
        functions: Arc<Functions>,
        config: PlannerConfig,
        cache: Arc<PlanCache>,
    ) -> Self {
        Self {
            roots,
            functions,
            config,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<PlanCache> {
        &self.cache
    }

    /// Evaluate `text` as a template; failures yield an empty string.
    pub fn evaluate(&self, state: &mut State, text: &str) -> Value {
        match self.try_evaluate(state, text) {
            Ok(output) => Value::Str(output),
            Err(err) => {
                warn!(error = %err, "dynamic template degraded to empty output");
                state.push_diagnostic(err);
                Value::Str(String::new())
            }
        }
    }

    /// Evaluate `text` as a template, returning the text it produced.
    pub fn try_evaluate(&self, state: &mut State, text: &str) -> Result<String, EvaluateError> {
        let plan = match self.cache.get(text).filter(|plan| self.accepts(plan)) {
            Some(plan) => {
                debug!(len = text.len(), "plan cache hit");
                plan
            }
            None => {
                debug!(len = text.len(), "plan cache miss");
                let plan = Arc::new(self.compile(text)?);
                self.cache.insert(text, Arc::clone(&plan));
                plan
            }
        };

        let mut child = plan.execution.new_state();
        for root in &self.roots {
            if plan.execution.layout().accessor(&root.id).is_none() {
                continue;
            }
            child
                .set_value(&root.id, state.load(root.slot))
                .map_err(|source| EvaluateError::Bind {
                    id: root.id.clone(),
                    source,
                })?;
        }

        // The sub-template writes into the enclosing buffer; its own output
        // is split off again and returned as the value.
        let buffer = state.replace_buffer(Buffer::default());
        let mark = buffer.len();
        child.replace_buffer(buffer);
        plan.execution.exec(&mut child);
        let mut buffer = child.replace_buffer(Buffer::default());
        let output = buffer.split_off(mark);
        state.replace_buffer(buffer);

        for diagnostic in child.take_diagnostics() {
            state.push_diagnostic(diagnostic);
        }
        Ok(output)
    }

    /// A cached plan is usable when every variable it was compiled
    /// against is declared the same way in this scope.
    fn accepts(&self, plan: &Plan) -> bool {
        plan.planner
            .roots()
            .iter()
            .all(|root| self.roots.iter().any(|own| own.declares_same(root)))
    }

    fn compile(&self, text: &str) -> Result<Plan, EvaluateError> {
        let block = vellum_parser::parse(text).map_err(|source| EvaluateError::Parse {
            text: text.to_string(),
            source,
        })?;
        let compile_err = |source| EvaluateError::Compile {
            text: text.to_string(),
            source,
        };

        let mut planner =
            Planner::with_config(self.config.clone()).with_functions(Arc::clone(&self.functions));
        for root in &self.roots {
            let registered = if root.embedded {
                planner.embed_variable_prefixed(&root.id, &root.prefix, root.ty.clone())
            } else {
                planner.define_variable(&root.id, root.ty.clone())
            };
            registered.map_err(compile_err)?;
        }
        let execution = planner.compile_block(&block).map_err(compile_err)?;
        Ok(Plan { planner, execution })
    }
}

#[cfg(test)]
mod tests {
    use vellum_runtime::Type;

    use super::*;
    use crate::error::CompileError;

    #[test]
    fn test_cached_plan_is_reused() {
        let mut planner = Planner::new();
        planner.define_variable("x", Value::Int(2)).unwrap();
        let evaluator = planner.evaluator();
        let mut state = planner.new_state();

        assert_eq!(evaluator.evaluate(&mut state, "{{ x * 10 }}"), Value::from("20"));
        state.set_value("x", 4i64).unwrap();
        assert_eq!(evaluator.evaluate(&mut state, "{{ x * 10 }}"), Value::from("40"));
        assert_eq!(evaluator.cache().len(), 1);
    }

    #[test]
    fn test_parse_failure_degrades_with_diagnostic() {
        let planner = Planner::new();
        let evaluator = planner.evaluator();
        let mut state = planner.new_state();

        assert_eq!(evaluator.evaluate(&mut state, "{{ 1 +"), Value::from(""));
        assert_eq!(state.diagnostics().len(), 1);
        assert!(evaluator.cache().is_empty());
        let err = evaluator.try_evaluate(&mut state, "{{ 1 +").unwrap_err();
        assert!(matches!(err, EvaluateError::Parse { .. }));
    }

    #[test]
    fn test_compile_failure_reports_unknown_variable() {
        let planner = Planner::new();
        let evaluator = planner.evaluator();
        let mut state = planner.new_state();
        let err = evaluator.try_evaluate(&mut state, "{{ missing }}").unwrap_err();
        assert_eq!(
            err,
            EvaluateError::Compile {
                text: "{{ missing }}".to_string(),
                source: CompileError::UnknownVariable("missing".to_string()),
            }
        );
    }

    #[test]
    fn test_enclosing_buffer_is_preserved() {
        let mut planner = Planner::new();
        planner.define_variable("name", Type::Str).unwrap();
        let evaluator = planner.evaluator();
        let mut state = planner.new_state();
        state.set_value("name", "Ada").unwrap();
        state.buffer_mut().push_str("before|");

        let value = evaluator.evaluate(&mut state, "hi {{ name }}");
        assert_eq!(value, Value::from("hi Ada"));
        assert_eq!(state.output(), "before|");
    }
}

// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Vellum
//!
//! Compiler and runtime for template expressions. A [`Planner`] registers
//! template variables into one packed record layout, resolves dotted and
//! chained references to selectors at compile time, and turns expressions
//! into closures that only touch record slots when run.
//!
//! ```rust,ignore
//! use vellum::{Planner, Value};
//!
//! let mut planner = Planner::new();
//! planner.define_variable("x", Value::Int(5))?;
//! planner.define_variable("y", Value::Int(3))?;
//! let execution = planner.compile_template("x + y = {{ x + y }}")?;
//! let mut state = execution.new_state();
//! assert_eq!(execution.render(&mut state), "x + y = 8");
//! ```
//!
//! `evaluate(expr)` compiles template text found at run time; see
//! [`Evaluator`].

pub mod cache;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod expr;
pub mod planner;
mod resolve;
pub mod selector;
pub mod stmt;

pub use cache::PlanCache;
pub use config::PlannerConfig;
pub use error::{CompileError, EvaluateError, Result};
pub use evaluate::{Evaluator, Plan};
pub use expr::Expression;
pub use planner::{CompileContext, Planner, TEMPORARY_PREFIX, Variable};
pub use selector::{Access, SEPARATOR, Selector, SelectorId, Selectors, display_id};
pub use stmt::Execution;

pub use vellum_functions::{Arity, Function, Functions};
pub use vellum_runtime::{State, StructField, StructType, Tag, Type, Value};

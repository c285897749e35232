// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Function Registry.
//!
//! Functions are invoked from template expressions with method syntax:
//! `name.upper()` calls `upper` with the value of `name` as argument zero,
//! `name.repeat(3)` calls `repeat(name, 3)`.
//!
//! # Architecture
//!
//! Built-in functions register themselves at link time into the
//! [`BUILTINS`] distributed slice. A [`Functions`] registry resolves names
//! against user registrations first and built-ins second, so user
//! functions can shadow a built-in of the same name.
//!
//! # Example Lookup
//!
//! ```ignore
//! use vellum_functions::Functions;
//!
//! let functions = Functions::new();
//! let upper = functions.lookup_by_name("upper").unwrap();
//! assert!(upper.arity.accepts(1));
//! ```

mod builtins;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use linkme::distributed_slice;
use tracing::debug;
use vellum_runtime::{Type, Value};

pub use linkme;

/// Signature of built-in functions. Argument zero is the receiver.
pub type InvokeFn = fn(&[Value]) -> Value;

/// Shared implementation of a resolved function.
pub type Invoke = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Arity specification for a function, receiver included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Fixed number of arguments
    Fixed(usize),
    /// Variadic (any number of arguments)
    Variadic,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => *n == count,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variadic => f.write_str("any"),
        }
    }
}

/// Descriptor for a built-in function.
pub struct FunctionDescriptor {
    /// Template name (e.g., "upper", "repeat")
    pub name: &'static str,
    /// Full signature string (e.g., "repeat(text, count) -> string")
    pub signature: &'static str,
    /// Documentation string
    pub doc: &'static str,
    pub arity: Arity,
    pub result_type: Type,
    pub invoke: InvokeFn,
}

/// Distributed slice collecting all built-in function registrations.
#[distributed_slice]
pub static BUILTINS: [FunctionDescriptor];

/// Resolved function handed to the compiler.
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub arity: Arity,
    pub result_type: Type,
    pub invoke: Invoke,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, arity: Arity, result_type: Type, invoke: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            result_type,
            invoke: Arc::new(invoke),
        }
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.invoke)(args)
    }
}

impl From<&'static FunctionDescriptor> for Function {
    fn from(descriptor: &'static FunctionDescriptor) -> Self {
        Self::new(
            descriptor.name,
            descriptor.arity,
            descriptor.result_type.clone(),
            descriptor.invoke,
        )
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}

/// Get a built-in descriptor by name.
pub fn builtin(name: &str) -> Option<&'static FunctionDescriptor> {
    BUILTINS.iter().find(|f| f.name == name)
}

/// Function registry: user registrations layered over built-ins.
#[derive(Clone, Default)]
pub struct Functions {
    user: IndexMap<String, Function>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user function; replaces an earlier registration and
    /// shadows a built-in of the same name.
    pub fn register(&mut self, function: Function) {
        debug!(name = %function.name, arity = %function.arity, "register function");
        self.user.insert(function.name.clone(), function);
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<Function> {
        self.user
            .get(name)
            .cloned()
            .or_else(|| builtin(name).map(Function::from))
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.user.contains_key(name) || builtin(name).is_some()
    }

    /// All resolvable names, built-ins first.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTINS
            .iter()
            .map(|f| f.name.to_string())
            .filter(|name| !self.user.contains_key(name))
            .collect();
        names.extend(self.user.keys().cloned());
        names
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functions")
            .field("user", &self.user.keys().collect::<Vec<_>>())
            .finish()
    }
}

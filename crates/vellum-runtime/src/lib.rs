// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Vellum Runtime
//!
//! Execution primitives for compiled templates: the structural type model,
//! the record layout every variable and temporary is packed into, the
//! per-evaluation [`State`], and the build-once/run-many [`Compute`]
//! closures the planner produces.

pub mod compute;
pub mod error;
pub mod layout;
pub mod ops;
pub mod state;
pub mod types;
pub mod value;

pub use compute::{Compute, Control, New, Operand, compute, deferred};
pub use error::{Error, Result};
pub use layout::{FieldAccessor, FieldDescriptor, ScopeType};
pub use ops::{BinaryFn, binary};
pub use state::{Buffer, Diagnostic, State};
pub use types::{FieldPath, StructField, StructType, Tag, Type};
pub use value::Value;

//! Built-in functions.

use linkme::distributed_slice;
use tracing::debug;
use vellum_runtime::{Type, Value};

use crate::{Arity, BUILTINS, FunctionDescriptor};

/// Largest result `repeat` will build, in bytes.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

fn text(args: &[Value], index: usize) -> String {
    args.get(index).map(ToString::to_string).unwrap_or_default()
}

#[distributed_slice(BUILTINS)]
static UPPER: FunctionDescriptor = FunctionDescriptor {
    name: "upper",
    signature: "upper(text) -> string",
    doc: "Uppercase copy of the text",
    arity: Arity::Fixed(1),
    result_type: Type::Str,
    invoke: |args| Value::Str(text(args, 0).to_uppercase()),
};

#[distributed_slice(BUILTINS)]
static LOWER: FunctionDescriptor = FunctionDescriptor {
    name: "lower",
    signature: "lower(text) -> string",
    doc: "Lowercase copy of the text",
    arity: Arity::Fixed(1),
    result_type: Type::Str,
    invoke: |args| Value::Str(text(args, 0).to_lowercase()),
};

#[distributed_slice(BUILTINS)]
static TRIM: FunctionDescriptor = FunctionDescriptor {
    name: "trim",
    signature: "trim(text) -> string",
    doc: "Text without leading and trailing whitespace",
    arity: Arity::Fixed(1),
    result_type: Type::Str,
    invoke: |args| Value::Str(text(args, 0).trim().to_string()),
};

#[distributed_slice(BUILTINS)]
static LEN: FunctionDescriptor = FunctionDescriptor {
    name: "len",
    signature: "len(value) -> int",
    doc: "Number of characters of a string or items of a slice",
    arity: Arity::Fixed(1),
    result_type: Type::Int,
    invoke: |args| {
        let len = match args.first().map(Value::deref) {
            Some(Value::Str(s)) => s.chars().count(),
            Some(Value::Slice { items, .. }) => items.len(),
            _ => 0,
        };
        Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
    },
};

#[distributed_slice(BUILTINS)]
static CONCAT: FunctionDescriptor = FunctionDescriptor {
    name: "concat",
    signature: "concat(left, right) -> string",
    doc: "Display forms of both values joined",
    arity: Arity::Fixed(2),
    result_type: Type::Str,
    invoke: |args| Value::Str(text(args, 0) + &text(args, 1)),
};

#[distributed_slice(BUILTINS)]
static ABS: FunctionDescriptor = FunctionDescriptor {
    name: "abs",
    signature: "abs(x) -> float",
    doc: "Absolute value",
    arity: Arity::Fixed(1),
    result_type: Type::Float,
    invoke: |args| Value::Float(args.first().map_or(0.0, Value::as_f64).abs()),
};

#[distributed_slice(BUILTINS)]
static STRING: FunctionDescriptor = FunctionDescriptor {
    name: "string",
    signature: "string(value) -> string",
    doc: "Display form of any value",
    arity: Arity::Fixed(1),
    result_type: Type::Str,
    invoke: |args| Value::Str(text(args, 0)),
};

#[distributed_slice(BUILTINS)]
static REPEAT: FunctionDescriptor = FunctionDescriptor {
    name: "repeat",
    signature: "repeat(text, count) -> string",
    doc: "Text repeated count times; negative counts or results over MAX_REPEAT_LEN bytes yield empty text",
    arity: Arity::Fixed(2),
    result_type: Type::Str,
    invoke: |args| {
        let base = text(args, 0);
        let count = usize::try_from(args.get(1).map_or(0, Value::as_i64)).unwrap_or(0);
        match base.len().checked_mul(count) {
            Some(len) if len <= MAX_REPEAT_LEN => Value::Str(base.repeat(count)),
            _ => {
                debug!(len = base.len(), count, "repeat result too large");
                Value::Str(String::new())
            }
        }
    },
};

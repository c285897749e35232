//! Binary operator kernels.
//!
//! Kernels are selected once at compile time from the operator, the
//! unified result type and the operand types. Selection fails for
//! combinations the runtime cannot evaluate.

use tracing::debug;
use vellum_ast::BinaryOp;

use crate::error::{Error, Result};
use crate::types::Type;
use crate::value::Value;

/// Kernel combining two operand values.
pub type BinaryFn = fn(&Value, &Value) -> Value;

/// Select the kernel for `left <op> right` producing `result`.
pub fn binary(op: BinaryOp, result: &Type, left: &Type, right: &Type) -> Result<BinaryFn> {
    let (left, right) = (left.deref(), right.deref());
    let unsupported = || Error::Unsupported {
        op: op.symbol().to_string(),
        ty: result.to_string(),
    };

    let kernel = if op.is_logical() {
        logical(op, left, right)
    } else if op.is_comparison() {
        comparison(op, left, right)
    } else {
        arithmetic(op, result.deref(), left, right)
    };
    kernel.ok_or_else(unsupported)
}

fn logical(op: BinaryOp, left: &Type, right: &Type) -> Option<BinaryFn> {
    if !matches!((left, right), (Type::Bool, Type::Bool)) {
        return None;
    }
    let kernel: BinaryFn = match op {
        BinaryOp::And => |a, b| Value::Bool(a.as_bool() && b.as_bool()),
        BinaryOp::Or => |a, b| Value::Bool(a.as_bool() || b.as_bool()),
        _ => return None,
    };
    Some(kernel)
}

fn comparison(op: BinaryOp, left: &Type, right: &Type) -> Option<BinaryFn> {
    let kernel: BinaryFn = match (left, right) {
        (Type::Float, r) if r.is_numeric() => float_comparison(op)?,
        (l, Type::Float) if l.is_numeric() => float_comparison(op)?,
        (Type::Int, Type::Int) => match op {
            BinaryOp::Eq => |a, b| Value::Bool(a.as_i64() == b.as_i64()),
            BinaryOp::Ne => |a, b| Value::Bool(a.as_i64() != b.as_i64()),
            BinaryOp::Lt => |a, b| Value::Bool(a.as_i64() < b.as_i64()),
            BinaryOp::Le => |a, b| Value::Bool(a.as_i64() <= b.as_i64()),
            BinaryOp::Gt => |a, b| Value::Bool(a.as_i64() > b.as_i64()),
            BinaryOp::Ge => |a, b| Value::Bool(a.as_i64() >= b.as_i64()),
            _ => return None,
        },
        (Type::Str, Type::Str) => match op {
            BinaryOp::Eq => |a, b| Value::Bool(a.as_str() == b.as_str()),
            BinaryOp::Ne => |a, b| Value::Bool(a.as_str() != b.as_str()),
            BinaryOp::Lt => |a, b| Value::Bool(a.as_str() < b.as_str()),
            BinaryOp::Le => |a, b| Value::Bool(a.as_str() <= b.as_str()),
            BinaryOp::Gt => |a, b| Value::Bool(a.as_str() > b.as_str()),
            BinaryOp::Ge => |a, b| Value::Bool(a.as_str() >= b.as_str()),
            _ => return None,
        },
        (Type::Bool, Type::Bool) => match op {
            BinaryOp::Eq => |a, b| Value::Bool(a.as_bool() == b.as_bool()),
            BinaryOp::Ne => |a, b| Value::Bool(a.as_bool() != b.as_bool()),
            _ => return None,
        },
        _ => return None,
    };
    Some(kernel)
}

fn float_comparison(op: BinaryOp) -> Option<BinaryFn> {
    let kernel: BinaryFn = match op {
        BinaryOp::Eq => |a, b| Value::Bool(a.as_f64() == b.as_f64()),
        BinaryOp::Ne => |a, b| Value::Bool(a.as_f64() != b.as_f64()),
        BinaryOp::Lt => |a, b| Value::Bool(a.as_f64() < b.as_f64()),
        BinaryOp::Le => |a, b| Value::Bool(a.as_f64() <= b.as_f64()),
        BinaryOp::Gt => |a, b| Value::Bool(a.as_f64() > b.as_f64()),
        BinaryOp::Ge => |a, b| Value::Bool(a.as_f64() >= b.as_f64()),
        _ => return None,
    };
    Some(kernel)
}

fn arithmetic(op: BinaryOp, result: &Type, left: &Type, right: &Type) -> Option<BinaryFn> {
    match result {
        Type::Str => {
            if op != BinaryOp::Add {
                return None;
            }
            let kernel: BinaryFn = |a, b| Value::Str(format!("{}{}", a, b));
            Some(kernel)
        }
        Type::Int if left.is_numeric() && right.is_numeric() => {
            let kernel: BinaryFn = match op {
                BinaryOp::Add => |a, b| Value::Int(a.as_i64().wrapping_add(b.as_i64())),
                BinaryOp::Sub => |a, b| Value::Int(a.as_i64().wrapping_sub(b.as_i64())),
                BinaryOp::Mul => |a, b| Value::Int(a.as_i64().wrapping_mul(b.as_i64())),
                BinaryOp::Div => |a, b| match a.as_i64().checked_div(b.as_i64()) {
                    Some(n) => Value::Int(n),
                    None => {
                        debug!(left = %a, right = %b, "integer division by zero");
                        Value::Nil
                    }
                },
                BinaryOp::Mod => |a, b| match a.as_i64().checked_rem(b.as_i64()) {
                    Some(n) => Value::Int(n),
                    None => {
                        debug!(left = %a, right = %b, "integer remainder by zero");
                        Value::Nil
                    }
                },
                _ => return None,
            };
            Some(kernel)
        }
        Type::Float if left.is_numeric() && right.is_numeric() => {
            let kernel: BinaryFn = match op {
                BinaryOp::Add => |a, b| Value::Float(a.as_f64() + b.as_f64()),
                BinaryOp::Sub => |a, b| Value::Float(a.as_f64() - b.as_f64()),
                BinaryOp::Mul => |a, b| Value::Float(a.as_f64() * b.as_f64()),
                BinaryOp::Div => |a, b| Value::Float(a.as_f64() / b.as_f64()),
                BinaryOp::Mod => |a, b| Value::Float(a.as_f64() % b.as_f64()),
                _ => return None,
            };
            Some(kernel)
        }
        _ => None,
    }
}

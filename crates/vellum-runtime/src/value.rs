//! Runtime values.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{StructType, Type};

/// A value stored in a record slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value; renders as empty text.
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Possibly-nil pointer. The element type is kept so a nil pointer
    /// still knows what it points to.
    Ptr {
        elem: Type,
        target: Option<Box<Value>>,
    },
    Struct {
        ty: Arc<StructType>,
        fields: Vec<Value>,
    },
    Slice {
        elem: Type,
        items: Vec<Value>,
    },
}

impl Value {
    /// Zero value of a type: false, 0, empty string, nil pointer, empty
    /// slice, or a struct of zero members.
    pub fn zero(ty: &Type) -> Value {
        match ty {
            Type::Bool => Value::Bool(false),
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::Str => Value::Str(String::new()),
            Type::Ptr(elem) => Value::Ptr {
                elem: (**elem).clone(),
                target: None,
            },
            Type::Slice(elem) => Value::Slice {
                elem: (**elem).clone(),
                items: Vec::new(),
            },
            Type::Struct(st) => Value::Struct {
                ty: Arc::clone(st),
                fields: st.fields.iter().map(|f| Value::zero(&f.ty)).collect(),
            },
        }
    }

    /// Build a struct value from named members; members not listed keep
    /// their zero value.
    pub fn record<'a>(
        ty: &Arc<StructType>,
        members: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Result<Value> {
        let mut fields: Vec<Value> = ty.fields.iter().map(|f| Value::zero(&f.ty)).collect();
        for (name, value) in members {
            let index = ty.index_of(name).ok_or_else(|| Error::UnknownField {
                field: name.to_string(),
                ty: ty.to_string(),
            })?;
            fields[index] = value;
        }
        Ok(Value::Struct {
            ty: Arc::clone(ty),
            fields,
        })
    }

    /// Pointer to `value`. A nil value yields nil.
    pub fn ptr_to(value: Value) -> Value {
        match value.type_of() {
            Some(elem) => Value::Ptr {
                elem,
                target: Some(Box::new(value)),
            },
            None => Value::Nil,
        }
    }

    pub fn slice(elem: Type, items: Vec<Value>) -> Value {
        Value::Slice { elem, items }
    }

    /// Dynamic type; `None` for nil.
    pub fn type_of(&self) -> Option<Type> {
        Some(match self {
            Value::Nil => return None,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Str(_) => Type::Str,
            Value::Ptr { elem, .. } => Type::ptr(elem.clone()),
            Value::Struct { ty, .. } => Type::Struct(Arc::clone(ty)),
            Value::Slice { elem, .. } => Type::slice(elem.clone()),
        })
    }

    /// Whether this value may be stored in a slot of type `ty`.
    /// Nil is accepted for pointers and slices.
    pub fn conforms(&self, ty: &Type) -> bool {
        match self {
            Value::Nil => matches!(ty, Type::Ptr(_) | Type::Slice(_)),
            other => other.type_of().as_ref() == Some(ty),
        }
    }

    /// Follow pointers to the first non-pointer value. A nil pointer is
    /// returned as is.
    pub fn deref(&self) -> &Value {
        let mut value = self;
        while let Value::Ptr {
            target: Some(inner),
            ..
        } = value
        {
            value = &**inner;
        }
        value
    }

    /// Struct member by index, through any pointers.
    pub fn member(&self, index: usize) -> Option<&Value> {
        match self.deref() {
            Value::Struct { fields, .. } => fields.get(index),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self.deref() {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self.deref() {
            Value::Int(n) => *n,
            Value::Float(n) => *n as i64,
            Value::Bool(b) => i64::from(*b),
            _ => 0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self.deref() {
            Value::Int(n) => *n as f64,
            Value::Float(n) => *n,
            Value::Bool(b) => f64::from(u8::from(*b)),
            _ => 0.0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.deref() {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil | Value::Ptr { target: None, .. })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Ptr { target, .. } => match target {
                Some(inner) => fmt::Display::fmt(inner, f),
                None => Ok(()),
            },
            Value::Struct { fields, .. } => write_joined(f, "{", fields, "}"),
            Value::Slice { items, .. } => write_joined(f, "[", items, "]"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

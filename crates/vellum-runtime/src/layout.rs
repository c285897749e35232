//! Record layout.
//!
//! A [`ScopeType`] is the single memory record of one compiled template.
//! Every variable and every compiler temporary is appended to it exactly
//! once; fields are never moved or removed, so accessors handed out early
//! in compilation stay valid for the life of the layout.
//!
//! Offsets are packed: each field starts at the sum of the sizes of all
//! fields appended before it, without alignment padding. They are kept
//! for bookkeeping only. Runtime storage is addressed by slot index.

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{Error, Result};
use crate::types::{StructField, StructType, Type};
use crate::value::Value;

/// Structural descriptor of one record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Unique field identifier inside the layout.
    pub id: String,
    /// Display name.
    pub name: String,
    pub ty: Type,
    /// Packed byte offset.
    pub offset: usize,
    /// Members of an anonymous field are promoted into the enclosing scope.
    pub anonymous: bool,
}

/// Raw get/set handle bound to one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccessor {
    /// Position in the memory block.
    pub slot: usize,
    pub offset: usize,
    pub ty: Type,
}

impl FieldAccessor {
    pub fn get<'m>(&self, memory: &'m [Value]) -> Option<&'m Value> {
        memory.get(self.slot)
    }

    pub fn set(&self, memory: &mut [Value], value: Value) {
        if let Some(slot) = memory.get_mut(self.slot) {
            *slot = value;
        }
    }
}

/// Append-only record layout shared by all variables and temporaries of
/// one compiled template.
#[derive(Debug, Clone, Default)]
pub struct ScopeType {
    fields: Vec<FieldDescriptor>,
    accessors: Vec<FieldAccessor>,
    index: IndexMap<String, usize>,
    size: usize,
}

impl ScopeType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named field at the end of the record.
    pub fn add_field(&mut self, id: &str, name: &str, ty: Type) -> Result<FieldDescriptor> {
        self.append(id, name, ty, false)
    }

    /// Append an anonymous field whose members are promoted.
    pub fn embed_field(&mut self, id: &str, name: &str, ty: Type) -> Result<FieldDescriptor> {
        self.append(id, name, ty, true)
    }

    fn append(&mut self, id: &str, name: &str, ty: Type, anonymous: bool) -> Result<FieldDescriptor> {
        if self.index.contains_key(id) {
            return Err(Error::DuplicateField(id.to_string()));
        }

        let slot = self.fields.len();
        let offset = self.size;
        self.size += ty.size();

        let descriptor = FieldDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            ty: ty.clone(),
            offset,
            anonymous,
        };
        trace!(id, slot, offset, ty = %ty, anonymous, "append record field");

        self.accessors.push(FieldAccessor { slot, offset, ty });
        self.fields.push(descriptor.clone());
        self.index.insert(id.to_string(), slot);
        Ok(descriptor)
    }

    /// Accessor bound to the field `id`.
    pub fn accessor(&self, id: &str) -> Option<&FieldAccessor> {
        self.index.get(id).and_then(|&slot| self.accessors.get(slot))
    }

    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.index.get(id).and_then(|&slot| self.fields.get(slot))
    }

    /// Fields in append order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total packed size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Structural type of the whole record.
    pub fn struct_type(&self) -> StructType {
        StructType {
            name: String::new(),
            fields: self
                .fields
                .iter()
                .map(|f| {
                    let field = StructField::new(f.id.clone(), f.ty.clone());
                    StructField {
                        anonymous: f.anonymous,
                        ..field
                    }
                })
                .collect(),
        }
    }

    /// Fresh memory block with every slot at its zero value.
    pub fn zero_memory(&self) -> Vec<Value> {
        self.fields.iter().map(|f| Value::zero(&f.ty)).collect()
    }
}

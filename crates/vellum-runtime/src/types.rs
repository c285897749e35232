//! Structural type model.
//!
//! Every value a template can reach is described by an explicit [`Type`]:
//! scalars, pointers, structs and slices. Structs list their members as
//! [`StructField`]s carrying a [`Tag`] with the template-facing options
//! (alternate names, child prefix, omission).

use std::fmt;
use std::sync::Arc;

/// Value type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Bool,
    Int,
    Float,
    Str,
    /// Pointer to a value of the element type; may be nil.
    Ptr(Box<Type>),
    Struct(Arc<StructType>),
    /// Sequence of values of the element type.
    Slice(Box<Type>),
}

impl Type {
    pub fn ptr(elem: Type) -> Type {
        Type::Ptr(Box::new(elem))
    }

    pub fn slice(elem: Type) -> Type {
        Type::Slice(Box::new(elem))
    }

    pub fn structure(ty: StructType) -> Type {
        Type::Struct(Arc::new(ty))
    }

    /// Size in bytes used for record offset bookkeeping.
    ///
    /// Sizes follow a 64-bit layout; structs are packed without padding.
    pub fn size(&self) -> usize {
        match self {
            Type::Bool => 1,
            Type::Int | Type::Float => 8,
            Type::Str => 16,
            Type::Ptr(_) => 8,
            Type::Slice(_) => 24,
            Type::Struct(st) => st.fields.iter().map(|f| f.ty.size()).sum(),
        }
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Strip every level of pointer indirection.
    pub fn deref(&self) -> &Type {
        let mut ty = self;
        while let Type::Ptr(elem) = ty {
            ty = &**elem;
        }
        ty
    }

    /// Struct type behind any number of pointers.
    pub fn as_struct(&self) -> Option<&Arc<StructType>> {
        match self.deref() {
            Type::Struct(st) => Some(st),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => f.write_str("bool"),
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Str => f.write_str("string"),
            Type::Ptr(elem) => write!(f, "*{}", elem),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Struct(st) => fmt::Display::fmt(st, f),
        }
    }
}

/// Struct type: an ordered list of named members.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructType {
    /// Display name; empty for anonymous struct literals.
    pub name: String,
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a named member.
    pub fn field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push(StructField::new(name, ty));
        self
    }

    /// Append a named member with template options.
    pub fn tagged(mut self, name: impl Into<String>, ty: Type, tag: Tag) -> Self {
        self.fields.push(StructField::new(name, ty).with_tag(tag));
        self
    }

    /// Append an anonymous member whose own members are promoted.
    pub fn embed(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.push(StructField::embedded(name, ty));
        self
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Find a member by exact name, including members promoted through
    /// anonymous fields.
    ///
    /// The shallowest match wins; two matches at the same depth are
    /// ambiguous and yield `None`.
    pub fn field_by_name(&self, name: &str) -> Option<FieldPath> {
        let mut frontier: Vec<(Vec<usize>, &StructType)> = vec![(Vec::new(), self)];

        while !frontier.is_empty() {
            let mut found: Option<FieldPath> = None;
            let mut ambiguous = false;
            let mut next = Vec::new();

            for (prefix, st) in &frontier {
                for (i, field) in st.fields.iter().enumerate() {
                    let mut indices = prefix.clone();
                    indices.push(i);
                    if field.name == name {
                        if found.is_some() {
                            ambiguous = true;
                        }
                        found = Some(FieldPath {
                            indices: indices.clone(),
                            field: field.clone(),
                        });
                    }
                    if field.anonymous {
                        if let Some(inner) = field.ty.as_struct() {
                            next.push((indices, inner.as_ref()));
                        }
                    }
                }
            }

            if ambiguous {
                return None;
            }
            if found.is_some() {
                return found;
            }
            frontier = next;
        }
        None
    }

    /// Find a direct member whose tag lists `name` as an alternate name.
    pub fn field_by_tag_name(&self, name: &str) -> Option<FieldPath> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.tag.name_equal(name))
            .map(|(i, f)| FieldPath {
                indices: vec![i],
                field: f.clone(),
            })
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            return f.write_str(&self.name);
        }
        f.write_str("struct{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            if field.anonymous {
                write!(f, "{}", field.ty)?;
            } else {
                write!(f, "{} {}", field.name, field.ty)?;
            }
        }
        f.write_str("}")
    }
}

/// Struct member descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub tag: Tag,
    /// Members of an anonymous field are reachable without its name.
    pub anonymous: bool,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: Tag::default(),
            anonymous: false,
        }
    }

    pub fn embedded(name: impl Into<String>, ty: Type) -> Self {
        Self {
            anonymous: true,
            ..Self::new(name, ty)
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }
}

/// Result of a member lookup: index path from the searched struct plus
/// the member itself. Paths longer than one step cross anonymous fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    pub indices: Vec<usize>,
    pub field: StructField,
}

/// Template options attached to a struct member.
///
/// Parsed from a comma-separated list:
///
/// - `prefix=<ns>` - prepended to the ids of this field's children
/// - `names=<a>|<b>` - alternate names the field is also reachable by;
///   the field name itself stays valid
/// - `omit` (or `-`) - the field cannot be reached from expressions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    pub prefix: String,
    pub names: Vec<String>,
    pub omit: bool,
}

impl Tag {
    pub fn parse(tag: &str) -> Tag {
        let mut result = Tag::default();
        for part in tag.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some(("prefix", value)) => result.prefix = value.trim().to_string(),
                Some(("names", value)) => {
                    result.names = value
                        .split('|')
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .map(String::from)
                        .collect();
                }
                None if part == "omit" || part == "-" => result.omit = true,
                _ => {}
            }
        }
        result
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Tag {
        Tag {
            prefix: prefix.into(),
            ..Tag::default()
        }
    }

    pub fn name_equal(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

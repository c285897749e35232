//! Selector graph.
//!
//! A [`Selector`] is a named access path into the record layout. Selectors
//! live in one arena owned by the planner; a child refers to its parent by
//! [`SelectorId`] and every parent is created before its children.
//!
//! Composite ids join the steps of a path with [`SEPARATOR`], so the
//! selector for `p.Address.City` has the id `p___Address___City`. Error
//! messages render ids dot-joined through [`display_id`].

use std::ops::{Index, IndexMut};

use indexmap::IndexMap;
use vellum_functions::Function;
use vellum_runtime::{Compute, FieldAccessor, Operand, State, Type, Value, compute};

use crate::error::{CompileError, Result};

/// Separator joining the steps of a composite selector id.
pub const SEPARATOR: &str = "___";

/// Human-readable form of a composite id.
pub fn display_id(id: &str) -> String {
    id.replace(SEPARATOR, ".")
}

/// Composite id for a human-readable dotted path.
pub fn composite_id(path: &str) -> String {
    path.replace('.', SEPARATOR)
}

/// Position of a selector in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectorId(usize);

impl SelectorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a selector reaches its value.
#[derive(Debug, Clone)]
pub enum Access {
    /// Value stored directly in a record slot.
    Slot(FieldAccessor),
    /// Struct member path walked from the parent selector's value. Paths
    /// longer than one step cross anonymous fields.
    Member(Vec<usize>),
    /// Function call whose result is stored in a temporary slot.
    Call(Call),
}

/// Function call bound at compile time.
#[derive(Debug, Clone)]
pub struct Call {
    pub function: Function,
    /// Argument operands; the receiver is argument zero.
    pub args: Vec<Operand>,
    /// Temporary receiving the result.
    pub result: FieldAccessor,
    /// Control resource holding the argument scratch vector.
    pub control: usize,
}

/// One named access path.
#[derive(Debug, Clone)]
pub struct Selector {
    pub id: String,
    pub name: String,
    pub ty: Type,
    pub parent: Option<SelectorId>,
    pub access: Access,
    /// Access traverses at least one pointer.
    pub indirect: bool,
    /// Root of an embedded variable; hidden from name lookup.
    pub embedded: bool,
    /// Compiler temporary or call result.
    pub transient: bool,
}

impl Selector {
    pub fn new(id: impl Into<String>, name: impl Into<String>, ty: Type, access: Access) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ty,
            parent: None,
            access,
            indirect: false,
            embedded: false,
            transient: false,
        }
    }

    pub fn with_parent(mut self, parent: SelectorId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn accessor(&self) -> Option<&FieldAccessor> {
        match &self.access {
            Access::Slot(accessor) => Some(accessor),
            Access::Call(call) => Some(&call.result),
            Access::Member(_) => None,
        }
    }
}

/// Arena of selectors plus a name index.
#[derive(Debug, Clone, Default)]
pub struct Selectors {
    nodes: Vec<Selector>,
    index: IndexMap<String, SelectorId>,
}

impl Selectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a selector reachable by its id.
    pub fn insert(&mut self, selector: Selector) -> Result<SelectorId> {
        if selector.id.is_empty() {
            return Err(CompileError::EmptySelectorId);
        }
        if self.index.contains_key(&selector.id) {
            return Err(CompileError::Duplicate(display_id(&selector.id)));
        }
        let key = selector.id.clone();
        let id = self.push(selector);
        self.index.insert(key, id);
        Ok(id)
    }

    /// Add a selector that is not reachable by name.
    pub fn push(&mut self, selector: Selector) -> SelectorId {
        let id = SelectorId(self.nodes.len());
        self.nodes.push(selector);
        id
    }

    pub fn lookup(&self, id: &str) -> Option<SelectorId> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: SelectorId) -> Option<&Selector> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SelectorId, &Selector)> {
        self.nodes.iter().enumerate().map(|(i, s)| (SelectorId(i), s))
    }

    /// Computation reading the current value of a selector.
    ///
    /// Member paths are flattened down to the nearest slot or call root.
    /// A nil pointer anywhere on the path yields the zero value of the
    /// selector's type.
    pub fn reader(&self, id: SelectorId) -> Compute {
        let ty = self[id].ty.clone();
        let mut segments: Vec<&[usize]> = Vec::new();
        let mut current = &self[id];

        let root = loop {
            match &current.access {
                Access::Slot(accessor) => break Root::Slot(accessor.slot),
                Access::Call(call) => break Root::Call(call_compute(call)),
                Access::Member(path) => {
                    segments.push(path);
                    match current.parent {
                        Some(parent) => current = &self[parent],
                        None => return compute(move |_| Value::zero(&ty)),
                    }
                }
            }
        };
        let path: Vec<usize> = segments.into_iter().rev().flatten().copied().collect();

        match root {
            Root::Slot(slot) if path.is_empty() => compute(move |state| state.load(slot)),
            Root::Slot(slot) => compute(move |state| {
                state
                    .slot(slot)
                    .and_then(|value| walk(value, &path))
                    .cloned()
                    .unwrap_or_else(|| Value::zero(&ty))
            }),
            Root::Call(call) if path.is_empty() => call,
            Root::Call(call) => compute(move |state| {
                let value = call(state);
                walk(&value, &path)
                    .cloned()
                    .unwrap_or_else(|| Value::zero(&ty))
            }),
        }
    }
}

impl Index<SelectorId> for Selectors {
    type Output = Selector;

    fn index(&self, id: SelectorId) -> &Selector {
        &self.nodes[id.0]
    }
}

impl IndexMut<SelectorId> for Selectors {
    fn index_mut(&mut self, id: SelectorId) -> &mut Selector {
        &mut self.nodes[id.0]
    }
}

enum Root {
    Slot(usize),
    Call(Compute),
}

fn walk<'v>(value: &'v Value, path: &[usize]) -> Option<&'v Value> {
    path.iter().try_fold(value, |value, &index| value.member(index))
}

fn call_compute(call: &Call) -> Compute {
    let Call {
        function,
        args,
        result,
        control,
    } = call.clone();

    compute(move |state: &mut State| {
        let mut scratch = state.take_resource(control);
        for arg in &args {
            let value = arg.exec(state);
            scratch.push(value);
        }
        let value = function.call(&scratch);
        state.restore_resource(control, scratch);
        state.store(result.slot, value.clone());
        value
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vellum_runtime::{ScopeType, StructType};

    use super::*;

    fn person() -> Type {
        Type::structure(StructType::new("Person").field("Name", Type::Str))
    }

    #[test]
    fn test_display_id() {
        assert_eq!(display_id("a___b___c"), "a.b.c");
        assert_eq!(composite_id("a.b"), "a___b");
    }

    #[test]
    fn test_insert_rejects_duplicates_and_empty_ids() {
        let mut graph = Selectors::new();
        let accessor = FieldAccessor {
            slot: 0,
            offset: 0,
            ty: Type::Int,
        };
        graph
            .insert(Selector::new("x", "x", Type::Int, Access::Slot(accessor.clone())))
            .unwrap();
        let err = graph
            .insert(Selector::new("x", "x", Type::Int, Access::Slot(accessor.clone())))
            .unwrap_err();
        assert_eq!(err, CompileError::Duplicate("x".to_string()));
        let err = graph
            .insert(Selector::new("", "", Type::Int, Access::Slot(accessor)))
            .unwrap_err();
        assert_eq!(err, CompileError::EmptySelectorId);
    }

    #[test]
    fn test_detached_selectors_are_not_indexed() {
        let mut graph = Selectors::new();
        let id = graph.push(Selector::new("_T0", "_T0", Type::Int, Access::Member(vec![])));
        assert_eq!(graph.len(), 1);
        assert!(graph.lookup("_T0").is_none());
        assert_eq!(graph[id].name, "_T0");
    }

    #[test]
    fn test_reader_walks_member_path_through_pointer() {
        let mut layout = ScopeType::new();
        let ty = Type::ptr(person());
        layout.add_field("p", "p", ty.clone()).unwrap();
        let accessor = layout.accessor("p").cloned().unwrap();

        let mut graph = Selectors::new();
        let root = graph
            .insert(Selector::new("p", "p", ty, Access::Slot(accessor)))
            .unwrap();
        let name = graph
            .insert(
                Selector::new("p___Name", "Name", Type::Str, Access::Member(vec![0]))
                    .with_parent(root),
            )
            .unwrap();

        let reader = graph.reader(name);
        let mut state = State::new(Arc::new(layout), 0, 0);
        assert_eq!(reader(&mut state), Value::from(""));

        let Type::Ptr(elem) = &graph[root].ty else {
            panic!("expected pointer");
        };
        let st = elem.as_struct().unwrap();
        let record = Value::record(st, [("Name", Value::from("A"))]).unwrap();
        state.set_value("p", Value::ptr_to(record)).unwrap();
        assert_eq!(reader(&mut state), Value::from("A"));
    }
}

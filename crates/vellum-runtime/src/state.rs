//! Per-evaluation execution state.

use std::error::Error as StdError;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::layout::ScopeType;
use crate::value::Value;

/// Boxed diagnostic recorded by degraded evaluations.
pub type Diagnostic = Box<dyn StdError + Send + Sync>;

/// Output buffer rendered text is appended to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    text: String,
}

impl Buffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
        }
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Append the display form of a value.
    pub fn push_value(&mut self, value: &Value) {
        // Writing into a String cannot fail.
        let _ = write!(self.text, "{}", value);
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Remove and return everything written after byte position `at`.
    pub fn split_off(&mut self, at: usize) -> String {
        if at >= self.text.len() {
            return String::new();
        }
        self.text.split_off(at)
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Execution state for one evaluation of a compiled template.
///
/// Owns the memory block laid out by a [`ScopeType`], the output buffer,
/// the control resources minted at compile time and a diagnostics list.
/// A state is never shared between concurrent evaluations.
pub struct State {
    layout: Arc<ScopeType>,
    memory: Vec<Value>,
    buffer: Buffer,
    resources: Vec<Vec<Value>>,
    diagnostics: Vec<Diagnostic>,
}

impl State {
    /// Zeroed state for `layout` with `controls` resource slots.
    pub fn new(layout: Arc<ScopeType>, controls: usize, buffer_size: usize) -> Self {
        let memory = layout.zero_memory();
        Self {
            layout,
            memory,
            buffer: Buffer::with_capacity(buffer_size),
            resources: vec![Vec::new(); controls],
            diagnostics: Vec::new(),
        }
    }

    pub fn layout(&self) -> &Arc<ScopeType> {
        &self.layout
    }

    /// Bind a value to the field `id`, checking it against the field type.
    pub fn set_value(&mut self, id: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let accessor = self
            .layout
            .accessor(id)
            .ok_or_else(|| Error::UnknownVariable(id.to_string()))?;

        if !value.conforms(&accessor.ty) {
            return Err(Error::TypeMismatch {
                id: id.to_string(),
                expected: accessor.ty.to_string(),
                found: value
                    .type_of()
                    .map_or_else(|| "nil".to_string(), |ty| ty.to_string()),
            });
        }

        accessor.set(&mut self.memory, value);
        Ok(())
    }

    pub fn value(&self, id: &str) -> Result<&Value> {
        self.layout
            .accessor(id)
            .and_then(|accessor| accessor.get(&self.memory))
            .ok_or_else(|| Error::UnknownVariable(id.to_string()))
    }

    /// Read a slot; out of range slots read as nil.
    pub fn load(&self, slot: usize) -> Value {
        self.memory.get(slot).cloned().unwrap_or_default()
    }

    pub fn slot(&self, slot: usize) -> Option<&Value> {
        self.memory.get(slot)
    }

    pub fn store(&mut self, slot: usize, value: Value) {
        if let Some(target) = self.memory.get_mut(slot) {
            *target = value;
        }
    }

    pub fn memory(&self) -> &[Value] {
        &self.memory
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    /// Swap the output buffer, returning the previous one.
    pub fn replace_buffer(&mut self, buffer: Buffer) -> Buffer {
        std::mem::replace(&mut self.buffer, buffer)
    }

    pub fn output(&self) -> &str {
        self.buffer.as_str()
    }

    /// Take the scratch vector of a control resource. Pair with
    /// [`State::restore_resource`] so the allocation is reused.
    pub fn take_resource(&mut self, index: usize) -> Vec<Value> {
        self.resources
            .get_mut(index)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn restore_resource(&mut self, index: usize, mut scratch: Vec<Value>) {
        scratch.clear();
        if let Some(slot) = self.resources.get_mut(index) {
            *slot = scratch;
        }
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn push_diagnostic(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.diagnostics.push(diagnostic.into());
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("memory", &self.memory)
            .field("buffer", &self.buffer)
            .field("resources", &self.resources.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn state() -> State {
        let mut layout = ScopeType::new();
        layout.add_field("x", "x", Type::Int).unwrap();
        layout.add_field("p", "p", Type::ptr(Type::Str)).unwrap();
        State::new(Arc::new(layout), 2, 64)
    }

    #[test]
    fn test_set_and_read_value() {
        let mut state = state();
        assert_eq!(state.value("x").unwrap(), &Value::Int(0));
        state.set_value("x", 5i64).unwrap();
        assert_eq!(state.load(0), Value::Int(5));
        assert_eq!(state.load(99), Value::Nil);
    }

    #[test]
    fn test_set_value_checks_type() {
        let mut state = state();
        let err = state.set_value("x", "five").unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                id: "x".to_string(),
                expected: "int".to_string(),
                found: "string".to_string(),
            }
        );
        assert!(state.set_value("p", Value::Nil).is_ok());
        assert!(matches!(
            state.set_value("nope", 1i64),
            Err(Error::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_resource_scratch_is_reused() {
        let mut state = state();
        let mut scratch = state.take_resource(1);
        scratch.push(Value::Int(1));
        state.restore_resource(1, scratch);
        assert!(state.take_resource(1).is_empty());
        assert!(state.take_resource(7).is_empty());
        assert_eq!(state.resource_count(), 2);
    }

    #[test]
    fn test_buffer_split_and_replace() {
        let mut state = state();
        state.buffer_mut().push_str("head:");
        let mark = state.buffer().len();
        state.buffer_mut().push_value(&Value::Float(2.5));
        assert_eq!(state.buffer_mut().split_off(mark), "2.5");
        assert_eq!(state.output(), "head:");

        let old = state.replace_buffer(Buffer::default());
        assert_eq!(old.as_str(), "head:");
        assert!(state.output().is_empty());
    }

    #[test]
    fn test_diagnostics() {
        let mut state = state();
        state.push_diagnostic("bad template");
        assert_eq!(state.diagnostics().len(), 1);
        assert_eq!(state.take_diagnostics()[0].to_string(), "bad template");
        assert!(state.diagnostics().is_empty());
    }
}

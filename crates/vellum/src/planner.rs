//! Planner: variable registration and the compile entry points.
//!
//! A planner owns the record layout and the selector graph of one
//! template. Variables are registered first; every struct member reachable
//! from a variable gets its own selector up front, so resolving an
//! expression later only has to look composite ids up.

use std::sync::Arc;

use tracing::{debug, instrument};
use vellum_ast::{Block, Expr};
use vellum_functions::Functions;
use vellum_runtime::{Control, Operand, ScopeType, State, StructType, Type, Value};

use crate::cache::PlanCache;
use crate::config::PlannerConfig;
use crate::error::{CompileError, Result};
use crate::evaluate::Evaluator;
use crate::expr::Expression;
use crate::selector::{Access, SEPARATOR, Selector, SelectorId, Selectors, composite_id, display_id};
use crate::stmt::Execution;

/// Declaration of a top-level variable: a bare type, or a value whose
/// type is taken and which seeds every new state.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Type(Type),
    Value(Value),
}

impl Variable {
    fn ty(&self) -> Option<Type> {
        match self {
            Variable::Type(ty) => Some(ty.clone()),
            Variable::Value(value) => value.type_of(),
        }
    }
}

impl From<Type> for Variable {
    fn from(ty: Type) -> Self {
        Variable::Type(ty)
    }
}

impl From<Value> for Variable {
    fn from(value: Value) -> Self {
        Variable::Value(value)
    }
}

/// Prefix of compiler-allocated temporaries.
pub const TEMPORARY_PREFIX: &str = "$T";

/// Per-compilation counters: temporary names and control resources.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    temporaries: usize,
    pub control: Control,
}

impl CompileContext {
    /// Next temporary name: `$T0`, `$T1`, ...
    ///
    /// `$` cannot start a template identifier, so temporaries never shadow
    /// or get shadowed by names an expression can refer to.
    pub fn temporary(&mut self) -> String {
        let name = format!("{}{}", TEMPORARY_PREFIX, self.temporaries);
        self.temporaries += 1;
        name
    }

    pub fn temporaries(&self) -> usize {
        self.temporaries
    }
}

/// Top-level variable as seen by child planners.
#[derive(Debug, Clone)]
pub(crate) struct RootVariable {
    pub id: String,
    pub ty: Type,
    pub embedded: bool,
    pub prefix: String,
    pub slot: usize,
}

impl RootVariable {
    /// Same declaration, wherever it lives in the layout.
    pub fn declares_same(&self, other: &RootVariable) -> bool {
        self.id == other.id
            && self.ty == other.ty
            && self.embedded == other.embedded
            && self.prefix == other.prefix
    }
}

/// Everything compilation reads or grows, apart from the counters.
#[derive(Debug)]
pub(crate) struct Scope {
    pub layout: ScopeType,
    pub selectors: Selectors,
    pub roots: Vec<RootVariable>,
    pub defaults: Vec<(usize, Value)>,
    pub functions: Arc<Functions>,
    pub config: PlannerConfig,
    pub cache: Arc<PlanCache>,
}

/// Compiler for one template scope.
#[derive(Debug)]
pub struct Planner {
    scope: Scope,
    context: CompileContext,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    pub fn new() -> Self {
        Self::with_config(PlannerConfig::default())
    }

    pub fn with_config(config: PlannerConfig) -> Self {
        Self {
            scope: Scope {
                layout: ScopeType::new(),
                selectors: Selectors::new(),
                roots: Vec::new(),
                defaults: Vec::new(),
                functions: Arc::new(Functions::new()),
                cache: Arc::new(PlanCache::new(config.cache_size)),
                config,
            },
            context: CompileContext::default(),
        }
    }

    /// Use a shared function registry.
    pub fn with_functions(mut self, functions: Arc<Functions>) -> Self {
        self.scope.functions = functions;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.scope.config
    }

    pub fn functions(&self) -> &Arc<Functions> {
        &self.scope.functions
    }

    pub fn layout(&self) -> &ScopeType {
        &self.scope.layout
    }

    pub fn selectors(&self) -> &Selectors {
        &self.scope.selectors
    }

    /// Selector for a dotted path such as `p.Name`.
    pub fn selector(&self, path: &str) -> Option<&Selector> {
        self.scope
            .selectors
            .lookup(&composite_id(path))
            .and_then(|id| self.scope.selectors.get(id))
    }

    /// Plans compiled for dynamic sub-templates of this scope.
    pub fn cache(&self) -> &Arc<PlanCache> {
        &self.scope.cache
    }

    /// Number of temporaries allocated so far.
    pub fn temporaries(&self) -> usize {
        self.context.temporaries()
    }

    /// Register a top-level variable.
    ///
    /// Members of struct-typed variables (directly or behind a pointer)
    /// become reachable as `name.Member`.
    pub fn define_variable(&mut self, name: &str, variable: impl Into<Variable>) -> Result<()> {
        self.scope.register(name, "", variable.into(), false)
    }

    /// Register a variable whose members are promoted into the top-level
    /// namespace. The variable itself is not reachable by name.
    pub fn embed_variable(&mut self, name: &str, variable: impl Into<Variable>) -> Result<()> {
        self.scope.register(name, "", variable.into(), true)
    }

    /// Like [`Planner::embed_variable`], with `prefix` prepended to every
    /// promoted member name.
    pub fn embed_variable_prefixed(
        &mut self,
        name: &str,
        prefix: &str,
        variable: impl Into<Variable>,
    ) -> Result<()> {
        self.scope.register(name, prefix, variable.into(), true)
    }

    /// Compile one expression.
    pub fn compile(&mut self, expr: &Expr) -> Result<Expression> {
        self.scope.compile_expr(&mut self.context, expr)
    }

    /// Build a runnable operand from a compiled expression.
    pub fn operand(&mut self, expr: Expression) -> Result<Operand> {
        Ok(expr.operand(&mut self.context.control)?)
    }

    /// Compile a parsed template.
    #[instrument(skip_all, fields(statements = block.stmts.len()))]
    pub fn compile_block(&mut self, block: &Block) -> Result<Execution> {
        self.scope.compile_block(&mut self.context, block)
    }

    /// Parse and compile template text.
    #[instrument(skip_all, fields(len = source.len()))]
    pub fn compile_template(&mut self, source: &str) -> Result<Execution> {
        let block = vellum_parser::parse(source)?;
        self.scope.compile_block(&mut self.context, &block)
    }

    /// Fresh state sized for everything compiled so far.
    pub fn new_state(&self) -> State {
        let mut state = State::new(
            Arc::new(self.scope.layout.clone()),
            self.context.control.count(),
            self.scope.config.buffer_size,
        );
        for (slot, value) in &self.scope.defaults {
            state.store(*slot, value.clone());
        }
        state
    }

    pub(crate) fn roots(&self) -> &[RootVariable] {
        &self.scope.roots
    }

    /// Evaluator for dynamic sub-templates over the current top-level
    /// variables.
    pub fn evaluator(&self) -> Evaluator {
        self.scope.evaluator()
    }
}

/// Selector waiting to be committed during registration.
struct Pending {
    id: String,
    name: String,
    ty: Type,
    /// Index into the pending list; `None` is the variable itself.
    parent: Option<usize>,
    index: usize,
}

impl Scope {
    /// Mint a temporary id not yet taken in this scope.
    pub(crate) fn temporary(&self, ctx: &mut CompileContext) -> String {
        loop {
            let id = ctx.temporary();
            if self.layout.field(&id).is_none() && !self.selectors.contains(&id) {
                return id;
            }
        }
    }

    pub(crate) fn evaluator(&self) -> Evaluator {
        Evaluator::new(
            self.roots.clone(),
            Arc::clone(&self.functions),
            self.config.clone(),
            Arc::clone(&self.cache),
        )
    }

    fn register(&mut self, name: &str, prefix: &str, variable: Variable, embedded: bool) -> Result<()> {
        if name.is_empty() {
            return Err(CompileError::EmptySelectorId);
        }
        let ty = variable
            .ty()
            .ok_or_else(|| CompileError::EmptySelectorType(name.to_string()))?;
        if self.selectors.contains(name) || self.layout.field(name).is_some() {
            return Err(CompileError::Duplicate(display_id(name)));
        }

        let mut pending = Vec::new();
        if let Some(st) = ty.as_struct() {
            let child_prefix = if embedded {
                prefix.to_string()
            } else {
                format!("{}{}", name, SEPARATOR)
            };
            collect_members(&mut pending, None, st, &child_prefix);
        }

        // All-or-nothing: check every id before touching the layout.
        for (i, member) in pending.iter().enumerate() {
            let repeated = pending[..i].iter().any(|p| p.id == member.id);
            if repeated || self.selectors.contains(&member.id) {
                return Err(CompileError::Duplicate(display_id(&member.id)));
            }
        }

        let descriptor = if embedded {
            self.layout.embed_field(name, name, ty.clone())?
        } else {
            self.layout.add_field(name, name, ty.clone())?
        };
        let accessor = self
            .layout
            .accessor(name)
            .cloned()
            .ok_or_else(|| CompileError::UnknownVariable(name.to_string()))?;

        let mut root = Selector::new(name, name, ty.clone(), Access::Slot(accessor));
        root.embedded = embedded;
        let root = if embedded {
            self.selectors.push(root)
        } else {
            self.selectors.insert(root)?
        };

        let mut ids: Vec<SelectorId> = Vec::with_capacity(pending.len());
        for member in pending {
            let parent = member.parent.map_or(root, |i| ids[i]);
            let selector = Selector::new(member.id, member.name, member.ty, Access::Member(vec![member.index]))
                .with_parent(parent);
            ids.push(self.selectors.insert(selector)?);
        }

        debug!(
            name,
            prefix,
            embedded,
            ty = %ty,
            offset = descriptor.offset,
            members = ids.len(),
            "registered variable"
        );

        if let Variable::Value(value) = variable {
            self.defaults.push((descriptor_slot(&self.layout, name), value));
        }
        self.roots.push(RootVariable {
            id: name.to_string(),
            ty,
            embedded,
            prefix: prefix.to_string(),
            slot: descriptor_slot(&self.layout, name),
        });
        Ok(())
    }
}

fn descriptor_slot(layout: &ScopeType, id: &str) -> usize {
    layout.accessor(id).map_or(0, |accessor| accessor.slot)
}

/// Collect selectors for the members of `st`.
///
/// Named members nest their own members under `<id>___`; anonymous members
/// promote theirs under the current prefix plus their tag prefix. Tag
/// names register the member a second time under each alternate name.
/// Omitted members are skipped.
fn collect_members(out: &mut Vec<Pending>, parent: Option<usize>, st: &StructType, prefix: &str) {
    for (index, field) in st.fields.iter().enumerate() {
        if field.tag.omit {
            continue;
        }

        let names = std::iter::once(field.name.as_str()).chain(field.tag.names.iter().map(String::as_str));
        for (alias, name) in names.enumerate() {
            let id = format!("{}{}", prefix, name);
            out.push(Pending {
                id: id.clone(),
                name: name.to_string(),
                ty: field.ty.clone(),
                parent,
                index,
            });
            let me = out.len() - 1;

            let Some(inner) = field.ty.as_struct() else {
                continue;
            };
            if field.anonymous {
                if alias == 0 {
                    let promoted = format!("{}{}", prefix, field.tag.prefix);
                    collect_members(out, Some(me), inner, &promoted);
                }
            } else {
                collect_members(out, Some(me), inner, &format!("{}{}", id, SEPARATOR));
            }
        }
    }
}

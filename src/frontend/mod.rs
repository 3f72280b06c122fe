//! Lowering from the vendor AST to the graph.
//!
//! The frontend is a deterministic depth-first pass over one vendor
//! translation unit. It consumes two host-provided collaborators: a
//! [`BindingResolver`] that maps vendor names to previously created
//! declaration nodes, and a [`ScopeManager`] that names the enclosing
//! scope for qualified-name construction. Lowering never fails; abnormal
//! input degrades to Unknown types, generic nodes, and log entries.

pub mod declaration;
pub mod expression;
pub mod literal;
pub mod statement;

use rustc_hash::FxHashMap;
use serde_json::json;

use crate::graph::location::SourceSpan;
use crate::graph::{Graph, NodeId};
use crate::types::TypeRegistry;
use crate::vendor::VendorTranslationUnit;

/// Resolves vendor names to declaration nodes created earlier in the
/// lowering (or seeded by the host from other translation units).
pub trait BindingResolver {
    /// A previously created declaration node for `name`, if any.
    fn resolve(&self, name: &str) -> Option<NodeId>;

    /// Inform the resolver of a declaration the frontend just created.
    fn record_declaration(&mut self, name: &str, node: NodeId) {
        let _ = (name, node);
    }
}

/// Names the fully-qualified prefix of the current lowering position.
pub trait ScopeManager {
    fn full_name_prefix(&self) -> String;
}

/// Resolver that never resolves anything.
pub struct NullResolver;

impl BindingResolver for NullResolver {
    fn resolve(&self, _name: &str) -> Option<NodeId> {
        None
    }
}

/// In-memory name table: remembers every declaration the frontend records
/// and can be pre-seeded by the host.
#[derive(Debug, Default)]
pub struct SimpleResolver {
    bindings: FxHashMap<String, NodeId>,
}

impl SimpleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a binding (e.g. a record declaration from another unit).
    pub fn define(&mut self, name: impl Into<String>, node: NodeId) {
        self.bindings.insert(name.into(), node);
    }
}

impl BindingResolver for SimpleResolver {
    fn resolve(&self, name: &str) -> Option<NodeId> {
        self.bindings.get(name).copied()
    }

    fn record_declaration(&mut self, name: &str, node: NodeId) {
        self.bindings.insert(name.to_string(), node);
    }
}

/// Scope manager for hosts without scope tracking: the prefix is empty.
pub struct EmptyScope;

impl ScopeManager for EmptyScope {
    fn full_name_prefix(&self) -> String {
        String::new()
    }
}

/// Lowering context for one translation unit.
pub struct Lowering<'a> {
    pub(crate) graph: Graph,
    pub(crate) types: &'a TypeRegistry,
    pub(crate) resolver: &'a mut dyn BindingResolver,
    /// Scope hook for qualified-name construction. Not yet applied to free
    /// calls; see the TODO in the call handler.
    #[allow(dead_code)]
    pub(crate) scope: &'a dyn ScopeManager,
}

impl<'a> Lowering<'a> {
    pub fn new(
        types: &'a TypeRegistry,
        resolver: &'a mut dyn BindingResolver,
        scope: &'a dyn ScopeManager,
    ) -> Self {
        Self {
            graph: Graph::new(),
            types,
            resolver,
            scope,
        }
    }

    /// Consume the context, yielding the graph built so far.
    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

/// Result of lowering one translation unit: the root node plus the full
/// node table.
#[derive(Debug)]
pub struct LoweredTranslationUnit {
    pub root: NodeId,
    pub graph: Graph,
}

impl LoweredTranslationUnit {
    /// Convert to dictionary for JSON serialization.
    pub fn to_dict(&self) -> serde_json::Value {
        json!({
            "root": self.root.0,
            "graph": self.graph.to_dict(),
        })
    }
}

/// Lower one vendor translation unit into a graph.
///
/// Pure with respect to the host: no I/O, no global state; the type
/// registry is a parameter and may be shared across units.
pub fn lower_translation_unit(
    tu: &VendorTranslationUnit,
    types: &TypeRegistry,
    resolver: &mut dyn BindingResolver,
    scope: &dyn ScopeManager,
) -> LoweredTranslationUnit {
    let mut lowering = Lowering::new(types, resolver, scope);

    let mut declarations = Vec::new();
    for decl in &tu.declarations {
        declarations.extend(lowering.handle_declaration(decl));
    }

    let root = lowering
        .graph
        .new_translation_unit(tu.file.clone(), declarations, SourceSpan::none());

    LoweredTranslationUnit {
        root,
        graph: lowering.graph,
    }
}

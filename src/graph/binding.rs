//! Variable/initializer binding protocol.
//!
//! A declaration and its initializer are wired three ways: the initializer
//! becomes an AST child of the declaration, a DFG edge runs initializer to
//! declaration, and the declaration subscribes to the initializer's type.
//! Initializers that are themselves listeners (casts, initializer lists)
//! get the reverse subscription too, so they learn when the declaration's
//! type firms up later. Replacing an initializer removes every piece of the
//! old wiring before the new one is installed.

use tracing::debug;

use crate::graph::node::NodeKind;
use crate::graph::{Graph, NodeId};

impl Graph {
    /// The current initializer of a variable declaration.
    pub fn variable_initializer(&self, decl: NodeId) -> Option<NodeId> {
        match &self.node(decl).kind {
            NodeKind::VariableDeclaration { initializer, .. } => *initializer,
            _ => None,
        }
    }

    /// Install (or clear, with `None`) the initializer of `decl`.
    pub fn set_initializer(&mut self, decl: NodeId, new_init: Option<NodeId>) {
        if !matches!(
            self.node(decl).kind,
            NodeKind::VariableDeclaration { .. }
        ) {
            debug_assert!(false, "set_initializer on {}", self.node(decl).kind.kind_name());
            return;
        }

        if let Some(old) = self.variable_initializer(decl) {
            debug!(
                "replacing initializer of '{}' ({:?} -> {:?})",
                self.node(decl).name,
                old,
                new_init
            );
            self.remove_dfg_edge(old, decl);
            self.unregister_type_listener(old, decl);
            if self.node(old).kind.is_type_listener() {
                self.unregister_type_listener(decl, old);
            }
            if self.node(old).ast_parent == Some(decl) {
                self.node_mut(old).ast_parent = None;
            }
        }

        if let NodeKind::VariableDeclaration { initializer, .. } = &mut self.node_mut(decl).kind {
            *initializer = new_init;
        }

        if let Some(init) = new_init {
            self.adopt(decl, init);
            self.add_dfg_edge(init, decl);
            self.register_type_listener(init, decl);

            // the type is tied to the declaration, but it is convenient for
            // listener-kind initializers to carry it as well
            if self.node(init).kind.is_type_listener() {
                self.register_type_listener(decl, init);
            }
        }
    }
}

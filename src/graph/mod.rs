//! Arena-allocated code property graph.
//!
//! Nodes live in a flat arena owned by the translation-unit result and are
//! addressed by stable [`NodeId`] indices. Three edge kinds connect them:
//!
//! - **AST** containment: the variant payload slots plus the `ast_parent`
//!   back link; tree-shaped over a translation unit.
//! - **DFG** data flow: `dfg_prev`/`dfg_next` lists; may be cyclic.
//! - **REFERS_TO**: symbol use to declaration, many-to-one.
//!
//! Type state and the publish/subscribe propagation protocol over it live in
//! [`propagation`]; the variable/initializer binding protocol in [`binding`].

pub mod location;
pub mod node;

mod binding;
mod builder;
mod propagation;

use serde::{Deserialize, Serialize};

use crate::error::{CpgError, Result};
use crate::types::Type;
use node::{Node, NodeKind};

/// Stable identity of a node within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// The node arena plus edge maintenance.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node. Panics on a foreign id; use [`Graph::get`] at API
    /// boundaries.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// Borrow a node, reporting foreign ids as an error.
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(CpgError::UnknownNode(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub(crate) fn push(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.id = id;
        // adopt the children named in the payload
        for child in node.kind.ast_children() {
            self.nodes[child.0 as usize].ast_parent = Some(id);
        }
        self.nodes.push(node);
        id
    }

    /// Re-point an AST child slot's parent link (used when a payload slot is
    /// filled after construction).
    pub(crate) fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).ast_parent = Some(parent);
    }

    // --- data-flow edges -------------------------------------------------

    /// Add the DFG edge `from -> to`. Duplicate edges collapse.
    pub fn add_dfg_edge(&mut self, from: NodeId, to: NodeId) {
        let next = &mut self.node_mut(from).dfg_next;
        if !next.contains(&to) {
            next.push(to);
        }
        let prev = &mut self.node_mut(to).dfg_prev;
        if !prev.contains(&from) {
            prev.push(from);
        }
    }

    /// Remove the DFG edge `from -> to` if present.
    pub fn remove_dfg_edge(&mut self, from: NodeId, to: NodeId) {
        self.node_mut(from).dfg_next.retain(|id| *id != to);
        self.node_mut(to).dfg_prev.retain(|id| *id != from);
    }

    // --- symbol references -----------------------------------------------

    pub fn set_refers_to(&mut self, use_site: NodeId, declaration: NodeId) {
        self.node_mut(use_site).refers_to = Some(declaration);
    }

    pub fn set_argument_index(&mut self, node: NodeId, index: usize) {
        self.node_mut(node).argument_index = Some(index);
    }

    /// Detach a node from every edge kind. Children still parented to the
    /// node are orphaned; children that have been re-parented elsewhere are
    /// left alone. The node record stays in the arena but is unreachable
    /// from the translation-unit root afterwards.
    pub fn disconnect(&mut self, id: NodeId) {
        // AST: orphan the children that still point back here, then empty
        // the payload slots.
        for child in self.node(id).kind.ast_children() {
            if self.node(child).ast_parent == Some(id) {
                self.node_mut(child).ast_parent = None;
            }
        }
        self.node_mut(id).kind.clear_children();
        self.node_mut(id).ast_parent = None;

        // DFG, both directions.
        for from in self.node(id).dfg_prev.clone() {
            self.remove_dfg_edge(from, id);
        }
        for to in self.node(id).dfg_next.clone() {
            self.remove_dfg_edge(id, to);
        }

        // Listeners, both directions.
        let subscribers = self.node(id).type_listeners.clone();
        for sub in subscribers {
            self.unregister_type_listener(id, sub);
        }
        for other in 0..self.nodes.len() {
            self.nodes[other].type_listeners.retain(|sub| *sub != id);
        }

        self.node_mut(id).refers_to = None;
        self.node_mut(id).argument_index = None;
    }

    // --- structural comparison -------------------------------------------

    /// Structural equality of two subtrees, modulo location and identity.
    /// Compares header fields (name, code, type), the variant payloads, and
    /// recursively every AST child slot. Declaration variants include their
    /// initializer slot.
    pub fn structurally_equal(&self, a: NodeId, b: NodeId) -> bool {
        let (na, nb) = (self.node(a), self.node(b));
        if na.name != nb.name || na.code != nb.code || na.ty != nb.ty {
            return false;
        }
        use NodeKind::*;
        match (&na.kind, &nb.kind) {
            (Literal { value: va }, Literal { value: vb }) => va == vb,
            (DeclaredReference, DeclaredReference) => true,
            (Expression, Expression) => true,
            (Statement, Statement) => true,
            (MemberExpression { base: b1, member: m1 }, MemberExpression { base: b2, member: m2 }) => {
                self.opt_eq(b1, b2) && self.opt_eq(m1, m2)
            }
            (
                UnaryOperator {
                    operator: o1,
                    is_postfix: p1,
                    is_prefix: f1,
                    operand: c1,
                },
                UnaryOperator {
                    operator: o2,
                    is_postfix: p2,
                    is_prefix: f2,
                    operand: c2,
                },
            ) => o1 == o2 && p1 == p2 && f1 == f2 && self.opt_eq(c1, c2),
            (
                BinaryOperator {
                    operator: o1,
                    lhs: l1,
                    rhs: r1,
                },
                BinaryOperator {
                    operator: o2,
                    lhs: l2,
                    rhs: r2,
                },
            ) => o1 == o2 && self.opt_eq(l1, l2) && self.opt_eq(r1, r2),
            (
                ConditionalExpression {
                    condition: c1,
                    then_expr: t1,
                    else_expr: e1,
                },
                ConditionalExpression {
                    condition: c2,
                    then_expr: t2,
                    else_expr: e2,
                },
            ) => self.opt_eq(c1, c2) && self.opt_eq(t1, t2) && self.opt_eq(e1, e2),
            (
                CastExpression {
                    operand: c1,
                    cast_type: t1,
                    operator: o1,
                },
                CastExpression {
                    operand: c2,
                    cast_type: t2,
                    operator: o2,
                },
            ) => t1 == t2 && o1 == o2 && self.opt_eq(c1, c2),
            (
                CallExpression {
                    fqn: f1,
                    arguments: a1,
                },
                CallExpression {
                    fqn: f2,
                    arguments: a2,
                },
            ) => f1 == f2 && self.vec_eq(a1, a2),
            (
                MemberCallExpression {
                    fqn: f1,
                    base: b1,
                    member: m1,
                    arguments: a1,
                },
                MemberCallExpression {
                    fqn: f2,
                    base: b2,
                    member: m2,
                    arguments: a2,
                },
            ) => f1 == f2 && self.opt_eq(b1, b2) && self.opt_eq(m1, m2) && self.vec_eq(a1, a2),
            (
                ArraySubscriptExpression {
                    array: a1,
                    subscript: s1,
                },
                ArraySubscriptExpression {
                    array: a2,
                    subscript: s2,
                },
            ) => self.opt_eq(a1, a2) && self.opt_eq(s1, s2),
            (NewExpression { initializer: i1 }, NewExpression { initializer: i2 }) => {
                self.opt_eq(i1, i2)
            }
            (DeleteExpression { operand: o1 }, DeleteExpression { operand: o2 }) => {
                self.opt_eq(o1, o2)
            }
            (
                InitializerListExpression { initializers: i1 },
                InitializerListExpression { initializers: i2 },
            ) => self.vec_eq(i1, i2),
            (
                DesignatedInitializerExpression { lhs: l1, rhs: r1 },
                DesignatedInitializerExpression { lhs: l2, rhs: r2 },
            ) => self.vec_eq(l1, l2) && self.opt_eq(r1, r2),
            (
                ArrayRangeExpression {
                    floor: f1,
                    ceiling: c1,
                },
                ArrayRangeExpression {
                    floor: f2,
                    ceiling: c2,
                },
            ) => self.opt_eq(f1, f2) && self.opt_eq(c1, c2),
            (ExpressionList { expressions: e1 }, ExpressionList { expressions: e2 }) => {
                self.vec_eq(e1, e2)
            }
            (
                CompoundStatementExpression { statement: s1 },
                CompoundStatementExpression { statement: s2 },
            ) => self.opt_eq(s1, s2),
            (
                TypeIdExpression {
                    operator: o1,
                    referenced_type: t1,
                },
                TypeIdExpression {
                    operator: o2,
                    referenced_type: t2,
                },
            ) => o1 == o2 && t1 == t2,
            (
                VariableDeclaration {
                    initializer: i1,
                    implicit_initializer_allowed: a1,
                    is_array: r1,
                },
                VariableDeclaration {
                    initializer: i2,
                    implicit_initializer_allowed: a2,
                    is_array: r2,
                },
            ) => a1 == a2 && r1 == r2 && self.opt_eq(i1, i2),
            (RecordDeclaration { kind: k1 }, RecordDeclaration { kind: k2 }) => k1 == k2,
            (CompoundStatement { statements: s1 }, CompoundStatement { statements: s2 }) => {
                self.vec_eq(s1, s2)
            }
            (
                DeclarationStatement { declarations: d1 },
                DeclarationStatement { declarations: d2 },
            ) => self.vec_eq(d1, d2),
            (
                ForStatement {
                    initializer_statement: i1,
                    condition_declaration: cd1,
                    condition: c1,
                    iteration_expression: it1,
                    body: b1,
                },
                ForStatement {
                    initializer_statement: i2,
                    condition_declaration: cd2,
                    condition: c2,
                    iteration_expression: it2,
                    body: b2,
                },
            ) => {
                self.opt_eq(i1, i2)
                    && self.opt_eq(cd1, cd2)
                    && self.opt_eq(c1, c2)
                    && self.opt_eq(it1, it2)
                    && self.opt_eq(b1, b2)
            }
            (TranslationUnit { declarations: d1 }, TranslationUnit { declarations: d2 }) => {
                self.vec_eq(d1, d2)
            }
            _ => false,
        }
    }

    fn opt_eq(&self, a: &Option<NodeId>, b: &Option<NodeId>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.structurally_equal(*a, *b),
            _ => false,
        }
    }

    fn vec_eq(&self, a: &[NodeId], b: &[NodeId]) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|(a, b)| self.structurally_equal(*a, *b))
    }

    // --- summaries -------------------------------------------------------

    /// Count of DFG edges in the graph.
    pub fn dfg_edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.dfg_next.len()).sum()
    }

    /// Convert to dictionary for JSON serialization.
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "nodes": self.nodes.len(),
            "dfg_edges": self.dfg_edge_count(),
            "refers_to_edges": self.nodes.iter().filter(|n| n.refers_to.is_some()).count(),
        })
    }

    /// Convenience for tests and hosts: find a node's type.
    pub fn type_of(&self, id: NodeId) -> &Type {
        &self.node(id).ty
    }
}

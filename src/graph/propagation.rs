//! Type-propagation bus.
//!
//! Typed nodes publish changes of their declared type and possible-subtype
//! set to subscribed listeners. Notifications are synchronous and carry an
//! epoch token: `root` is the node that originated the cascade, and a
//! per-propagation visited set refuses re-entry, so cyclic listener graphs
//! terminate. Subscriber lists are iterated over a snapshot, so a handler
//! may change subscriptions while a notification is in flight.
//!
//! Registering a listener immediately notifies it with the publisher's
//! current state. This is what lets a declaration pick up the type of an
//! initializer that was fully typed before the declaration existed; the
//! default guard makes the same notification a no-op for subscribers whose
//! type is already known.

use rustc_hash::FxHashSet;

use crate::graph::node::NodeKind;
use crate::graph::{Graph, NodeId};
use crate::types::{PointerOrigin, Type, TypeOrigin};

impl Graph {
    /// Subscribe `subscriber` to type changes of `publisher` and deliver the
    /// publisher's current state.
    pub fn register_type_listener(&mut self, publisher: NodeId, subscriber: NodeId) {
        if publisher == subscriber {
            return;
        }
        let listeners = &mut self.node_mut(publisher).type_listeners;
        if listeners.contains(&subscriber) {
            return;
        }
        listeners.push(subscriber);

        // initial notification with the publisher's current state
        let current = self.node(publisher).ty.clone();
        let mut visited = FxHashSet::default();
        visited.insert(publisher);
        self.type_changed(subscriber, publisher, publisher, &current, &mut visited);

        let mut visited = FxHashSet::default();
        visited.insert(publisher);
        self.possible_subtypes_changed(subscriber, publisher, publisher, &mut visited);
    }

    /// Remove the subscription `subscriber -> publisher` if present.
    pub fn unregister_type_listener(&mut self, publisher: NodeId, subscriber: NodeId) {
        self.node_mut(publisher)
            .type_listeners
            .retain(|id| *id != subscriber);
    }

    /// The type this node advertises to subscribers. Cast and
    /// constructor-style expressions advertise their declared cast target so
    /// that `T v = (T) e;` infers `T`, not the operand's original type.
    pub fn propagation_type(&self, node: NodeId) -> Type {
        match &self.node(node).kind {
            NodeKind::CastExpression { cast_type, .. } => cast_type.clone(),
            _ => self.node(node).ty.clone(),
        }
    }

    /// Update a node's type and notify its subscribers. The node itself is
    /// the root of the new propagation epoch.
    pub fn set_type(&mut self, node: NodeId, new_type: Type) {
        let mut visited = FxHashSet::default();
        self.set_type_with(node, new_type, node, &mut visited);
    }

    pub(crate) fn set_type_with(
        &mut self,
        node: NodeId,
        new_type: Type,
        root: NodeId,
        visited: &mut FxHashSet<NodeId>,
    ) {
        if !visited.insert(node) {
            // already on this propagation path
            return;
        }
        let current = self.node(node).ty.clone();
        if new_type.is_unknown() && !current.is_unknown() {
            // never regress a known type to the sentinel
            return;
        }
        if current == new_type {
            // idempotent; an equal type may still upgrade the origin tag
            if new_type.origin().rank() > current.origin().rank() {
                self.node_mut(node).ty.set_origin(new_type.origin());
            }
            return;
        }

        self.node_mut(node).ty = new_type;

        let subscribers = self.node(node).type_listeners.clone();
        for subscriber in subscribers {
            self.type_changed(subscriber, node, root, &current, visited);
        }
    }

    /// Replace a node's possible-subtype set and notify its subscribers.
    pub fn set_possible_subtypes(&mut self, node: NodeId, subtypes: FxHashSet<Type>) {
        let mut visited = FxHashSet::default();
        self.set_possible_subtypes_with(node, subtypes, node, &mut visited);
    }

    pub(crate) fn set_possible_subtypes_with(
        &mut self,
        node: NodeId,
        subtypes: FxHashSet<Type>,
        root: NodeId,
        visited: &mut FxHashSet<NodeId>,
    ) {
        if !visited.insert(node) {
            return;
        }
        if self.node(node).possible_subtypes == subtypes {
            return;
        }
        self.node_mut(node).possible_subtypes = subtypes;

        let subscribers = self.node(node).type_listeners.clone();
        for subscriber in subscribers {
            self.possible_subtypes_changed(subscriber, node, root, visited);
        }
    }

    /// Deliver a type-change notification from `src` to `dst`.
    ///
    /// Default policy: if `dst`'s type is known and the src's propagation
    /// type equals the old type, the notification carries no news and is
    /// ignored. Otherwise `dst` adopts the propagation type. Declarations
    /// and initializer lists specialize this (see below). An actual change
    /// stamps the DATAFLOW origin on the new type.
    fn type_changed(
        &mut self,
        dst: NodeId,
        src: NodeId,
        root: NodeId,
        old_type: &Type,
        visited: &mut FxHashSet<NodeId>,
    ) {
        let propagation = self.propagation_type(src);
        let dst_known = !self.node(dst).ty.is_unknown();
        if dst_known && propagation == *old_type {
            return;
        }

        let new_type = match &self.node(dst).kind {
            NodeKind::VariableDeclaration {
                initializer,
                is_array,
                ..
            } if *initializer == Some(src)
                && matches!(
                    self.node(src).kind,
                    NodeKind::InitializerListExpression { .. }
                ) =>
            {
                // A brace list reads as having an array type but is used
                // ambiguously: array initialization keeps the layer, object
                // construction must strip it.
                if *is_array {
                    self.node(src).ty.clone()
                } else if dst_known {
                    return;
                } else {
                    self.node(src).ty.dereference()
                }
            }
            NodeKind::InitializerListExpression { .. } => {
                // the list's own type is one array layer over its clauses
                propagation.pointer_of(PointerOrigin::Array)
            }
            _ => propagation,
        };

        let previous = self.node(dst).ty.clone();
        self.set_type_with(dst, new_type, root, visited);
        if previous != self.node(dst).ty {
            self.node_mut(dst).ty.set_origin(TypeOrigin::Dataflow);
        }
    }

    /// Deliver a possible-subtypes notification: `dst` unions in the src's
    /// set and publishes the result.
    fn possible_subtypes_changed(
        &mut self,
        dst: NodeId,
        src: NodeId,
        root: NodeId,
        visited: &mut FxHashSet<NodeId>,
    ) {
        let mut union = self.node(dst).possible_subtypes.clone();
        union.extend(self.node(src).possible_subtypes.iter().cloned());
        self.set_possible_subtypes_with(dst, union, root, visited);
    }
}

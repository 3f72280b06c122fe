//! Statement lowering.
//!
//! Only the statement shapes the expression core depends on are lowered
//! here: compound statements (GNU statement expressions contain one),
//! expression and declaration statements, and `for` statements with their
//! five optional slots. Control-flow construction over these nodes happens
//! in a later pass.

use tracing::error;

use crate::graph::NodeId;
use crate::vendor::{VendorForCondition, VendorStmt, VendorStmtKind};

use super::Lowering;

impl Lowering<'_> {
    pub(crate) fn handle_statement(&mut self, ctx: &VendorStmt) -> NodeId {
        match &ctx.kind {
            VendorStmtKind::Compound { statements } => {
                let lowered: Vec<NodeId> = statements
                    .iter()
                    .map(|s| self.handle_statement(s))
                    .collect();
                self.graph
                    .new_compound_statement(lowered, &ctx.code, ctx.location.clone())
            }
            // expressions are statements; no wrapper node
            VendorStmtKind::Expression { expression } => self.handle_expression(expression),
            VendorStmtKind::Declaration { declaration } => {
                let declarations = self.handle_declaration(declaration);
                self.graph
                    .new_declaration_statement(declarations, &ctx.code, ctx.location.clone())
            }
            VendorStmtKind::For {
                initializer,
                condition,
                iteration,
                body,
            } => {
                let initializer_statement =
                    initializer.as_deref().map(|s| self.handle_statement(s));

                let (condition_declaration, condition) = match condition {
                    Some(VendorForCondition::Expression(e)) => {
                        (None, Some(self.handle_expression(e)))
                    }
                    Some(VendorForCondition::Declaration(d)) => {
                        (self.handle_declaration(d).into_iter().next(), None)
                    }
                    None => (None, None),
                };

                let iteration_expression =
                    iteration.as_ref().map(|e| self.handle_expression(e));
                let body = body.as_deref().map(|s| self.handle_statement(s));

                self.graph.new_for_statement(
                    initializer_statement,
                    condition_declaration,
                    condition,
                    iteration_expression,
                    body,
                    &ctx.code,
                    ctx.location.clone(),
                )
            }
            VendorStmtKind::Opaque { class_name } => {
                error!(
                    "{}: unknown statement class {}, creating a generic node",
                    ctx.location, class_name
                );
                self.graph.new_statement(&ctx.code, ctx.location.clone())
            }
        }
    }
}

//! Declaration and initializer lowering.
//!
//! A simple declaration produces one variable declaration per declarator.
//! The declared type is the specifier spelling plus the declarator's
//! pointer layers; array declarators add an ARRAY pointer layer and mark
//! the declaration, which later decides whether a brace-list initializer
//! keeps its array type. Initializers run through the expression
//! dispatcher and are attached via the binding protocol, which installs
//! the DFG edge and the type-listener subscriptions.

use tracing::error;

use crate::graph::NodeId;
use crate::types::PointerOrigin;
use crate::vendor::{VendorDecl, VendorDeclKind, VendorDeclarator, VendorInitializer};

use super::Lowering;

impl Lowering<'_> {
    /// Lower one vendor declaration; a simple declaration may carry several
    /// declarators.
    pub(crate) fn handle_declaration(&mut self, ctx: &VendorDecl) -> Vec<NodeId> {
        match &ctx.kind {
            VendorDeclKind::Simple {
                specifier,
                declarators,
            } => declarators
                .iter()
                .map(|declarator| self.handle_declarator(specifier, declarator))
                .collect(),
            VendorDeclKind::Opaque { class_name } => {
                error!(
                    "{}: unknown declaration class {}, skipping",
                    ctx.location, class_name
                );
                Vec::new()
            }
        }
    }

    fn handle_declarator(&mut self, specifier: &str, declarator: &VendorDeclarator) -> NodeId {
        let mut spelling = specifier.to_string();
        spelling.push_str(&"*".repeat(declarator.pointer_depth));

        let mut ty = self.types.create_from(&spelling, true);
        if declarator.is_array {
            ty = ty.pointer_of(PointerOrigin::Array);
        }

        let declaration = self.graph.new_variable_declaration(
            &declarator.name,
            ty,
            &declarator.code,
            declarator.location.clone(),
        );
        // C++ may construct `A a;` through an implicit constructor call;
        // whether it actually does depends on the record analysis later
        self.graph.set_implicit_initializer_allowed(declaration, true);
        if declarator.is_array {
            self.graph.set_is_array(declaration, true);
        }

        // record before the initializer is lowered, so self-references in
        // the initializer resolve
        self.resolver
            .record_declaration(&declarator.name, declaration);

        if let Some(initializer) = &declarator.initializer {
            let lowered = self.handle_initializer(initializer);
            self.graph.set_initializer(declaration, Some(lowered));
        }

        declaration
    }

    /// Lower an initializer of any shape to an expression node.
    pub(crate) fn handle_initializer(&mut self, initializer: &VendorInitializer) -> NodeId {
        match initializer {
            VendorInitializer::Equals(expression) | VendorInitializer::Brace(expression) => {
                self.handle_expression(expression)
            }
            VendorInitializer::Constructor(arguments) => {
                // constructor arguments; overload resolution happens in a
                // later pass
                let code = arguments
                    .iter()
                    .map(|a| a.code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let lowered: Vec<NodeId> = arguments
                    .iter()
                    .map(|a| self.handle_expression(a))
                    .collect();
                self.graph.new_expression_list(
                    lowered,
                    code,
                    crate::graph::location::SourceSpan::none(),
                )
            }
        }
    }
}

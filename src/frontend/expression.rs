//! Expression lowering.
//!
//! One handler per vendor expression kind, dispatched by a single match.
//! Handlers lower their children through the same dispatcher, wire
//! type-listener subscriptions where a node's type depends on a child, and
//! tolerate every abnormal input shape: missing operands, problem types,
//! and unrecognized node classes all degrade to Unknown types or generic
//! nodes with a log entry. No handler fails.

use tracing::{debug, error, warn};

use crate::graph::node::{CastOperator, NodeKind};
use crate::graph::NodeId;
use crate::types::{PointerOrigin, Type};
use crate::vendor::{
    VendorBinaryOperator, VendorDesignator, VendorExpr, VendorExprKind, VendorInitializer,
    VendorStmt, VendorType, VendorTypeIdOperator, VendorUnaryOperator,
};

use super::Lowering;

impl Lowering<'_> {
    /// Lower one vendor expression (or initializer clause) to a graph node.
    pub fn handle_expression(&mut self, ctx: &VendorExpr) -> NodeId {
        match &ctx.kind {
            VendorExprKind::Literal { value, spelling } => {
                self.handle_literal_expression(ctx, value, spelling)
            }
            VendorExprKind::Unary { operator, operand } => {
                self.handle_unary_expression(ctx, *operator, operand.as_deref())
            }
            VendorExprKind::Binary { operator, lhs, rhs } => {
                self.handle_binary_expression(ctx, *operator, lhs, rhs)
            }
            VendorExprKind::Conditional {
                condition,
                positive,
                negative,
            } => self.handle_conditional_expression(ctx, condition, positive.as_deref(), negative),
            VendorExprKind::Id { name } => self.handle_id_expression(ctx, name),
            VendorExprKind::FieldReference {
                owner,
                field_name,
                field_code,
            } => self.handle_field_reference(ctx, owner, field_name, field_code),
            VendorExprKind::FunctionCall { callee, arguments } => {
                self.handle_function_call_expression(ctx, callee, arguments)
            }
            VendorExprKind::Cast {
                operator,
                declared_type,
                operand,
            } => self.handle_cast_expression(ctx, *operator, declared_type, operand),
            VendorExprKind::SimpleTypeConstructor { initializer } => {
                self.handle_simple_type_constructor(ctx, initializer)
            }
            VendorExprKind::New {
                declared_type,
                named_type,
                initializer,
            } => self.handle_new_expression(ctx, declared_type, named_type.as_deref(), initializer),
            VendorExprKind::InitializerList { clauses } => {
                self.handle_initializer_list(ctx, clauses)
            }
            VendorExprKind::DesignatedInitializer {
                designators,
                operand,
            } => self.handle_designated_initializer(ctx, designators, operand),
            VendorExprKind::ExpressionList { expressions } => {
                self.handle_expression_list(ctx, expressions)
            }
            VendorExprKind::Delete {
                operand,
                implicit_destructor_names,
            } => self.handle_delete_expression(ctx, operand, implicit_destructor_names),
            VendorExprKind::ArraySubscript { array, argument } => {
                self.handle_array_subscript_expression(ctx, array, argument)
            }
            VendorExprKind::TypeId {
                operator,
                declared_type,
            } => self.handle_type_id_expression(ctx, *operator, declared_type),
            VendorExprKind::CompoundStatementExpr { statement } => {
                self.handle_compound_statement_expression(ctx, statement)
            }
            VendorExprKind::Opaque { class_name } => {
                error!(
                    "{}: unknown expression class {}, creating a generic node",
                    ctx.location, class_name
                );
                self.graph.new_expression(&ctx.code, ctx.location.clone())
            }
        }
    }

    /// The type the vendor deduced for `ctx`, substituting the problem type
    /// when type evaluation failed outright.
    pub(crate) fn expression_type(&self, ctx: &VendorExpr) -> VendorType {
        match &ctx.expr_type {
            Some(ty) => ty.clone(),
            None => {
                warn!("{}: unknown expression type: {}", ctx.location, ctx.code);
                VendorType::Problem
            }
        }
    }

    fn handle_unary_expression(
        &mut self,
        ctx: &VendorExpr,
        operator: VendorUnaryOperator,
        operand: Option<&VendorExpr>,
    ) -> NodeId {
        // can be absent, e.g. for "throw;"
        let input = operand.map(|o| self.handle_expression(o));

        let operator_code = match operator {
            VendorUnaryOperator::PrefixIncrement | VendorUnaryOperator::PostfixIncrement => "++",
            VendorUnaryOperator::PrefixDecrement | VendorUnaryOperator::PostfixDecrement => "--",
            VendorUnaryOperator::Plus => "+",
            VendorUnaryOperator::Minus => "-",
            VendorUnaryOperator::Star => "*",
            VendorUnaryOperator::Amper => "&",
            VendorUnaryOperator::Tilde => "~",
            VendorUnaryOperator::Not => "!",
            VendorUnaryOperator::SizeOf => "sizeof",
            VendorUnaryOperator::BracketedPrimary => {
                // drop the parenthesized wrapper and return the inner
                // expression unchanged
                return match input {
                    Some(inner) => inner,
                    None => {
                        error!("{}: bracketed primary without operand", ctx.location);
                        self.graph.new_expression(&ctx.code, ctx.location.clone())
                    }
                };
            }
            VendorUnaryOperator::Throw => "throw",
            VendorUnaryOperator::TypeId => "typeid",
            VendorUnaryOperator::AlignOf => "alignof",
            VendorUnaryOperator::SizeOfParameterPack => "sizeof...",
            VendorUnaryOperator::NoExcept => "noexcept",
            VendorUnaryOperator::LabelReference => "",
            VendorUnaryOperator::Other(code) => {
                error!("{}: unknown operator {}", ctx.location, code);
                ""
            }
        };

        self.graph.new_unary_operator(
            operator_code,
            operator.is_postfix(),
            !operator.is_postfix(),
            input,
            &ctx.code,
            ctx.location.clone(),
        )
    }

    fn handle_binary_expression(
        &mut self,
        ctx: &VendorExpr,
        operator: VendorBinaryOperator,
        lhs: &VendorExpr,
        rhs: &VendorExpr,
    ) -> NodeId {
        let operator_code = match operator {
            VendorBinaryOperator::Multiply => "*",
            VendorBinaryOperator::Divide => "/",
            VendorBinaryOperator::Modulo => "%",
            VendorBinaryOperator::Plus => "+",
            VendorBinaryOperator::Minus => "-",
            VendorBinaryOperator::ShiftLeft => "<<",
            VendorBinaryOperator::ShiftRight => ">>",
            VendorBinaryOperator::LessThan => "<",
            VendorBinaryOperator::GreaterThan => ">",
            VendorBinaryOperator::LessEqual => "<=",
            VendorBinaryOperator::GreaterEqual => ">=",
            VendorBinaryOperator::BinaryAnd => "&",
            VendorBinaryOperator::BinaryXor => "^",
            VendorBinaryOperator::BinaryOr => "|",
            VendorBinaryOperator::LogicalAnd => "&&",
            VendorBinaryOperator::LogicalOr => "||",
            VendorBinaryOperator::Assign => "=",
            VendorBinaryOperator::MultiplyAssign => "*=",
            VendorBinaryOperator::DivideAssign => "/=",
            VendorBinaryOperator::ModuloAssign => "%=",
            VendorBinaryOperator::PlusAssign => "+=",
            VendorBinaryOperator::MinusAssign => "-=",
            VendorBinaryOperator::ShiftLeftAssign => "<<=",
            VendorBinaryOperator::ShiftRightAssign => ">>=",
            VendorBinaryOperator::BinaryAndAssign => "&=",
            VendorBinaryOperator::BinaryXorAssign => "^=",
            VendorBinaryOperator::BinaryOrAssign => "|=",
            VendorBinaryOperator::Equals => "==",
            VendorBinaryOperator::NotEquals => "!=",
            VendorBinaryOperator::PmDot => ".",
            VendorBinaryOperator::PmArrow => "->",
            VendorBinaryOperator::Max => ">?",
            VendorBinaryOperator::Min => "?<",
            VendorBinaryOperator::Ellipses => "...",
            VendorBinaryOperator::Other(code) => {
                error!("{}: unknown operator {}", ctx.location, code);
                ""
            }
        };

        let lhs = self.handle_expression(lhs);
        let rhs = self.handle_expression(rhs);

        let node = self.graph.new_binary_operator(
            operator_code,
            Some(lhs),
            Some(rhs),
            &ctx.code,
            ctx.location.clone(),
        );

        let expression_type = self.expression_type(ctx);
        if expression_type.is_problem() {
            debug!(
                "{}: vendor could not deduce a type for '{}', leaving it unknown",
                ctx.location, ctx.code
            );
        } else {
            let ty = self.types.create_from(&expression_type.spelling(), true);
            self.graph.set_type(node, ty);
        }

        node
    }

    fn handle_conditional_expression(
        &mut self,
        ctx: &VendorExpr,
        condition: &VendorExpr,
        positive: Option<&VendorExpr>,
        negative: &VendorExpr,
    ) -> NodeId {
        let condition = self.handle_expression(condition);
        // the GNU `?:` shortcut reuses the condition as the positive branch
        let then_expr = match positive {
            Some(p) => self.handle_expression(p),
            None => condition,
        };
        let else_expr = self.handle_expression(negative);

        let ty = self
            .types
            .create_from(&self.expression_type(ctx).spelling(), true);
        self.graph.new_conditional_expression(
            condition,
            then_expr,
            else_expr,
            ty,
            &ctx.code,
            ctx.location.clone(),
        )
    }

    fn handle_id_expression(&mut self, ctx: &VendorExpr, name: &str) -> NodeId {
        let reference = self.graph.new_declared_reference(
            name,
            Type::unknown(),
            &ctx.code,
            ctx.location.clone(),
        );

        let expression_type = self.expression_type(ctx);
        if expression_type.is_problem_like() {
            debug!("vendor could not deduce type of '{}', trying the binding", name);

            match self.resolver.resolve(name) {
                Some(declaration) if self.graph.node(declaration).kind.is_value_declaration() => {
                    let ty = self.graph.node(declaration).ty.clone();
                    self.graph.set_type(reference, ty);
                }
                Some(_) => {
                    debug!("unknown declaration kind, leaving the type unknown");
                }
                None => {
                    debug!("could not deduce the type manually, leaving it unknown");
                }
            }
        } else {
            let ty = self.types.create_from(&expression_type.spelling(), true);
            self.graph.set_type(reference, ty);
        }

        self.refers_to(reference, name);

        reference
    }

    fn handle_field_reference(
        &mut self,
        ctx: &VendorExpr,
        owner: &VendorExpr,
        field_name: &str,
        field_code: &str,
    ) -> NodeId {
        let base = self.handle_expression(owner);

        // the member should eventually be the declared field of the record;
        // until records are resolved a plain reference stands in for it
        let member = self.graph.new_declared_reference(
            field_name,
            Type::unknown(),
            field_code,
            ctx.location.clone(),
        );

        let member_expression =
            self.graph
                .new_member_expression(base, member, &ctx.code, ctx.location.clone());

        self.refers_to(member_expression, field_name);

        member_expression
    }

    fn handle_function_call_expression(
        &mut self,
        ctx: &VendorExpr,
        callee: &VendorExpr,
        arguments: &[VendorExpr],
    ) -> NodeId {
        let reference = self.handle_expression(callee);

        let call_expression = match self.graph.node(reference).kind.clone() {
            NodeKind::MemberExpression {
                base: Some(base),
                member: Some(member),
            } => {
                let base_typename = self.graph.node(base).ty.name().to_string();
                let member_name = self.graph.node(member).name.clone();
                self.graph.new_member_call_expression(
                    member_name.clone(),
                    format!("{base_typename}.{member_name}"),
                    Some(base),
                    member,
                    &ctx.code,
                    ctx.location.clone(),
                )
            }
            NodeKind::BinaryOperator {
                operator,
                lhs: Some(lhs),
                rhs: Some(rhs),
            } if operator == "." => {
                // a dot operator that was not classified as a member
                // expression: a function pointer call on an explicit object
                let reference_code = self.graph.node(reference).code.clone();
                self.graph.new_member_call_expression(
                    reference_code.clone(),
                    "",
                    Some(lhs),
                    rhs,
                    reference_code,
                    ctx.location.clone(),
                )
            }
            NodeKind::UnaryOperator {
                operator,
                operand: Some(operand),
                ..
            } if operator == "*" => {
                // classic C-style function pointer call; modeled as a member
                // call without a base for compatibility with the C++ shape
                let reference_code = self.graph.node(reference).code.clone();
                self.graph.new_member_call_expression(
                    reference_code.clone(),
                    "",
                    None,
                    operand,
                    reference_code,
                    ctx.location.clone(),
                )
            }
            _ => {
                let raw_name = self.graph.node(reference).name.clone();
                let name = match raw_name.rfind("::") {
                    Some(i) => raw_name[i + 2..].to_string(),
                    None => raw_name.clone(),
                };
                let fqn = raw_name.replace("::", ".");
                // TODO: qualify with the enclosing scope. The scope
                // manager's prefix is only correct inside namespaces;
                // inside a record it would produce the wrong name.
                // let prefix = self.scope.full_name_prefix();
                // if !prefix.is_empty() { fqn = format!("{prefix}.{fqn}"); }
                self.graph
                    .new_call_expression(name, fqn, &ctx.code, ctx.location.clone())
            }
        };

        for argument in arguments {
            let arg = self.handle_expression(argument);
            self.graph.add_call_argument(call_expression, arg);
        }

        // the callee reference itself is not part of the call shape, and
        // even its temporary creation must not leave artifacts behind in
        // the final graph
        self.graph.disconnect(reference);

        call_expression
    }

    fn handle_cast_expression(
        &mut self,
        ctx: &VendorExpr,
        operator: CastOperator,
        declared_type: &str,
        operand: &VendorExpr,
    ) -> NodeId {
        let operand = self.handle_expression(operand);

        let expression_type = self.expression_type(ctx);
        let cast_type = match &expression_type {
            VendorType::Pointer(inner) if inner.is_problem() => {
                // fall back to the spelled type-id
                self.types.create_from(&format!("{declared_type}*"), true)
            }
            VendorType::Pointer(inner) => self
                .types
                .create_from(&format!("{}*", inner.spelling()), true),
            VendorType::Problem => {
                // fall back to the spelled type-id
                // TODO: resolve named cast targets through the binding, the
                // way the new-expression handler does
                self.types.create_from(declared_type, true)
            }
            other => self.types.create_from(&other.spelling(), true),
        };

        let cast = self.graph.new_cast_expression(
            Some(operand),
            cast_type.clone(),
            operator,
            &ctx.code,
            ctx.location.clone(),
        );

        if self.types.is_primitive(&cast_type) || operator == CastOperator::CStyle {
            self.graph.set_type(cast, cast_type);
        } else {
            self.graph.register_type_listener(operand, cast);
        }

        cast
    }

    fn handle_simple_type_constructor(
        &mut self,
        ctx: &VendorExpr,
        initializer: &VendorInitializer,
    ) -> NodeId {
        let expression = self.handle_initializer(initializer);

        let expression_type = self.expression_type(ctx);
        let cast_type = match &expression_type {
            VendorType::Pointer(inner) => self
                .types
                .create_from(&format!("{}*", inner.spelling()), true),
            other => self.types.create_from(&other.spelling(), true),
        };

        let cast = self.graph.new_cast_expression(
            Some(expression),
            cast_type.clone(),
            CastOperator::Implicit,
            &ctx.code,
            ctx.location.clone(),
        );

        if self.types.is_primitive(&cast_type) {
            self.graph.set_type(cast, cast_type);
        } else {
            self.graph.register_type_listener(expression, cast);
        }

        cast
    }

    fn handle_new_expression(
        &mut self,
        ctx: &VendorExpr,
        declared_type: &str,
        named_type: Option<&str>,
        initializer: &Option<Box<VendorInitializer>>,
    ) -> NodeId {
        let vendor_type = self.expression_type(ctx);
        let ty = self
            .types
            .create_from(&vendor_type.spelling(), true)
            .pointer_of(PointerOrigin::Array);

        let new_expression =
            self.graph
                .new_new_expression(ty, &ctx.code, ctx.location.clone());

        // try to actually resolve the allocated type
        if let Some(type_name) = named_type {
            match self.resolver.resolve(type_name) {
                Some(declaration)
                    if matches!(
                        self.graph.node(declaration).kind,
                        NodeKind::RecordDeclaration { .. }
                    ) =>
                {
                    let resolved = self.graph.node(declaration).name.clone();
                    let ty = self.types.create_from(&resolved, true);
                    self.graph.set_type(new_expression, ty);
                }
                _ => {
                    debug!(
                        "{}: could not resolve binding of type {} for '{}', it is probably defined somewhere externally",
                        ctx.location, declared_type, ctx.code
                    );
                }
            }
        }

        if let Some(init) = initializer {
            let lowered = self.handle_initializer(init);
            self.graph.set_new_initializer(new_expression, lowered);
        }

        new_expression
    }

    fn handle_initializer_list(&mut self, ctx: &VendorExpr, clauses: &[VendorExpr]) -> NodeId {
        let initializers: Vec<NodeId> = clauses
            .iter()
            .map(|clause| self.handle_expression(clause))
            .collect();

        let list = self.graph.new_initializer_list_expression(
            initializers.clone(),
            &ctx.code,
            ctx.location.clone(),
        );

        // the list's type follows its clauses (one array layer on top)
        for initializer in initializers {
            self.graph.register_type_listener(initializer, list);
        }

        list
    }

    fn handle_designated_initializer(
        &mut self,
        ctx: &VendorExpr,
        designators: &[VendorDesignator],
        operand: &VendorExpr,
    ) -> NodeId {
        let rhs = self.handle_expression(operand);

        let mut lhs = Vec::new();
        if designators.is_empty() {
            error!("{}: no designator found", ctx.location);
        }
        for designator in designators {
            let one_lhs = match designator {
                VendorDesignator::Subscript { expression } => {
                    Some(self.handle_expression(expression))
                }
                VendorDesignator::Field { name, code } => Some(self.graph.new_declared_reference(
                    name,
                    Type::unknown(),
                    code,
                    ctx.location.clone(),
                )),
                VendorDesignator::Range {
                    floor,
                    ceiling,
                    code,
                } => {
                    let floor = self.handle_expression(floor);
                    let ceiling = self.handle_expression(ceiling);
                    Some(self.graph.new_array_range_expression(
                        floor,
                        ceiling,
                        code,
                        ctx.location.clone(),
                    ))
                }
                VendorDesignator::Opaque { class_name } => {
                    error!("{}: unknown designated lhs {}", ctx.location, class_name);
                    None
                }
            };
            if let Some(one_lhs) = one_lhs {
                lhs.push(one_lhs);
            }
        }

        self.graph.new_designated_initializer_expression(
            lhs,
            rhs,
            &ctx.code,
            ctx.location.clone(),
        )
    }

    fn handle_expression_list(&mut self, ctx: &VendorExpr, expressions: &[VendorExpr]) -> NodeId {
        let lowered: Vec<NodeId> = expressions
            .iter()
            .map(|e| self.handle_expression(e))
            .collect();
        self.graph
            .new_expression_list(lowered, &ctx.code, ctx.location.clone())
    }

    fn handle_delete_expression(
        &mut self,
        ctx: &VendorExpr,
        operand: &VendorExpr,
        implicit_destructor_names: &[String],
    ) -> NodeId {
        for name in implicit_destructor_names {
            debug!("implicit destructor name {}", name);
        }
        let operand = self.handle_expression(operand);
        self.graph
            .new_delete_expression(Some(operand), &ctx.code, ctx.location.clone())
    }

    fn handle_array_subscript_expression(
        &mut self,
        ctx: &VendorExpr,
        array: &VendorExpr,
        argument: &VendorExpr,
    ) -> NodeId {
        let array = self.handle_expression(array);
        let subscript = self.handle_expression(argument);
        self.graph
            .new_array_subscript_expression(array, subscript, &ctx.code, ctx.location.clone())
    }

    fn handle_type_id_expression(
        &mut self,
        ctx: &VendorExpr,
        operator: VendorTypeIdOperator,
        declared_type: &str,
    ) -> NodeId {
        let (operator_code, ty) = match operator {
            VendorTypeIdOperator::SizeOf => {
                ("sizeof", self.types.create_from("std::size_t", true))
            }
            VendorTypeIdOperator::TypeId => (
                "typeid",
                self.types.create_from("const std::type_info&", true),
            ),
            VendorTypeIdOperator::AlignOf => {
                ("alignof", self.types.create_from("std::size_t", true))
            }
            // typeof is not an official C++ keyword; its result type is
            // anybody's guess
            VendorTypeIdOperator::TypeOf => ("typeof", Type::unknown()),
            other => {
                debug!("{}: unknown typeid operator code {:?}", ctx.location, other);
                ("", Type::unknown())
            }
        };

        let referenced_type = self.types.create_from(declared_type, true);

        self.graph.new_type_id_expression(
            operator_code,
            ty,
            referenced_type,
            &ctx.code,
            ctx.location.clone(),
        )
    }

    fn handle_compound_statement_expression(
        &mut self,
        ctx: &VendorExpr,
        statement: &VendorStmt,
    ) -> NodeId {
        let lowered = self.handle_statement(statement);
        self.graph.new_compound_statement_expression(
            Some(lowered),
            &ctx.code,
            ctx.location.clone(),
        )
    }

    /// Record a REFERS_TO edge when the binding resolver knows the name.
    fn refers_to(&mut self, use_site: NodeId, name: &str) {
        if let Some(declaration) = self.resolver.resolve(name) {
            self.graph.set_refers_to(use_site, declaration);
        }
    }
}

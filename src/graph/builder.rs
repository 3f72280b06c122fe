//! Node factories.
//!
//! Pure constructor surface: every factory stamps location, raw code, and a
//! type (the Unknown sentinel unless the node kind carries one by
//! construction), and records AST containment for the children named in the
//! payload. Factories never create DFG edges or listener subscriptions;
//! that wiring belongs to the caller.

use rustc_hash::FxHashSet;

use crate::graph::location::SourceSpan;
use crate::graph::node::{CastOperator, LiteralValue, Node, NodeKind};
use crate::graph::{Graph, NodeId};
use crate::types::Type;

impl Graph {
    fn base_node(
        name: impl Into<String>,
        ty: Type,
        code: impl Into<String>,
        location: SourceSpan,
        kind: NodeKind,
    ) -> Node {
        Node {
            id: NodeId(0),
            name: name.into(),
            code: code.into(),
            location,
            ty,
            possible_subtypes: FxHashSet::default(),
            type_listeners: Vec::new(),
            ast_parent: None,
            dfg_prev: Vec::new(),
            dfg_next: Vec::new(),
            refers_to: None,
            argument_index: None,
            kind,
        }
    }

    pub fn new_literal(
        &mut self,
        value: LiteralValue,
        ty: Type,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        let code = code.into();
        let name = code.clone();
        self.push(Self::base_node(
            name,
            ty,
            code,
            location,
            NodeKind::Literal { value },
        ))
    }

    pub fn new_declared_reference(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            name,
            ty,
            code,
            location,
            NodeKind::DeclaredReference,
        ))
    }

    pub fn new_member_expression(
        &mut self,
        base: NodeId,
        member: NodeId,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        let name = self.node(member).name.clone();
        self.push(Self::base_node(
            name,
            Type::unknown(),
            code,
            location,
            NodeKind::MemberExpression {
                base: Some(base),
                member: Some(member),
            },
        ))
    }

    pub fn new_unary_operator(
        &mut self,
        operator: impl Into<String>,
        is_postfix: bool,
        is_prefix: bool,
        operand: Option<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        let operator = operator.into();
        self.push(Self::base_node(
            operator.clone(),
            Type::unknown(),
            code,
            location,
            NodeKind::UnaryOperator {
                operator,
                is_postfix,
                is_prefix,
                operand,
            },
        ))
    }

    pub fn new_binary_operator(
        &mut self,
        operator: impl Into<String>,
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        let operator = operator.into();
        self.push(Self::base_node(
            operator.clone(),
            Type::unknown(),
            code,
            location,
            NodeKind::BinaryOperator { operator, lhs, rhs },
        ))
    }

    pub fn new_conditional_expression(
        &mut self,
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
        ty: Type,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            ty,
            code,
            location,
            NodeKind::ConditionalExpression {
                condition: Some(condition),
                then_expr: Some(then_expr),
                else_expr: Some(else_expr),
            },
        ))
    }

    pub fn new_cast_expression(
        &mut self,
        operand: Option<NodeId>,
        cast_type: Type,
        operator: CastOperator,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::CastExpression {
                operand,
                cast_type,
                operator,
            },
        ))
    }

    pub fn new_call_expression(
        &mut self,
        name: impl Into<String>,
        fqn: impl Into<String>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            name,
            Type::unknown(),
            code,
            location,
            NodeKind::CallExpression {
                fqn: fqn.into(),
                arguments: Vec::new(),
            },
        ))
    }

    pub fn new_member_call_expression(
        &mut self,
        name: impl Into<String>,
        fqn: impl Into<String>,
        base: Option<NodeId>,
        member: NodeId,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            name,
            Type::unknown(),
            code,
            location,
            NodeKind::MemberCallExpression {
                fqn: fqn.into(),
                base,
                member: Some(member),
                arguments: Vec::new(),
            },
        ))
    }

    /// Append an argument to a call of either shape, recording containment
    /// and the argument position.
    pub fn add_call_argument(&mut self, call: NodeId, argument: NodeId) {
        let index = match &mut self.node_mut(call).kind {
            NodeKind::CallExpression { arguments, .. }
            | NodeKind::MemberCallExpression { arguments, .. } => {
                arguments.push(argument);
                arguments.len() - 1
            }
            other => {
                debug_assert!(false, "add_call_argument on {}", other.kind_name());
                return;
            }
        };
        self.adopt(call, argument);
        self.set_argument_index(argument, index);
    }

    pub fn new_array_subscript_expression(
        &mut self,
        array: NodeId,
        subscript: NodeId,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::ArraySubscriptExpression {
                array: Some(array),
                subscript: Some(subscript),
            },
        ))
    }

    pub fn new_new_expression(
        &mut self,
        ty: Type,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            ty,
            code,
            location,
            NodeKind::NewExpression { initializer: None },
        ))
    }

    /// Attach the lowered initializer of a `new` expression.
    pub fn set_new_initializer(&mut self, new_expr: NodeId, init: NodeId) {
        match &mut self.node_mut(new_expr).kind {
            NodeKind::NewExpression { initializer } => *initializer = Some(init),
            _ => return,
        }
        self.adopt(new_expr, init);
    }

    pub fn new_delete_expression(
        &mut self,
        operand: Option<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::DeleteExpression { operand },
        ))
    }

    pub fn new_initializer_list_expression(
        &mut self,
        initializers: Vec<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::InitializerListExpression { initializers },
        ))
    }

    pub fn new_designated_initializer_expression(
        &mut self,
        lhs: Vec<NodeId>,
        rhs: NodeId,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::DesignatedInitializerExpression {
                lhs,
                rhs: Some(rhs),
            },
        ))
    }

    pub fn new_array_range_expression(
        &mut self,
        floor: NodeId,
        ceiling: NodeId,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::ArrayRangeExpression {
                floor: Some(floor),
                ceiling: Some(ceiling),
            },
        ))
    }

    pub fn new_expression_list(
        &mut self,
        expressions: Vec<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::ExpressionList { expressions },
        ))
    }

    pub fn new_compound_statement_expression(
        &mut self,
        statement: Option<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::CompoundStatementExpression { statement },
        ))
    }

    pub fn new_type_id_expression(
        &mut self,
        operator: impl Into<String>,
        ty: Type,
        referenced_type: Type,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        let operator = operator.into();
        self.push(Self::base_node(
            operator.clone(),
            ty,
            code,
            location,
            NodeKind::TypeIdExpression {
                operator,
                referenced_type,
            },
        ))
    }

    /// Generic expression node; fallback for unrecognized vendor shapes.
    pub fn new_expression(&mut self, code: impl Into<String>, location: SourceSpan) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::Expression,
        ))
    }

    pub fn new_variable_declaration(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            name,
            ty,
            code,
            location,
            NodeKind::VariableDeclaration {
                initializer: None,
                implicit_initializer_allowed: false,
                is_array: false,
            },
        ))
    }

    pub fn set_implicit_initializer_allowed(&mut self, decl: NodeId, allowed: bool) {
        if let NodeKind::VariableDeclaration {
            implicit_initializer_allowed,
            ..
        } = &mut self.node_mut(decl).kind
        {
            *implicit_initializer_allowed = allowed;
        }
    }

    pub fn set_is_array(&mut self, decl: NodeId, array: bool) {
        if let NodeKind::VariableDeclaration { is_array, .. } = &mut self.node_mut(decl).kind {
            *is_array = array;
        }
    }

    pub fn new_record_declaration(
        &mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            name,
            Type::unknown(),
            code,
            location,
            NodeKind::RecordDeclaration { kind: kind.into() },
        ))
    }

    pub fn new_compound_statement(
        &mut self,
        statements: Vec<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::CompoundStatement { statements },
        ))
    }

    pub fn new_declaration_statement(
        &mut self,
        declarations: Vec<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::DeclarationStatement { declarations },
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_for_statement(
        &mut self,
        initializer_statement: Option<NodeId>,
        condition_declaration: Option<NodeId>,
        condition: Option<NodeId>,
        iteration_expression: Option<NodeId>,
        body: Option<NodeId>,
        code: impl Into<String>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::ForStatement {
                initializer_statement,
                condition_declaration,
                condition,
                iteration_expression,
                body,
            },
        ))
    }

    /// Generic statement node; fallback for unrecognized vendor shapes.
    pub fn new_statement(&mut self, code: impl Into<String>, location: SourceSpan) -> NodeId {
        self.push(Self::base_node(
            "",
            Type::unknown(),
            code,
            location,
            NodeKind::Statement,
        ))
    }

    pub fn new_translation_unit(
        &mut self,
        name: impl Into<String>,
        declarations: Vec<NodeId>,
        location: SourceSpan,
    ) -> NodeId {
        self.push(Self::base_node(
            name,
            Type::unknown(),
            "",
            location,
            NodeKind::TranslationUnit { declarations },
        ))
    }
}

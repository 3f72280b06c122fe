//! Graph node definitions.
//!
//! Nodes are a tagged union: a common header (identity, name, raw code,
//! location, type state, edge slots) plus a variant payload holding the
//! AST child slots for that node kind. Child slots store [`NodeId`]s into
//! the owning [`Graph`](crate::graph::Graph) arena.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::location::SourceSpan;
use crate::graph::NodeId;
use crate::types::Type;
use rustc_hash::FxHashSet;

/// Evaluated literal payload.
///
/// Integer literals keep the narrowest representation that holds them:
/// `Int` for 32-bit signed, `Long` for 64-bit signed, `BigInt` for values
/// beyond the signed 64-bit range (interpreted as unsigned). `Text` carries
/// literal shapes the vendor could not evaluate (hex floats and friends).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    BigInt(u128),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Text(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Bool(v) => write!(f, "{v}"),
            LiteralValue::Int(v) => write!(f, "{v}"),
            LiteralValue::Long(v) => write!(f, "{v}"),
            LiteralValue::BigInt(v) => write!(f, "{v}"),
            LiteralValue::Float(v) => write!(f, "{v}"),
            LiteralValue::Double(v) => write!(f, "{v}"),
            LiteralValue::Char(c) => write!(f, "{c:?}"),
            LiteralValue::String(s) => write!(f, "{s:?}"),
            LiteralValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Cast operator kinds, with the vendor's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CastOperator {
    /// Plain/implicit cast (also used by simple-type constructors).
    Implicit = 0,
    Dynamic = 1,
    Static = 2,
    Reinterpret = 3,
    /// C-style cast `(T) e`.
    CStyle = 4,
    Const = 5,
}

/// Variant payload of a graph node.
///
/// Every `NodeId` stored here is an AST child of the node; the tree shape of
/// a translation unit is given by these slots plus the `ast_parent` back
/// link maintained by the factories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    // --- expressions -----------------------------------------------------
    Literal {
        value: LiteralValue,
    },
    /// A reference to a declared symbol; the name lives in the node header,
    /// the resolved declaration in the `refers_to` edge.
    DeclaredReference,
    MemberExpression {
        base: Option<NodeId>,
        member: Option<NodeId>,
    },
    UnaryOperator {
        operator: String,
        is_postfix: bool,
        is_prefix: bool,
        operand: Option<NodeId>,
    },
    BinaryOperator {
        operator: String,
        lhs: Option<NodeId>,
        rhs: Option<NodeId>,
    },
    ConditionalExpression {
        condition: Option<NodeId>,
        then_expr: Option<NodeId>,
        else_expr: Option<NodeId>,
    },
    CastExpression {
        operand: Option<NodeId>,
        cast_type: Type,
        operator: CastOperator,
    },
    /// Free function call. The simple name lives in the node header.
    CallExpression {
        fqn: String,
        arguments: Vec<NodeId>,
    },
    /// Member call: exactly two operand slots, base and member. A C-style
    /// function-pointer call has no base.
    MemberCallExpression {
        fqn: String,
        base: Option<NodeId>,
        member: Option<NodeId>,
        arguments: Vec<NodeId>,
    },
    ArraySubscriptExpression {
        array: Option<NodeId>,
        subscript: Option<NodeId>,
    },
    NewExpression {
        initializer: Option<NodeId>,
    },
    DeleteExpression {
        operand: Option<NodeId>,
    },
    InitializerListExpression {
        initializers: Vec<NodeId>,
    },
    DesignatedInitializerExpression {
        lhs: Vec<NodeId>,
        rhs: Option<NodeId>,
    },
    ArrayRangeExpression {
        floor: Option<NodeId>,
        ceiling: Option<NodeId>,
    },
    ExpressionList {
        expressions: Vec<NodeId>,
    },
    CompoundStatementExpression {
        statement: Option<NodeId>,
    },
    TypeIdExpression {
        operator: String,
        referenced_type: Type,
    },
    /// Generic expression; fallback for unrecognized vendor shapes.
    Expression,

    // --- declarations ----------------------------------------------------
    VariableDeclaration {
        initializer: Option<NodeId>,
        implicit_initializer_allowed: bool,
        is_array: bool,
    },
    /// Minimal record (struct/class) declaration so binding resolution can
    /// answer `new T` with a real record.
    RecordDeclaration {
        kind: String,
    },

    // --- statements ------------------------------------------------------
    CompoundStatement {
        statements: Vec<NodeId>,
    },
    DeclarationStatement {
        declarations: Vec<NodeId>,
    },
    ForStatement {
        initializer_statement: Option<NodeId>,
        condition_declaration: Option<NodeId>,
        condition: Option<NodeId>,
        iteration_expression: Option<NodeId>,
        body: Option<NodeId>,
    },
    /// Generic statement; fallback for unrecognized vendor shapes.
    Statement,

    // --- roots -----------------------------------------------------------
    TranslationUnit {
        declarations: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Short name for log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Literal { .. } => "Literal",
            NodeKind::DeclaredReference => "DeclaredReference",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::UnaryOperator { .. } => "UnaryOperator",
            NodeKind::BinaryOperator { .. } => "BinaryOperator",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::CastExpression { .. } => "CastExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::MemberCallExpression { .. } => "MemberCallExpression",
            NodeKind::ArraySubscriptExpression { .. } => "ArraySubscriptExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::DeleteExpression { .. } => "DeleteExpression",
            NodeKind::InitializerListExpression { .. } => "InitializerListExpression",
            NodeKind::DesignatedInitializerExpression { .. } => "DesignatedInitializerExpression",
            NodeKind::ArrayRangeExpression { .. } => "ArrayRangeExpression",
            NodeKind::ExpressionList { .. } => "ExpressionList",
            NodeKind::CompoundStatementExpression { .. } => "CompoundStatementExpression",
            NodeKind::TypeIdExpression { .. } => "TypeIdExpression",
            NodeKind::Expression => "Expression",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::RecordDeclaration { .. } => "RecordDeclaration",
            NodeKind::CompoundStatement { .. } => "CompoundStatement",
            NodeKind::DeclarationStatement { .. } => "DeclarationStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::Statement => "Statement",
            NodeKind::TranslationUnit { .. } => "TranslationUnit",
        }
    }

    /// Expression kinds that subscribe to other nodes' types. These get the
    /// reverse subscription in the initializer protocol so the declaration
    /// can inform them when its own type firms up.
    pub fn is_type_listener(&self) -> bool {
        matches!(
            self,
            NodeKind::CastExpression { .. } | NodeKind::InitializerListExpression { .. }
        )
    }

    /// Declarations that carry a value type (targets for use-site type
    /// recovery when the vendor reports a problem type).
    pub fn is_value_declaration(&self) -> bool {
        matches!(self, NodeKind::VariableDeclaration { .. })
    }

    /// All AST child slots, in slot order.
    pub fn ast_children(&self) -> Vec<NodeId> {
        fn push(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
            if let Some(id) = id {
                out.push(*id);
            }
        }
        let mut out = Vec::new();
        match self {
            NodeKind::Literal { .. }
            | NodeKind::DeclaredReference
            | NodeKind::TypeIdExpression { .. }
            | NodeKind::Expression
            | NodeKind::RecordDeclaration { .. }
            | NodeKind::Statement => {}
            NodeKind::MemberExpression { base, member } => {
                push(&mut out, base);
                push(&mut out, member);
            }
            NodeKind::UnaryOperator { operand, .. } => push(&mut out, operand),
            NodeKind::BinaryOperator { lhs, rhs, .. } => {
                push(&mut out, lhs);
                push(&mut out, rhs);
            }
            NodeKind::ConditionalExpression {
                condition,
                then_expr,
                else_expr,
            } => {
                push(&mut out, condition);
                push(&mut out, then_expr);
                push(&mut out, else_expr);
            }
            NodeKind::CastExpression { operand, .. } => push(&mut out, operand),
            NodeKind::CallExpression { arguments, .. } => out.extend(arguments.iter().copied()),
            NodeKind::MemberCallExpression {
                base,
                member,
                arguments,
                ..
            } => {
                push(&mut out, base);
                push(&mut out, member);
                out.extend(arguments.iter().copied());
            }
            NodeKind::ArraySubscriptExpression { array, subscript } => {
                push(&mut out, array);
                push(&mut out, subscript);
            }
            NodeKind::NewExpression { initializer } => push(&mut out, initializer),
            NodeKind::DeleteExpression { operand } => push(&mut out, operand),
            NodeKind::InitializerListExpression { initializers } => {
                out.extend(initializers.iter().copied());
            }
            NodeKind::DesignatedInitializerExpression { lhs, rhs } => {
                out.extend(lhs.iter().copied());
                push(&mut out, rhs);
            }
            NodeKind::ArrayRangeExpression { floor, ceiling } => {
                push(&mut out, floor);
                push(&mut out, ceiling);
            }
            NodeKind::ExpressionList { expressions } => out.extend(expressions.iter().copied()),
            NodeKind::CompoundStatementExpression { statement } => push(&mut out, statement),
            NodeKind::VariableDeclaration { initializer, .. } => push(&mut out, initializer),
            NodeKind::CompoundStatement { statements } => out.extend(statements.iter().copied()),
            NodeKind::DeclarationStatement { declarations } => {
                out.extend(declarations.iter().copied());
            }
            NodeKind::ForStatement {
                initializer_statement,
                condition_declaration,
                condition,
                iteration_expression,
                body,
            } => {
                push(&mut out, initializer_statement);
                push(&mut out, condition_declaration);
                push(&mut out, condition);
                push(&mut out, iteration_expression);
                push(&mut out, body);
            }
            NodeKind::TranslationUnit { declarations } => {
                out.extend(declarations.iter().copied());
            }
        }
        out
    }

    /// Empty every AST child slot. Used when a node is disconnected from the
    /// graph; the children themselves are untouched.
    pub(crate) fn clear_children(&mut self) {
        match self {
            NodeKind::Literal { .. }
            | NodeKind::DeclaredReference
            | NodeKind::TypeIdExpression { .. }
            | NodeKind::Expression
            | NodeKind::RecordDeclaration { .. }
            | NodeKind::Statement => {}
            NodeKind::MemberExpression { base, member } => {
                *base = None;
                *member = None;
            }
            NodeKind::UnaryOperator { operand, .. } => *operand = None,
            NodeKind::BinaryOperator { lhs, rhs, .. } => {
                *lhs = None;
                *rhs = None;
            }
            NodeKind::ConditionalExpression {
                condition,
                then_expr,
                else_expr,
            } => {
                *condition = None;
                *then_expr = None;
                *else_expr = None;
            }
            NodeKind::CastExpression { operand, .. } => *operand = None,
            NodeKind::CallExpression { arguments, .. } => arguments.clear(),
            NodeKind::MemberCallExpression {
                base,
                member,
                arguments,
                ..
            } => {
                *base = None;
                *member = None;
                arguments.clear();
            }
            NodeKind::ArraySubscriptExpression { array, subscript } => {
                *array = None;
                *subscript = None;
            }
            NodeKind::NewExpression { initializer } => *initializer = None,
            NodeKind::DeleteExpression { operand } => *operand = None,
            NodeKind::InitializerListExpression { initializers } => initializers.clear(),
            NodeKind::DesignatedInitializerExpression { lhs, rhs } => {
                lhs.clear();
                *rhs = None;
            }
            NodeKind::ArrayRangeExpression { floor, ceiling } => {
                *floor = None;
                *ceiling = None;
            }
            NodeKind::ExpressionList { expressions } => expressions.clear(),
            NodeKind::CompoundStatementExpression { statement } => *statement = None,
            NodeKind::VariableDeclaration { initializer, .. } => *initializer = None,
            NodeKind::CompoundStatement { statements } => statements.clear(),
            NodeKind::DeclarationStatement { declarations } => declarations.clear(),
            NodeKind::ForStatement {
                initializer_statement,
                condition_declaration,
                condition,
                iteration_expression,
                body,
            } => {
                *initializer_statement = None;
                *condition_declaration = None;
                *condition = None;
                *iteration_expression = None;
                *body = None;
            }
            NodeKind::TranslationUnit { declarations } => declarations.clear(),
        }
    }
}

/// A graph node: common header plus variant payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Symbol name where the kind has one (references, declarations, calls).
    pub name: String,
    /// Raw source fragment this node was lowered from.
    pub code: String,
    pub location: SourceSpan,
    /// Declared type; the Unknown sentinel when not yet inferred.
    pub ty: Type,
    /// Possible concrete subtypes; need not contain `ty`.
    pub possible_subtypes: FxHashSet<Type>,
    /// Subscribers notified on every change to `ty` or `possible_subtypes`.
    pub(crate) type_listeners: Vec<NodeId>,
    pub ast_parent: Option<NodeId>,
    /// Incoming data-flow edges (sources flowing into this node).
    pub dfg_prev: Vec<NodeId>,
    /// Outgoing data-flow edges.
    pub dfg_next: Vec<NodeId>,
    /// Resolved declaration for symbol uses.
    pub refers_to: Option<NodeId>,
    /// Position within the argument list of an enclosing call.
    pub argument_index: Option<usize>,
    pub kind: NodeKind,
}

impl Node {
    /// Subscribers as last published (snapshot semantics are handled by the
    /// propagation bus).
    pub fn type_listeners(&self) -> &[NodeId] {
        &self.type_listeners
    }
}

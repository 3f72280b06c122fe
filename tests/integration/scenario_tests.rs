//! End-to-end lowering scenarios: declarations, initializers, calls, and
//! casts through the public translation-unit entry point.

use cpg_cxx::frontend::{lower_translation_unit, EmptyScope, SimpleResolver};
use cpg_cxx::graph::node::{LiteralValue, NodeKind};
use cpg_cxx::types::{TypeOrigin, TypeRegistry};
use cpg_cxx::vendor::{
    VendorBasicKind, VendorDeclarator, VendorExpr, VendorExprKind, VendorInitializer,
    VendorNumber, VendorTranslationUnit, VendorType, VendorValue,
};
use cpg_cxx::CastOperator;

use crate::common::{id_expr, init_list, int_literal, lower, simple_decl};

#[test]
fn declared_type_wins_over_initializer_type() {
    // int x = 0xFFul;
    let lowered = lower(vec![simple_decl(
        "int",
        VendorDeclarator::named("x")
            .with_initializer(VendorInitializer::Equals(int_literal("0xFFul"))),
        "int x = 0xFFul;",
    )]);
    let g = &lowered.graph;

    let v = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::VariableDeclaration { .. }))
        .expect("variable declaration");
    assert_eq!(v.name, "x");
    assert_eq!(v.ty.name(), "int");
    assert_eq!(v.ty.origin(), TypeOrigin::Declared);

    let init = g.variable_initializer(v.id).expect("initializer");
    match &g.node(init).kind {
        NodeKind::Literal { value } => assert_eq!(*value, LiteralValue::BigInt(255)),
        other => panic!("expected literal, got {}", other.kind_name()),
    }
    assert_eq!(g.node(init).ty.name(), "unsigned long");
}

#[test]
fn auto_declaration_infers_initializer_type_via_dataflow() {
    // auto y = 0xFFFFFFFFFFFFFFFFull;
    let lowered = lower(vec![simple_decl(
        "auto",
        VendorDeclarator::named("y").with_initializer(VendorInitializer::Equals(int_literal(
            "0xFFFFFFFFFFFFFFFFull",
        ))),
        "auto y = 0xFFFFFFFFFFFFFFFFull;",
    )]);
    let g = &lowered.graph;

    let v = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::VariableDeclaration { .. }))
        .expect("variable declaration");
    assert_eq!(v.ty.name(), "unsigned long long");
    assert_eq!(v.ty.origin(), TypeOrigin::Dataflow);

    let init = g.variable_initializer(v.id).expect("initializer");
    match &g.node(init).kind {
        NodeKind::Literal { value } => {
            assert_eq!(*value, LiteralValue::BigInt(u64::MAX as u128));
        }
        other => panic!("expected literal, got {}", other.kind_name()),
    }
}

#[test]
fn brace_list_for_object_strips_array_layer() {
    // A a{1, 2}; with an unresolvable A: the declaration's type is unknown,
    // the list carries int[], and the variable strips the layer
    let lowered = lower(vec![simple_decl(
        "auto",
        VendorDeclarator::named("a").with_initializer(VendorInitializer::Brace(init_list(
            vec![int_literal("1"), int_literal("2")],
            "{1, 2}",
        ))),
        "auto a{1, 2};",
    )]);
    let g = &lowered.graph;

    let v = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::VariableDeclaration { .. }))
        .expect("variable declaration");
    let init = g.variable_initializer(v.id).expect("initializer");

    assert_eq!(g.node(init).ty.to_string(), "int[]");
    assert_eq!(v.ty.to_string(), "int");
    assert_eq!(v.ty.origin(), TypeOrigin::Dataflow);
}

#[test]
fn brace_list_with_known_object_type_is_kept() {
    // A a{1, 2}; A resolves, so the declared type wins over the list
    let lowered = lower(vec![simple_decl(
        "A",
        VendorDeclarator::named("a").with_initializer(VendorInitializer::Brace(init_list(
            vec![int_literal("1"), int_literal("2")],
            "{1, 2}",
        ))),
        "A a{1, 2};",
    )]);
    let g = &lowered.graph;

    let v = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::VariableDeclaration { .. }))
        .expect("variable declaration");
    assert_eq!(v.ty.to_string(), "A");
}

#[test]
fn array_declaration_keeps_list_array_type() {
    // int arr[] = {1, 2, 3};
    let lowered = lower(vec![simple_decl(
        "int",
        VendorDeclarator::named("arr")
            .array()
            .with_initializer(VendorInitializer::Equals(init_list(
                vec![int_literal("1"), int_literal("2"), int_literal("3")],
                "{1, 2, 3}",
            ))),
        "int arr[] = {1, 2, 3};",
    )]);
    let g = &lowered.graph;

    let v = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::VariableDeclaration { .. }))
        .expect("variable declaration");
    assert!(matches!(
        v.kind,
        NodeKind::VariableDeclaration { is_array: true, .. }
    ));
    assert_eq!(v.ty.to_string(), "int[]");

    let init = g.variable_initializer(v.id).expect("initializer");
    assert_eq!(g.node(init).ty, v.ty);
}

#[test]
fn call_shapes_from_callee_shape() {
    // int r = f(x); is a free call through a declaration initializer
    let call = VendorExpr::new(
        VendorExprKind::FunctionCall {
            callee: Box::new(id_expr("f")),
            arguments: vec![id_expr("x")],
        },
        "f(x)",
    );
    let lowered = lower(vec![simple_decl(
        "int",
        VendorDeclarator::named("r").with_initializer(VendorInitializer::Equals(call)),
        "int r = f(x);",
    )]);
    let g = &lowered.graph;

    let call = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::CallExpression { .. }))
        .expect("call expression");
    assert_eq!(call.name, "f");

    // o.f(x): a member call
    let callee = VendorExpr::new(
        VendorExprKind::FieldReference {
            owner: Box::new(id_expr("o").with_type(VendorType::named("MyObj"))),
            field_name: "f".to_string(),
            field_code: "f".to_string(),
        },
        "o.f",
    );
    let call = VendorExpr::new(
        VendorExprKind::FunctionCall {
            callee: Box::new(callee),
            arguments: vec![id_expr("x")],
        },
        "o.f(x)",
    );
    let lowered = lower(vec![simple_decl(
        "int",
        VendorDeclarator::named("r").with_initializer(VendorInitializer::Equals(call)),
        "int r = o.f(x);",
    )]);
    let g = &lowered.graph;
    let call = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::MemberCallExpression { .. }))
        .expect("member call");
    match &call.kind {
        NodeKind::MemberCallExpression { fqn, base, .. } => {
            assert_eq!(call.name, "f");
            assert_eq!(fqn, "MyObj.f");
            assert_eq!(g.node(base.expect("base")).name, "o");
        }
        _ => unreachable!(),
    }

    // (*p)(x): a C-style function pointer call, member call without a base
    let callee = VendorExpr::new(
        VendorExprKind::Unary {
            operator: cpg_cxx::vendor::VendorUnaryOperator::Star,
            operand: Some(Box::new(id_expr("p"))),
        },
        "(*p)",
    );
    let call = VendorExpr::new(
        VendorExprKind::FunctionCall {
            callee: Box::new(callee),
            arguments: vec![id_expr("x")],
        },
        "(*p)(x)",
    );
    let lowered = lower(vec![simple_decl(
        "int",
        VendorDeclarator::named("r").with_initializer(VendorInitializer::Equals(call)),
        "int r = (*p)(x);",
    )]);
    let g = &lowered.graph;
    let call = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::MemberCallExpression { .. }))
        .expect("member call");
    match &call.kind {
        NodeKind::MemberCallExpression { base, member, .. } => {
            assert!(base.is_none());
            assert_eq!(g.node(member.expect("member")).name, "p");
        }
        _ => unreachable!(),
    }
}

#[test]
fn primitive_cast_type_is_fixed() {
    // int c = (int)3.14;
    let cast = VendorExpr::new(
        VendorExprKind::Cast {
            operator: CastOperator::CStyle,
            declared_type: "int".to_string(),
            operand: Box::new(
                VendorExpr::new(
                    VendorExprKind::Literal {
                        value: VendorValue::Number(VendorNumber::Floating(3.14)),
                        spelling: "3.14".to_string(),
                    },
                    "3.14",
                )
                .with_type(VendorType::basic(VendorBasicKind::Double, "double")),
            ),
        },
        "(int)3.14",
    )
    .with_type(VendorType::basic(VendorBasicKind::Int, "int"));

    let lowered = lower(vec![simple_decl(
        "int",
        VendorDeclarator::named("c").with_initializer(VendorInitializer::Equals(cast)),
        "int c = (int)3.14;",
    )]);
    let g = &lowered.graph;

    let cast = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::CastExpression { .. }))
        .expect("cast");
    assert_eq!(cast.ty.name(), "int");
    match &cast.kind {
        NodeKind::CastExpression { operand, .. } => {
            assert!(g.node(operand.expect("operand")).type_listeners().is_empty());
        }
        _ => unreachable!(),
    }
}

#[test]
fn non_primitive_cast_follows_operand_refinement() {
    // MyObj m = static_cast<MyObj>(x); with x unresolved
    let cast = VendorExpr::new(
        VendorExprKind::Cast {
            operator: CastOperator::Static,
            declared_type: "MyObj".to_string(),
            operand: Box::new(id_expr("x")),
        },
        "static_cast<MyObj>(x)",
    )
    .with_type(VendorType::named("MyObj"));

    let tu = VendorTranslationUnit {
        file: "test.cpp".to_string(),
        declarations: vec![simple_decl(
            "MyObj",
            VendorDeclarator::named("m").with_initializer(VendorInitializer::Equals(cast)),
            "MyObj m = static_cast<MyObj>(x);",
        )],
    };
    let types = TypeRegistry::new();
    let mut resolver = SimpleResolver::new();
    let mut lowered = lower_translation_unit(&tu, &types, &mut resolver, &EmptyScope);
    let g = &mut lowered.graph;

    let cast = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::CastExpression { .. }))
        .map(|n| n.id)
        .expect("cast");
    let operand = match &g.node(cast).kind {
        NodeKind::CastExpression { operand, .. } => operand.expect("operand"),
        _ => unreachable!(),
    };

    // the cast learned the declaration's type through the reverse
    // subscription, but still listens to its operand
    assert_eq!(g.node(cast).ty.name(), "MyObj");
    assert!(g.node(operand).type_listeners().contains(&cast));

    // once the operand refines, the cast follows
    g.set_type(operand, types.create_from("Derived", true));
    assert_eq!(g.node(cast).ty.name(), "Derived");
    assert_eq!(g.node(cast).ty.origin(), TypeOrigin::Dataflow);
}

#[test]
fn statement_expression_reaches_for_statement() {
    // int z = ({ for (;;) {} 5; });
    use cpg_cxx::vendor::{VendorStmt, VendorStmtKind};

    let for_stmt = VendorStmt::new(
        VendorStmtKind::For {
            initializer: None,
            condition: None,
            iteration: None,
            body: Some(Box::new(VendorStmt::new(
                VendorStmtKind::Compound { statements: vec![] },
                "{}",
            ))),
        },
        "for (;;) {}",
    );
    let compound = VendorStmt::new(
        VendorStmtKind::Compound {
            statements: vec![
                for_stmt,
                VendorStmt::new(
                    VendorStmtKind::Expression {
                        expression: int_literal("5"),
                    },
                    "5;",
                ),
            ],
        },
        "{ for (;;) {} 5; }",
    );
    let cse = VendorExpr::new(
        VendorExprKind::CompoundStatementExpr {
            statement: Box::new(compound),
        },
        "({ for (;;) {} 5; })",
    );

    let lowered = lower(vec![simple_decl(
        "int",
        VendorDeclarator::named("z").with_initializer(VendorInitializer::Equals(cse)),
        "int z = ({ for (;;) {} 5; });",
    )]);
    let g = &lowered.graph;

    assert!(g
        .iter()
        .any(|n| matches!(n.kind, NodeKind::ForStatement { .. })));
    assert!(g
        .iter()
        .any(|n| matches!(n.kind, NodeKind::CompoundStatementExpression { .. })));
}

#[test]
fn translation_unit_summary() {
    let lowered = lower(vec![simple_decl(
        "int",
        VendorDeclarator::named("x")
            .with_initializer(VendorInitializer::Equals(int_literal("1"))),
        "int x = 1;",
    )]);

    assert!(matches!(
        lowered.graph.node(lowered.root).kind,
        NodeKind::TranslationUnit { .. }
    ));
    let dict = lowered.to_dict();
    assert_eq!(dict["graph"]["dfg_edges"], 1);
}

//! Graph-level invariants checked over lowered translation units.

use rustc_hash::FxHashSet;

use cpg_cxx::frontend::{lower_translation_unit, EmptyScope, SimpleResolver};
use cpg_cxx::graph::node::{LiteralValue, NodeKind};
use cpg_cxx::graph::NodeId;
use cpg_cxx::types::TypeRegistry;
use cpg_cxx::vendor::{
    VendorDeclarator, VendorExpr, VendorExprKind, VendorInitializer, VendorTranslationUnit,
    VendorUnaryOperator,
};

use crate::common::{id_expr, init_list, int_literal, lower, simple_decl};

/// Every node reachable from the root must have a consistent parent link,
/// and every parent chain must terminate without cycling.
fn check_ast_forest(g: &cpg_cxx::Graph, root: NodeId) {
    let mut stack = vec![root];
    let mut reachable = FxHashSet::default();
    while let Some(id) = stack.pop() {
        if !reachable.insert(id) {
            continue;
        }
        for child in g.node(id).kind.ast_children() {
            assert_eq!(
                g.node(child).ast_parent,
                Some(id),
                "child {:?} of {:?} has parent {:?}",
                child,
                id,
                g.node(child).ast_parent
            );
            stack.push(child);
        }
    }

    // parent chains terminate (acyclicity)
    for node in g.iter() {
        let mut steps = 0;
        let mut current = node.ast_parent;
        while let Some(parent) = current {
            steps += 1;
            assert!(steps <= g.len(), "parent chain of {:?} cycles", node.id);
            current = g.node(parent).ast_parent;
        }
    }
}

fn complex_unit() -> Vec<cpg_cxx::vendor::VendorDecl> {
    let call = VendorExpr::new(
        VendorExprKind::FunctionCall {
            callee: Box::new(id_expr("std::max")),
            arguments: vec![id_expr("a"), int_literal("2")],
        },
        "std::max(a, 2)",
    );
    let fn_ptr_call = VendorExpr::new(
        VendorExprKind::FunctionCall {
            callee: Box::new(VendorExpr::new(
                VendorExprKind::Unary {
                    operator: VendorUnaryOperator::Star,
                    operand: Some(Box::new(id_expr("p"))),
                },
                "(*p)",
            )),
            arguments: vec![],
        },
        "(*p)()",
    );
    vec![
        simple_decl(
            "int",
            VendorDeclarator::named("a")
                .with_initializer(VendorInitializer::Equals(int_literal("0xFFul"))),
            "int a = 0xFFul;",
        ),
        simple_decl(
            "int",
            VendorDeclarator::named("arr")
                .array()
                .with_initializer(VendorInitializer::Equals(init_list(
                    vec![int_literal("1"), int_literal("2")],
                    "{1, 2}",
                ))),
            "int arr[] = {1, 2};",
        ),
        simple_decl(
            "int",
            VendorDeclarator::named("m").with_initializer(VendorInitializer::Equals(call)),
            "int m = std::max(a, 2);",
        ),
        simple_decl(
            "int",
            VendorDeclarator::named("r").with_initializer(VendorInitializer::Equals(fn_ptr_call)),
            "int r = (*p)();",
        ),
    ]
}

#[test]
fn ast_is_a_forest() {
    let lowered = lower(complex_unit());
    check_ast_forest(&lowered.graph, lowered.root);
}

#[test]
fn initializer_dfg_edge_is_exactly_one_and_removable() {
    let tu = VendorTranslationUnit {
        file: "test.cpp".to_string(),
        declarations: vec![simple_decl(
            "int",
            VendorDeclarator::named("x")
                .with_initializer(VendorInitializer::Equals(int_literal("1"))),
            "int x = 1;",
        )],
    };
    let types = TypeRegistry::new();
    let mut resolver = SimpleResolver::new();
    let mut lowered = lower_translation_unit(&tu, &types, &mut resolver, &EmptyScope);
    let g = &mut lowered.graph;

    let v = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::VariableDeclaration { .. }))
        .map(|n| n.id)
        .expect("variable declaration");
    let e = g.variable_initializer(v).expect("initializer");

    assert_eq!(g.node(v).dfg_prev, vec![e]);
    assert_eq!(g.node(e).dfg_next, vec![v]);

    g.set_initializer(v, None);
    assert!(g.node(v).dfg_prev.is_empty());
    assert!(g.node(e).dfg_next.is_empty());
    // and no listener edges remain in either direction
    assert!(g.node(e).type_listeners().is_empty());
    assert!(g.node(v).type_listeners().is_empty());
}

#[test]
fn no_stray_listeners_after_initializer_replacement() {
    let tu = VendorTranslationUnit {
        file: "test.cpp".to_string(),
        declarations: vec![simple_decl(
            "int",
            VendorDeclarator::named("x")
                .with_initializer(VendorInitializer::Equals(init_list(
                    vec![int_literal("1")],
                    "{1}",
                ))),
            "int x = {1};",
        )],
    };
    let types = TypeRegistry::new();
    let mut resolver = SimpleResolver::new();
    let mut lowered = lower_translation_unit(&tu, &types, &mut resolver, &EmptyScope);
    let g = &mut lowered.graph;

    let v = g
        .iter()
        .find(|n| matches!(n.kind, NodeKind::VariableDeclaration { .. }))
        .map(|n| n.id)
        .expect("variable declaration");
    let old = g.variable_initializer(v).expect("initializer");

    let replacement = g.new_literal(
        LiteralValue::Int(7),
        types.create_from("int", true),
        "7",
        cpg_cxx::SourceSpan::none(),
    );
    g.set_initializer(v, Some(replacement));

    assert_eq!(g.variable_initializer(v), Some(replacement));
    assert!(g.node(old).type_listeners().is_empty());
    assert!(!g.node(v).type_listeners().contains(&old));
    assert!(g.node(old).dfg_next.is_empty());
    assert_eq!(g.node(v).dfg_prev, vec![replacement]);
}

#[test]
fn literal_round_trip() {
    // the (value, typename) pair re-parses to itself when rendered with
    // the suffix implied by the typename
    let cases = [
        ("0xFFul", "255", "ul", "unsigned long"),
        ("0b101", "5", "", "int"),
        ("017", "15", "", "int"),
        ("2147483648", "2147483648", "", "long"),
        ("42ll", "42", "ll", "long long"),
    ];
    for (spelling, rendered, suffix, type_name) in cases {
        let lowered = lower(vec![simple_decl(
            "auto",
            VendorDeclarator::named("v")
                .with_initializer(VendorInitializer::Equals(int_literal(spelling))),
            "auto v = ...;",
        )]);
        let g = &lowered.graph;
        let lit = g
            .iter()
            .find(|n| matches!(n.kind, NodeKind::Literal { .. }))
            .expect("literal");
        let value = match &lit.kind {
            NodeKind::Literal { value } => value.to_string(),
            _ => unreachable!(),
        };
        assert_eq!(value, rendered, "value of {spelling}");
        assert_eq!(lit.ty.name(), type_name, "type of {spelling}");

        // re-lower the rendered form
        let again = lower(vec![simple_decl(
            "auto",
            VendorDeclarator::named("v").with_initializer(VendorInitializer::Equals(
                int_literal(&format!("{rendered}{suffix}")),
            )),
            "auto v = ...;",
        )]);
        let lit2 = again
            .graph
            .iter()
            .find(|n| matches!(n.kind, NodeKind::Literal { .. }))
            .expect("literal");
        let value2 = match &lit2.kind {
            NodeKind::Literal { value } => value.to_string(),
            _ => unreachable!(),
        };
        assert_eq!(value2, value, "round trip value of {spelling}");
        assert_eq!(lit2.ty.name(), type_name, "round trip type of {spelling}");
    }
}

#[test]
fn bracketed_primary_is_structurally_transparent() {
    // (((x + 1))) lowers to the same structure as x + 1
    let inner = VendorExpr::new(
        VendorExprKind::Binary {
            operator: cpg_cxx::vendor::VendorBinaryOperator::Plus,
            lhs: Box::new(id_expr("x")),
            rhs: Box::new(int_literal("1")),
        },
        "x + 1",
    );
    let mut wrapped = inner.clone();
    for _ in 0..3 {
        wrapped = VendorExpr::new(
            VendorExprKind::Unary {
                operator: VendorUnaryOperator::BracketedPrimary,
                operand: Some(Box::new(wrapped)),
            },
            "(...)",
        );
    }

    let lowered = lower(vec![
        simple_decl(
            "int",
            VendorDeclarator::named("a").with_initializer(VendorInitializer::Equals(wrapped)),
            "int a = (((x + 1)));",
        ),
        simple_decl(
            "int",
            VendorDeclarator::named("b").with_initializer(VendorInitializer::Equals(inner)),
            "int b = x + 1;",
        ),
    ]);
    let g = &lowered.graph;

    let ops: Vec<NodeId> = g
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::BinaryOperator { .. }))
        .map(|n| n.id)
        .collect();
    assert_eq!(ops.len(), 2);
    assert!(g.structurally_equal(ops[0], ops[1]));
    // no wrapper nodes were created for the parentheses
    assert!(!g
        .iter()
        .any(|n| matches!(&n.kind, NodeKind::UnaryOperator { .. })));
}

#[test]
fn disconnected_callee_is_not_reachable() {
    let lowered = lower(complex_unit());
    let g = &lowered.graph;

    let mut reachable = FxHashSet::default();
    let mut stack = vec![lowered.root];
    while let Some(id) = stack.pop() {
        if reachable.insert(id) {
            stack.extend(g.node(id).kind.ast_children());
        }
    }

    // the temporary callee of the free call is in the table but detached
    let stray = g
        .iter()
        .find(|n| n.name == "std::max")
        .expect("temporary callee");
    assert!(!reachable.contains(&stray.id));
    assert!(stray.ast_parent.is_none());
    assert!(stray.type_listeners().is_empty());
    assert!(stray.dfg_next.is_empty() && stray.dfg_prev.is_empty());
}

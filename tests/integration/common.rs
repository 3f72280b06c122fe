//! Shared helpers for building vendor AST fragments.

use std::sync::Once;

use cpg_cxx::frontend::{lower_translation_unit, EmptyScope, LoweredTranslationUnit, SimpleResolver};
use cpg_cxx::types::TypeRegistry;
use cpg_cxx::vendor::{
    VendorBasicKind, VendorDecl, VendorDeclKind, VendorDeclarator, VendorExpr, VendorExprKind,
    VendorNumber, VendorTranslationUnit, VendorType, VendorValue,
};

/// An integer literal as the vendor parser would report it.
pub fn int_literal(spelling: &str) -> VendorExpr {
    VendorExpr::new(
        VendorExprKind::Literal {
            value: VendorValue::Number(VendorNumber::Integer(0)),
            spelling: spelling.to_string(),
        },
        spelling,
    )
    .with_type(VendorType::basic(VendorBasicKind::Int, "int"))
}

/// An identifier expression with an unresolved (problem) type.
pub fn id_expr(name: &str) -> VendorExpr {
    VendorExpr::new(
        VendorExprKind::Id {
            name: name.to_string(),
        },
        name,
    )
}

/// A brace-enclosed initializer list.
pub fn init_list(clauses: Vec<VendorExpr>, code: &str) -> VendorExpr {
    VendorExpr::new(VendorExprKind::InitializerList { clauses }, code)
}

/// One simple declaration with a single declarator.
pub fn simple_decl(specifier: &str, declarator: VendorDeclarator, code: &str) -> VendorDecl {
    VendorDecl::new(
        VendorDeclKind::Simple {
            specifier: specifier.to_string(),
            declarators: vec![declarator],
        },
        code,
    )
}

static INIT: Once = Once::new();

/// Install a test subscriber once so `--nocapture` shows frontend logs.
fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Lower a translation unit made of the given declarations.
pub fn lower(declarations: Vec<VendorDecl>) -> LoweredTranslationUnit {
    init_logging();
    let tu = VendorTranslationUnit {
        file: "test.cpp".to_string(),
        declarations,
    };
    let types = TypeRegistry::new();
    let mut resolver = SimpleResolver::new();
    lower_translation_unit(&tu, &types, &mut resolver, &EmptyScope)
}

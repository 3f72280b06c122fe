//! C/C++ frontend core for a multi-language code property graph builder.
//!
//! Given one C++ translation unit already parsed into a vendor AST, this
//! crate lowers it into a language-neutral graph: declarations, statements,
//! expressions, and types connected by AST containment, data-flow (DFG),
//! and use-to-declaration (REFERS_TO) edges. Downstream passes (call
//! resolution, control flow, taint analysis) consume the result.
//!
//! The three load-bearing pieces:
//!
//! - **Expression lowering** ([`frontend`]): table-free dispatch over the
//!   vendor node kinds, literal normalization, call-shape inference, and
//!   initializer handling.
//! - **Type propagation** ([`graph`]): a publish/subscribe bus between
//!   typed nodes that refines placeholder types after the syntactic pass;
//!   cycle-safe and idempotent.
//! - **Initializer binding** ([`graph`]): the variable/initializer
//!   protocol wiring DFG edges and listener subscriptions, including the
//!   array-layer stripping for brace lists used as object initializers.
//!
//! Lowering never fails: problem types become the Unknown sentinel,
//! unrecognized vendor nodes become generic nodes, and everything is
//! reported through `tracing`.
//!
//! # Example
//!
//! ```
//! use cpg_cxx::frontend::{lower_translation_unit, EmptyScope, SimpleResolver};
//! use cpg_cxx::types::TypeRegistry;
//! use cpg_cxx::vendor::{
//!     VendorDecl, VendorDeclKind, VendorDeclarator, VendorExpr, VendorExprKind,
//!     VendorInitializer, VendorNumber, VendorTranslationUnit, VendorType,
//!     VendorBasicKind, VendorValue,
//! };
//!
//! let literal = VendorExpr::new(
//!     VendorExprKind::Literal {
//!         value: VendorValue::Number(VendorNumber::Integer(255)),
//!         spelling: "0xFF".to_string(),
//!     },
//!     "0xFF",
//! )
//! .with_type(VendorType::basic(VendorBasicKind::Int, "int"));
//!
//! let tu = VendorTranslationUnit {
//!     file: "main.cpp".to_string(),
//!     declarations: vec![VendorDecl::new(
//!         VendorDeclKind::Simple {
//!             specifier: "int".to_string(),
//!             declarators: vec![
//!                 VendorDeclarator::named("x")
//!                     .with_initializer(VendorInitializer::Equals(literal)),
//!             ],
//!         },
//!         "int x = 0xFF;",
//!     )],
//! };
//!
//! let types = TypeRegistry::new();
//! let mut resolver = SimpleResolver::new();
//! let lowered = lower_translation_unit(&tu, &types, &mut resolver, &EmptyScope);
//! assert_eq!(lowered.graph.len(), 3); // literal, declaration, root
//! ```

pub mod error;
pub mod frontend;
pub mod graph;
pub mod types;
pub mod vendor;

pub use error::{CpgError, Result};
pub use frontend::{
    lower_translation_unit, BindingResolver, EmptyScope, LoweredTranslationUnit, Lowering,
    NullResolver, ScopeManager, SimpleResolver,
};
pub use graph::location::{Pos, SourceSpan};
pub use graph::node::{CastOperator, LiteralValue, Node, NodeKind};
pub use graph::{Graph, NodeId};
pub use types::{
    PointerOrigin, Qualifiers, Type, TypeLayer, TypeOrigin, TypeRegistry, UNKNOWN_TYPE_NAME,
};

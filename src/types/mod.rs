//! Type representation and canonicalization.
//!
//! Types are value objects: a base name, a qualifier set, and a stack of
//! pointer/reference layers. Two canonicalizations of the same spelling
//! compare equal, so node types can be matched structurally anywhere in the
//! graph. The [`TypeRegistry`] caches canonicalization results and holds the
//! alias table; it is read-mostly and safe to share across threads, but the
//! lowering itself is single-threaded.

use std::fmt;
use std::hash::{Hash, Hasher};

use parking_lot::RwLock;
use phf::phf_set;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Spelling of the unknown-type sentinel.
pub const UNKNOWN_TYPE_NAME: &str = "UNKNOWN";

/// C/C++ primitive type spellings.
///
/// Pointer or reference layers disqualify a type from being primitive, so
/// only the bare spellings appear here.
static PRIMITIVE_TYPES: phf::Set<&'static str> = phf_set! {
    "bool", "char", "signed char", "unsigned char",
    "wchar_t", "char16_t", "char32_t",
    "short", "short int", "unsigned short", "unsigned short int",
    "int", "signed", "signed int", "unsigned", "unsigned int",
    "long", "long int", "unsigned long", "unsigned long int",
    "long long", "long long int", "unsigned long long",
    "unsigned long long int",
    "float", "double", "long double", "void",
};

/// Provenance of a type on a typed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeOrigin {
    /// Spelled out in the source at the declaration site.
    Declared,
    /// Learned through type propagation along a DFG edge.
    Dataflow,
    /// Heuristic guess.
    Guessed,
    /// Not yet inferred.
    Unresolved,
}

impl TypeOrigin {
    /// Precedence used when an equal type arrives with a different origin.
    pub(crate) fn rank(self) -> u8 {
        match self {
            TypeOrigin::Declared => 3,
            TypeOrigin::Dataflow => 2,
            TypeOrigin::Guessed => 1,
            TypeOrigin::Unresolved => 0,
        }
    }
}

/// What introduced a pointer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerOrigin {
    /// An explicit `*` in the spelling or a pointer-producing operation.
    Pointer,
    /// Array declarators and brace-list initializers.
    Array,
}

/// One indirection layer of a type, outermost last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeLayer {
    Pointer(PointerOrigin),
    Reference,
}

/// Qualifier set of a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
}

impl Qualifiers {
    fn absorb(&mut self, token: &str) -> bool {
        match token {
            "const" => {
                self.is_const = true;
                true
            }
            "volatile" => {
                self.is_volatile = true;
                true
            }
            "restrict" | "__restrict" | "__restrict__" => {
                self.is_restrict = true;
                true
            }
            _ => false,
        }
    }
}

/// A canonical type: base name, qualifiers, indirection layers, origin.
///
/// Equality and hashing cover the structural fields only; the origin tag is
/// provenance metadata and never participates in comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Type {
    name: String,
    qualifiers: Qualifiers,
    layers: Vec<TypeLayer>,
    origin: TypeOrigin,
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.qualifiers == other.qualifiers
            && self.layers == other.layers
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.qualifiers.hash(state);
        self.layers.hash(state);
    }
}

impl Type {
    /// The unknown-type sentinel.
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_TYPE_NAME.to_string(),
            qualifiers: Qualifiers::default(),
            layers: Vec::new(),
            origin: TypeOrigin::Unresolved,
        }
    }

    /// Base name without qualifiers or layers.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualifiers(&self) -> Qualifiers {
        self.qualifiers
    }

    pub fn layers(&self) -> &[TypeLayer] {
        &self.layers
    }

    pub fn origin(&self) -> TypeOrigin {
        self.origin
    }

    pub fn set_origin(&mut self, origin: TypeOrigin) {
        self.origin = origin;
    }

    pub fn with_origin(mut self, origin: TypeOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Is this the unknown sentinel?
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_TYPE_NAME && self.layers.is_empty()
    }

    /// Push a pointer layer tagged with its origin.
    pub fn pointer_of(&self, origin: PointerOrigin) -> Self {
        let mut t = self.clone();
        t.layers.push(TypeLayer::Pointer(origin));
        t
    }

    /// Undo the outermost pointer layer. A type without one is returned
    /// unchanged; reference layers do not pop.
    pub fn dereference(&self) -> Self {
        let mut t = self.clone();
        if matches!(t.layers.last(), Some(TypeLayer::Pointer(_))) {
            t.layers.pop();
        }
        t
    }

    /// Does the outermost layer come from a pointer or array?
    pub fn is_pointer(&self) -> bool {
        matches!(self.layers.last(), Some(TypeLayer::Pointer(_)))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifiers.is_const {
            write!(f, "const ")?;
        }
        if self.qualifiers.is_volatile {
            write!(f, "volatile ")?;
        }
        write!(f, "{}", self.name)?;
        for layer in &self.layers {
            match layer {
                TypeLayer::Pointer(PointerOrigin::Pointer) => write!(f, "*")?,
                TypeLayer::Pointer(PointerOrigin::Array) => write!(f, "[]")?,
                TypeLayer::Reference => write!(f, "&")?,
            }
        }
        Ok(())
    }
}

/// Canonicalizes textual type spellings into [`Type`] values.
///
/// Results are cached per `(spelling, resolve_alias)` pair so repeated
/// canonicalizations of the same spelling are cheap and yield equal values.
/// Unknown or empty spellings produce the unknown sentinel; canonicalization
/// never fails.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    cache: RwLock<FxHashMap<(String, bool), Type>>,
    aliases: RwLock<FxHashMap<String, String>>,
}

/// Longest alias chain followed before giving up. Guards against typedef
/// cycles in hostile input.
const MAX_ALIAS_DEPTH: usize = 8;

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typedef-style alias from `alias` to `target`.
    pub fn register_alias(&self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.write().insert(alias.into(), target.into());
    }

    /// Canonicalize `spelling` into a type, optionally resolving aliases of
    /// the base name.
    pub fn create_from(&self, spelling: &str, resolve_alias: bool) -> Type {
        let key = (spelling.trim().to_string(), resolve_alias);
        {
            let cache = self.cache.read();
            if let Some(ty) = cache.get(&key) {
                return ty.clone();
            }
        }

        let ty = self.parse(&key.0, resolve_alias);

        let mut cache = self.cache.write();
        cache.entry(key).or_insert_with(|| ty.clone());
        ty
    }

    /// Is `ty` one of the C/C++ primitive types? Pointer, array, and
    /// reference layers disqualify.
    pub fn is_primitive(&self, ty: &Type) -> bool {
        ty.layers().is_empty() && PRIMITIVE_TYPES.contains(ty.name())
    }

    /// Is `ty` the unknown sentinel?
    pub fn is_unknown(&self, ty: &Type) -> bool {
        ty.is_unknown()
    }

    fn parse(&self, spelling: &str, resolve_alias: bool) -> Type {
        let mut rest = spelling.trim();
        if rest.is_empty() {
            return Type::unknown();
        }

        // Peel indirection suffixes from the outside in; layers end up
        // innermost-first because each peel removes the outermost one.
        let mut reversed_layers = Vec::new();
        loop {
            rest = rest.trim_end();
            if let Some(prefix) = rest.strip_suffix('*') {
                reversed_layers.push(TypeLayer::Pointer(PointerOrigin::Pointer));
                rest = prefix;
            } else if let Some(prefix) = rest.strip_suffix('&') {
                reversed_layers.push(TypeLayer::Reference);
                rest = prefix;
            } else if let Some(prefix) = rest.strip_suffix("[]") {
                reversed_layers.push(TypeLayer::Pointer(PointerOrigin::Array));
                rest = prefix;
            } else {
                break;
            }
        }
        reversed_layers.reverse();
        let layers = reversed_layers;

        let mut qualifiers = Qualifiers::default();
        let mut name_parts = Vec::new();
        for token in rest.split_whitespace() {
            if !qualifiers.absorb(token) {
                name_parts.push(token);
            }
        }

        if name_parts.is_empty() {
            return Type::unknown();
        }
        let mut name = name_parts.join(" ");

        // `auto` is a deduction placeholder, not a type
        if name == "auto" {
            return Type::unknown();
        }

        if resolve_alias {
            let aliases = self.aliases.read();
            for _ in 0..MAX_ALIAS_DEPTH {
                match aliases.get(&name) {
                    Some(target) => name = target.clone(),
                    None => break,
                }
            }
        }

        Type {
            name,
            qualifiers,
            layers,
            origin: TypeOrigin::Declared,
        }
    }
}

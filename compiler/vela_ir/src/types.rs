//! Type pool for the Vela address IR.
//!
//! Types are interned into a [`TypePool`] and referenced by [`TypeId`].
//! The pool is deliberately small: the optimizer only asks structural
//! questions (is this type trivial? does it contain an enum? is it an
//! optional-like enum?), so the kind set covers exactly the shapes those
//! questions distinguish.
//!
//! A handful of types every function mentions are pre-interned at fixed
//! indices ([`TypeId::INT`], [`TypeId::OBJECT`], [`TypeId::TOKEN`]) so
//! tests and builders can name them without holding a pool reference.

// ── TypeId ──────────────────────────────────────────────────────────

/// Index of a type in a [`TypePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// Trivial machine integer. No ownership semantics.
    pub const INT: TypeId = TypeId(0);
    /// Reference-counted class-like value. Owning it implies a destroy
    /// obligation.
    pub const OBJECT: TypeId = TypeId(1);
    /// Coroutine token produced by `begin_apply`. Trivial.
    pub const TOKEN: TypeId = TypeId(2);

    /// Create a type ID from a raw pool index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into the pool).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Type kinds ──────────────────────────────────────────────────────

/// Structural kind of an interned type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Trivial scalar (machine integer).
    Int,
    /// Reference-counted heap object.
    Object,
    /// Coroutine token. Trivial; only produced by `begin_apply`.
    Token,
    /// Fixed-layout struct with the given field types.
    Struct(Vec<TypeId>),
    /// Tuple with the given element types.
    Tuple(Vec<TypeId>),
    /// General enum: one payload type list per variant.
    ///
    /// Taking the payload address of a general enum invalidates the
    /// stored value, so the optimizer treats such projections as writes.
    Enum(Vec<Vec<TypeId>>),
    /// Optional-like enum: a none case plus a single payload.
    ///
    /// The payload address can be taken nondestructively, which is why
    /// the pool distinguishes it from [`Enum`](TypeKind::Enum).
    Optional(TypeId),
    /// Opaque existential. Always nontrivial.
    Existential,
}

// ── TypePool ────────────────────────────────────────────────────────

/// Interning pool for [`TypeKind`]s.
///
/// Interning is by structural equality, so a [`TypeId`] comparison is a
/// type equality check. Pools are per-module and small; lookup is a
/// linear scan.
#[derive(Clone, Debug)]
pub struct TypePool {
    kinds: Vec<TypeKind>,
}

impl TypePool {
    /// Create a pool with the reserved types pre-interned.
    pub fn new() -> Self {
        Self {
            kinds: vec![TypeKind::Int, TypeKind::Object, TypeKind::Token],
        }
    }

    /// Intern a type kind, reusing an existing entry when one matches.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(pos) = self.kinds.iter().position(|k| *k == kind) {
            let raw = u32::try_from(pos)
                .unwrap_or_else(|_| panic!("type pool exceeds u32::MAX entries"));
            return TypeId::new(raw);
        }
        let id = u32::try_from(self.kinds.len())
            .unwrap_or_else(|_| panic!("type pool exceeds u32::MAX entries"));
        self.kinds.push(kind);
        TypeId::new(id)
    }

    /// Intern a struct type with the given field types.
    pub fn struct_type(&mut self, fields: Vec<TypeId>) -> TypeId {
        self.intern(TypeKind::Struct(fields))
    }

    /// Intern a tuple type with the given element types.
    pub fn tuple_type(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.intern(TypeKind::Tuple(elems))
    }

    /// Intern a general enum type. `variants[i]` lists variant i's payloads.
    pub fn enum_type(&mut self, variants: Vec<Vec<TypeId>>) -> TypeId {
        self.intern(TypeKind::Enum(variants))
    }

    /// Intern an optional-like enum wrapping `payload`.
    pub fn optional_type(&mut self, payload: TypeId) -> TypeId {
        self.intern(TypeKind::Optional(payload))
    }

    /// Intern the opaque existential type.
    pub fn existential_type(&mut self) -> TypeId {
        self.intern(TypeKind::Existential)
    }

    /// Look up the kind of a type.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not an index into this pool.
    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        self.kinds
            .get(ty.index())
            .unwrap_or_else(|| panic!("TypeId {} out of bounds (have {})", ty.raw(), self.kinds.len()))
    }

    /// Returns `true` if values of this type have no ownership semantics:
    /// no destroy is needed and copies are bitwise.
    pub fn is_trivial(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Int | TypeKind::Token => true,
            TypeKind::Object | TypeKind::Existential => false,
            TypeKind::Struct(fields) | TypeKind::Tuple(fields) => {
                fields.iter().all(|&f| self.is_trivial(f))
            }
            TypeKind::Enum(variants) => variants
                .iter()
                .all(|payloads| payloads.iter().all(|&p| self.is_trivial(p))),
            TypeKind::Optional(payload) => self.is_trivial(*payload),
        }
    }

    /// Returns `true` if this type is an enum or transitively contains one.
    ///
    /// Enum-typed values converted from address form to value form can
    /// have lifetime gaps on paths where the payload case never occurs;
    /// the pass driver queues such values for lifetime completion.
    pub fn is_or_has_enum(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Enum(_) | TypeKind::Optional(_) => true,
            TypeKind::Struct(fields) | TypeKind::Tuple(fields) => {
                fields.iter().any(|&f| self.is_or_has_enum(f))
            }
            TypeKind::Int | TypeKind::Object | TypeKind::Token | TypeKind::Existential => false,
        }
    }

    /// The payload type if `ty` is an optional-like enum, else `None`.
    ///
    /// This is the query behind the nondestructive enum-projection rule:
    /// only optional-like enums may have their payload address taken
    /// without invalidating the stored value.
    pub fn optional_payload(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Optional(payload) => Some(*payload),
            _ => None,
        }
    }

    /// Field type of a struct.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a struct or `field` is out of range.
    pub fn struct_field(&self, ty: TypeId, field: u32) -> TypeId {
        match self.kind(ty) {
            TypeKind::Struct(fields) => *fields
                .get(field as usize)
                .unwrap_or_else(|| panic!("struct field {field} out of range")),
            other => panic!("struct_field on non-struct type {other:?}"),
        }
    }

    /// Element type of a tuple.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a tuple or `index` is out of range.
    pub fn tuple_elem(&self, ty: TypeId, index: u32) -> TypeId {
        match self.kind(ty) {
            TypeKind::Tuple(elems) => *elems
                .get(index as usize)
                .unwrap_or_else(|| panic!("tuple element {index} out of range")),
            other => panic!("tuple_elem on non-tuple type {other:?}"),
        }
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

//! Address-based intermediate representation for the Vela compiler.
//!
//! This crate provides:
//!
//! - **The instruction set** ([`InstKind`]) — a closed tagged union of
//!   address and ownership operations: stack allocation, address copies,
//!   loads/stores with ownership qualifiers, access scopes, call-like
//!   instructions with argument conventions, and address projections.
//!
//! - **Functions and arenas** ([`Function`], [`Block`]) — instructions
//!   and values live in index arenas ([`InstId`], [`ValueId`]) owned by
//!   their function; blocks order instructions; erasure tombstones arena
//!   slots so IDs stay stable while optimizations mutate the body.
//!
//! - **Types** ([`TypePool`], [`TypeKind`]) — a small structural pool
//!   answering the ownership questions the optimizer asks (triviality,
//!   enum containment, optional-like payload extraction).
//!
//! # Design
//!
//! The IR models values under a **linear-ownership discipline**: an
//! owned value is destroyed exactly once on every path, borrows are
//! scoped read-only references, and address-typed storage is initialized
//! exactly once before any read. Functions carry a
//! [`linear_ownership`](Function::linear_ownership) flag; outside that
//! mode optimizations must pattern-match recognized destroy operations
//! instead of trusting use-lists to be exhaustive.
//!
//! Operands are the only mutable edges in the def-use graph: rewriting
//! means redirecting an instruction's operand slots to another value
//! ([`Function::substitute_in`]), never mutating values themselves.

pub mod function;
pub mod inst;
pub mod name;
pub mod types;

pub use function::{Block, BlockId, Function, InstId, Param, ValueDef, ValueId};
pub use inst::{
    AccessKind, ExistentialAccess, InstKind, LoadQualifier, ParamConvention, StoreQualifier,
};
pub use name::Name;
pub use types::{TypeId, TypeKind, TypePool};

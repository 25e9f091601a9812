//! Alias oracle for the optimizer.
//!
//! [`AliasOracle`] is the query contract every memory-safety check in
//! this crate is written against. Both queries are conservative by
//! contract: `may_write_to_memory` answers `true` when uncertain, and
//! `is_no_alias` answers `false` when uncertain. A less precise oracle
//! can only suppress optimizations, never enable an unsound one.
//!
//! [`AccessPathAliasing`] is the in-tree implementation, built on
//! [`access_path`](crate::access_path) resolution: distinct local
//! allocations never alias, locals never alias parameter storage, and
//! exact same-base paths that diverge on a selector are disjoint. Calls
//! may write an address only through a may-aliasing argument passed
//! under a non-guaranteed convention.

use vela_ir::{Function, InstId, InstKind, LoadQualifier, ParamConvention};
use vela_ir::{AccessKind, ValueId};

use crate::access_path::{bases_identical, resolve_access_path};

/// Conservative aliasing and memory-effect queries.
pub trait AliasOracle {
    /// May executing `inst` write to the memory at `addr`?
    /// `true` when uncertain.
    fn may_write_to_memory(&self, func: &Function, inst: InstId, addr: ValueId) -> bool;

    /// Do `a` and `b` provably address disjoint memory?
    /// `false` when uncertain.
    fn is_no_alias(&self, func: &Function, a: ValueId, b: ValueId) -> bool;
}

/// Access-path-based implementation of [`AliasOracle`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessPathAliasing;

impl AccessPathAliasing {
    fn may_alias(&self, func: &Function, a: ValueId, b: ValueId) -> bool {
        !self.is_no_alias(func, a, b)
    }

    /// A call may write `addr` only through an argument it can write:
    /// one passed under a non-guaranteed convention that may alias
    /// `addr`. Guaranteed arguments are read-only for the call's
    /// duration.
    fn call_may_write(
        &self,
        func: &Function,
        args: &[ValueId],
        conventions: &[ParamConvention],
        addr: ValueId,
    ) -> bool {
        args.iter()
            .zip(conventions)
            .any(|(arg, conv)| !conv.is_guaranteed() && self.may_alias(func, *arg, addr))
    }
}

impl AliasOracle for AccessPathAliasing {
    fn may_write_to_memory(&self, func: &Function, inst: InstId, addr: ValueId) -> bool {
        match func.kind(inst) {
            InstKind::Store { dest, .. } => self.may_alias(func, *dest, addr),

            // A taking copy deinitializes its source, which counts as a
            // write to it.
            InstKind::CopyAddr {
                src,
                dest,
                take_src,
                ..
            } => {
                self.may_alias(func, *dest, addr)
                    || (*take_src && self.may_alias(func, *src, addr))
            }

            InstKind::Load { addr: a, qualifier } => {
                *qualifier == LoadQualifier::Take && self.may_alias(func, *a, addr)
            }

            InstKind::DestroyAddr { addr: a } | InstKind::DeallocStack { addr: a } => {
                self.may_alias(func, *a, addr)
            }

            // The scope itself writes nothing, but a Modify scope
            // asserts the right to; without looking inside, stay
            // conservative.
            InstKind::BeginAccess { addr: a, kind }
            | InstKind::BeginUnpairedAccess { addr: a, kind } => {
                *kind == AccessKind::Modify && self.may_alias(func, *a, addr)
            }

            // Payload projection of a non-optional enum invalidates the
            // stored value. The oracle cannot see types, so any aliasing
            // projection counts as a write.
            InstKind::UncheckedTakeEnumDataAddr { addr: a, .. } => self.may_alias(func, *a, addr),

            InstKind::Apply {
                args, conventions, ..
            }
            | InstKind::BeginApply {
                args, conventions, ..
            }
            | InstKind::PartialApply {
                args, conventions, ..
            }
            | InstKind::TryApply {
                args, conventions, ..
            } => self.call_may_write(func, args, conventions, addr),

            InstKind::Yield {
                values,
                conventions,
                ..
            } => self.call_may_write(func, values, conventions, addr),

            InstKind::AllocStack { .. }
            | InstKind::LoadBorrow { .. }
            | InstKind::EndBorrow { .. }
            | InstKind::EndAccess { .. }
            | InstKind::DestroyValue { .. }
            | InstKind::CopyValue { .. }
            | InstKind::FixLifetime { .. }
            | InstKind::MarkDependence { .. }
            | InstKind::StructElementAddr { .. }
            | InstKind::TupleElementAddr { .. }
            | InstKind::UncheckedAddrCast { .. }
            | InstKind::OpenExistentialAddr { .. }
            | InstKind::EndApply { .. }
            | InstKind::AbortApply { .. }
            | InstKind::Return { .. }
            | InstKind::Br { .. }
            | InstKind::CondBr { .. }
            | InstKind::Unreachable => false,
        }
    }

    fn is_no_alias(&self, func: &Function, a: ValueId, b: ValueId) -> bool {
        if a == b {
            return false;
        }
        let pa = resolve_access_path(func, a);
        let pb = resolve_access_path(func, b);
        match bases_identical(pa.base, pb.base) {
            Some(false) => true,
            Some(true) => pa.definitely_disjoint(&pb),
            None => false,
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

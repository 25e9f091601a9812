//! Access-path resolution for address values.
//!
//! Walks an address back through access scopes, projections, casts and
//! dependence markers to the storage it ultimately points into: a local
//! stack allocation, a function parameter, or unknown. The projection
//! steps taken along the way are recorded so two addresses rooted in the
//! same storage can be compared for disjointness.
//!
//! Casts and existential openings lose structure; a path through one is
//! marked inexact and never participates in disjointness claims.

use smallvec::SmallVec;
use vela_ir::{Function, InstId, InstKind, ParamConvention, ValueDef, ValueId};

/// The storage an address resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessBase {
    /// A local `alloc_stack` (identified by its allocation instruction).
    Stack(InstId),
    /// A function parameter (by index).
    Argument(u32),
    /// Resolution gave up (block parameter, unrecognized producer).
    Unknown,
}

/// One projection step from a base toward the resolved address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionStep {
    /// `struct_element_addr` with this field index.
    StructField(u32),
    /// `tuple_element_addr` with this element index.
    TupleIndex(u32),
    /// `unchecked_take_enum_data_addr` of this variant.
    EnumPayload(u32),
}

/// A resolved access path: base storage plus the projection steps from
/// the base to the address, outermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPath {
    pub base: AccessBase,
    pub projection: SmallVec<[ProjectionStep; 4]>,
    /// `false` if the walk passed through an address cast or an opened
    /// existential; such paths cannot prove disjointness.
    pub exact: bool,
}

impl AccessPath {
    /// Whether this path and `other` provably address disjoint memory.
    ///
    /// Requires the same known base and exact paths on both sides; two
    /// paths are disjoint when they diverge on a different selector at
    /// the same depth.
    pub fn definitely_disjoint(&self, other: &AccessPath) -> bool {
        if !self.exact || !other.exact {
            return false;
        }
        self.projection
            .iter()
            .zip(&other.projection)
            .any(|(a, b)| a != b)
    }
}

/// Resolve an address to its access path.
pub fn resolve_access_path(func: &Function, addr: ValueId) -> AccessPath {
    let mut projection: SmallVec<[ProjectionStep; 4]> = SmallVec::new();
    let mut exact = true;
    let mut current = addr;

    loop {
        let inst = match func.def_of(current) {
            ValueDef::Param(index) => {
                projection.reverse();
                return AccessPath {
                    base: AccessBase::Argument(index),
                    projection,
                    exact,
                };
            }
            ValueDef::BlockParam { .. } => {
                projection.reverse();
                return AccessPath {
                    base: AccessBase::Unknown,
                    projection,
                    exact,
                };
            }
            ValueDef::Result(inst) => inst,
        };

        match func.kind(inst) {
            InstKind::AllocStack { .. } => {
                projection.reverse();
                return AccessPath {
                    base: AccessBase::Stack(inst),
                    projection,
                    exact,
                };
            }
            InstKind::BeginAccess { addr, .. } => current = *addr,
            InstKind::MarkDependence { value, .. } => current = *value,
            InstKind::StructElementAddr { base, field, .. } => {
                projection.push(ProjectionStep::StructField(*field));
                current = *base;
            }
            InstKind::TupleElementAddr { base, index, .. } => {
                projection.push(ProjectionStep::TupleIndex(*index));
                current = *base;
            }
            InstKind::UncheckedTakeEnumDataAddr { addr, variant, .. } => {
                projection.push(ProjectionStep::EnumPayload(*variant));
                current = *addr;
            }
            InstKind::UncheckedAddrCast { addr, .. } => {
                exact = false;
                current = *addr;
            }
            InstKind::OpenExistentialAddr { addr, .. } => {
                exact = false;
                current = *addr;
            }
            _ => {
                projection.reverse();
                return AccessPath {
                    base: AccessBase::Unknown,
                    projection,
                    exact,
                };
            }
        }
    }
}

/// The base storage of an address, without the projection path.
pub fn access_base(func: &Function, addr: ValueId) -> AccessBase {
    resolve_access_path(func, addr).base
}

/// The ownership convention of a parameter base, or `None` when the
/// base is not a function parameter.
pub fn base_argument_convention(func: &Function, base: AccessBase) -> Option<ParamConvention> {
    match base {
        AccessBase::Argument(index) => func.params().get(index as usize).map(|p| p.convention),
        AccessBase::Stack(_) | AccessBase::Unknown => None,
    }
}

/// Whether two bases are known-same (`Some(true)`), known-distinct
/// (`Some(false)`), or undecidable (`None`).
///
/// Distinct local allocations never overlap, and a local allocation
/// never overlaps caller-owned parameter storage. Two distinct
/// parameters may still alias the same caller storage, so that case is
/// undecidable.
pub fn bases_identical(a: AccessBase, b: AccessBase) -> Option<bool> {
    match (a, b) {
        (AccessBase::Stack(x), AccessBase::Stack(y)) => Some(x == y),
        (AccessBase::Argument(x), AccessBase::Argument(y)) => {
            if x == y {
                Some(true)
            } else {
                None
            }
        }
        (AccessBase::Stack(_), AccessBase::Argument(_))
        | (AccessBase::Argument(_), AccessBase::Stack(_)) => Some(false),
        (AccessBase::Unknown, _) | (_, AccessBase::Unknown) => None,
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

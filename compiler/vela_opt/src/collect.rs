//! Use collection for candidate temporaries.
//!
//! [`collect_reads`] transitively explores the data-flow uses of a
//! temporary's address and classifies each one: a **terminal,
//! non-destructive read** is recorded, anything else disqualifies the
//! whole elimination attempt. Every kind accepted here must be handled
//! by the copy-rewriter's commit phase; the two match arms are kept in
//! sync by construction (an unrecognized kind disqualifies rather than
//! falling through).
//!
//! The walk assumes the temporary's lifetime has no holes: it is
//! initialized once by the candidate copy and never written again, so
//! any operation that may write through the explored address
//! disqualifies.

use rustc_hash::FxHashSet;
use vela_ir::{
    AccessKind, BlockId, ExistentialAccess, Function, InstId, InstKind, LoadQualifier, TypePool,
    ValueId,
};

/// Classify one use of the temporary (through `used_addr`) as a
/// recordable read or a disqualifier.
///
/// * `root` — the whole temporary (the initializing copy's
///   destination); consuming operations are only allowed against it,
///   never against a projection.
/// * `block` — the initializer's block. Reads must not leave it; the
///   recorded read positions bound the temporary's useful lifetime, and
///   the modification checker only scans this one block.
///
/// Returns `false` to disqualify; recorded reads accumulate in `reads`.
pub(crate) fn collect_reads(
    func: &Function,
    pool: &TypePool,
    user: InstId,
    used_addr: ValueId,
    root: ValueId,
    block: BlockId,
    reads: &mut FxHashSet<InstId>,
) -> bool {
    // All normal uses must be in the initialization block. (Destroys
    // and deallocations may be elsewhere; the caller filters those.)
    if func.block_of(user) != block {
        return false;
    }

    match func.kind(user) {
        InstKind::BeginAccess { kind, .. } => {
            if *kind != AccessKind::Read {
                return false;
            }
            // A read scope guarantees there are no writes through the
            // scope's address, so the scope body needs no recursion.
            // The end-accesses mark where the use actually ends, so
            // they are recorded as reads.
            let Some(scope) = func.result(user) else {
                return false;
            };
            for end in func.uses_of(scope) {
                if matches!(func.kind(end), InstKind::EndAccess { .. }) {
                    if func.block_of(end) != block {
                        return false;
                    }
                    reads.insert(end);
                }
            }
            true
        }

        InstKind::MarkDependence { value, base } => {
            // As the base operand the chain ends here; as the value
            // operand the dependence marker forwards the address and
            // its uses must be explored.
            if *base == used_addr && *value != used_addr {
                return true;
            }
            collect_reads_from_projection(func, pool, user, root, block, reads)
        }

        InstKind::PartialApply { on_stack, .. } => {
            if !on_stack {
                return false;
            }
            collect_call_argument(func, user, used_addr, block, reads)
        }
        InstKind::Apply { .. } | InstKind::TryApply { .. } | InstKind::BeginApply { .. } => {
            collect_call_argument(func, user, used_addr, block, reads)
        }

        InstKind::Yield { .. } => {
            match func.kind(user).argument_convention(used_addr) {
                Some(conv) if conv.is_guaranteed() => {
                    reads.insert(user);
                    true
                }
                _ => false,
            }
        }

        InstKind::OpenExistentialAddr { access, .. } => {
            if *access != ExistentialAccess::Immutable {
                return false;
            }
            collect_reads_from_projection(func, pool, user, root, block, reads)
        }

        InstKind::UncheckedTakeEnumDataAddr { addr, .. } => {
            // Payload projection invalidates the stored enum value in
            // general; only optional-like enums extract nondestructively.
            if pool.optional_payload(func.value_type(*addr)).is_none() {
                return false;
            }
            collect_reads_from_projection(func, pool, user, root, block, reads)
        }

        InstKind::StructElementAddr { .. }
        | InstKind::TupleElementAddr { .. }
        | InstKind::UncheckedAddrCast { .. } => {
            collect_reads_from_projection(func, pool, user, root, block, reads)
        }

        InstKind::Load { qualifier, .. } => {
            // A take through a projection would destroy only part of
            // the temporary; that cannot be redirected.
            if *qualifier == LoadQualifier::Take && used_addr != root {
                return false;
            }
            reads.insert(user);
            true
        }

        InstKind::LoadBorrow { .. } => {
            reads.insert(user);
            let Some(borrow) = func.result(user) else {
                return false;
            };
            // Scope-ending uses of the borrow bound the temporary's
            // lifetime. A reborrow (the borrow escaping into a branch)
            // ends the scope in another block, so it disqualifies.
            for borrow_use in func.uses_of(borrow) {
                match func.kind(borrow_use) {
                    InstKind::EndBorrow { .. } => {
                        if func.block_of(borrow_use) != block {
                            return false;
                        }
                        reads.insert(borrow_use);
                    }
                    kind if kind.is_terminator() => return false,
                    _ => {}
                }
            }
            true
        }

        InstKind::FixLifetime { .. } => {
            // Liveness assertion with no memory effect; re-targeted to
            // the source during the rewrite.
            reads.insert(user);
            true
        }

        InstKind::CopyAddr {
            src: _,
            dest,
            take_src,
            ..
        } => {
            // A copy writing into the temporary would reinitialize it.
            if *dest == used_addr {
                return false;
            }
            // As with loads, only a take of the whole temporary is
            // redirectable.
            if *take_src && used_addr != root {
                return false;
            }
            reads.insert(user);
            true
        }

        // Anything else has unknown write/consume potential.
        _ => false,
    }
}

/// Record a call-like use: permitted only under a guaranteed argument
/// convention. For `begin_apply`, the token's uses close the call's
/// access window and are recorded as reads too.
fn collect_call_argument(
    func: &Function,
    user: InstId,
    used_addr: ValueId,
    block: BlockId,
    reads: &mut FxHashSet<InstId>,
) -> bool {
    match func.kind(user).argument_convention(used_addr) {
        Some(conv) if conv.is_guaranteed() => {}
        _ => return false,
    }
    reads.insert(user);

    if matches!(func.kind(user), InstKind::BeginApply { .. }) {
        let Some(token) = func.result(user) else {
            return false;
        };
        for token_use in func.uses_of(token) {
            if func.block_of(token_use) != block {
                return false;
            }
            reads.insert(token_use);
        }
    }
    true
}

/// Transitively explore the uses of an address projection.
fn collect_reads_from_projection(
    func: &Function,
    pool: &TypePool,
    projection: InstId,
    root: ValueId,
    block: BlockId,
    reads: &mut FxHashSet<InstId>,
) -> bool {
    let Some(result) = func.result(projection) else {
        return false;
    };
    for use_inst in func.uses_of(result) {
        if !collect_reads(func, pool, use_inst, result, root, block, reads) {
            return false;
        }
    }
    true
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

//! Copy elimination: the temporary-rvalue rewrite.
//!
//! Handles the pattern a front end emits when materializing a value
//! into a short-lived stack slot:
//!
//! ```text
//!   %temp = alloc_stack $T
//!   copy_addr %src to [init] %temp
//!   // no writes to %src or %temp
//!   destroy_addr %temp
//!   dealloc_stack %temp
//! ```
//!
//! When the source is provably unmodified for the temporary's useful
//! lifetime, every read of `%temp` can be redirected to `%src` and the
//! slot removed. Source and destination lifetimes overlap here by
//! construction, so this is not copy forwarding — the proof is that the
//! destination is a short-lived rvalue.

use rustc_hash::FxHashSet;
use vela_ir::{Function, InstId, InstKind, LoadQualifier, TypePool, ValueId};

use crate::access_path::{access_base, base_argument_convention};
use crate::alias::AliasOracle;
use crate::collect::collect_reads;
use crate::destroy::is_destroyed_directly;
use crate::modify::last_use_while_source_unmodified;
use crate::scopes::extend_access_scopes;

/// Try to eliminate the temporary initialized by `copy`.
///
/// On success the temporary's uses are redirected to the copy source,
/// its destroys and deallocation are erased, and `copy` is left as an
/// identity copy (`src → src`) for the driver to erase — erasing it
/// here would invalidate the driver's iteration. On any disqualifying
/// rule the IR is left untouched.
pub(crate) fn try_eliminate_copy(
    func: &mut Function,
    pool: &TypePool,
    copy: InstId,
    oracle: &dyn AliasOracle,
) {
    let (src, temp, take_src, init_dest) = match func.kind(copy) {
        InstKind::CopyAddr {
            src,
            dest,
            take_src,
            init_dest,
        } => (*src, *dest, *take_src, *init_dest),
        _ => return,
    };
    if !init_dest {
        return;
    }

    let Some(temp_alloc) = func.defining_inst(temp) else {
        return;
    };
    let (lexical, _) = match func.kind(temp_alloc) {
        InstKind::AllocStack {
            lexical,
            dynamic_lifetime,
            ..
        } => (*lexical, *dynamic_lifetime),
        _ => return,
    };

    // A lexical temporary's lifetime is tied to a source-visible scope.
    // It may only be shortened onto a source that is known to outlive
    // it: a guaranteed parameter.
    if lexical {
        let base = access_base(func, src);
        match base_argument_convention(func, base) {
            Some(conv) if conv.is_guaranteed() => {}
            _ => return,
        }
    }

    let linear = func.linear_ownership;
    debug_assert_ne!(temp, src, "temporary initialized from itself");

    // If the copy takes its source, the source must be deinitialized at
    // the right spot: after the last use of the temporary, but before
    // any potential re-initialization of the source.
    let need_final_deinit = take_src;

    let block = func.block_of(copy);
    let mut reads: FxHashSet<InstId> = FxHashSet::default();
    let mut users: FxHashSet<InstId> = FxHashSet::default();

    for user in func.uses_of(temp) {
        users.insert(user);
        if user == copy {
            continue;
        }
        match func.kind(user) {
            // Deallocations may be in a different block.
            InstKind::DeallocStack { .. } => continue,
            // So may destroys — but outside linear ownership, inserting
            // the source destroy needs the conservative lifetime bound
            // that runs to the destroy itself, so destroys then count
            // as reads and must be in the initializer's block.
            InstKind::DestroyAddr { .. } => {
                if !linear && need_final_deinit {
                    if func.block_of(user) != block {
                        return;
                    }
                    reads.insert(user);
                }
                continue;
            }
            _ => {}
        }
        if !collect_reads(func, pool, user, temp, temp, block, &mut reads) {
            return;
        }
    }

    // No use of the temporary may precede the initializer in program
    // order. Projections can be emitted ahead of the copy.
    let copy_pos = func.position(copy);
    if func.block(block).insts[..copy_pos]
        .iter()
        .any(|inst| users.contains(inst))
    {
        return;
    }

    let Some(boundary) = last_use_while_source_unmodified(func, copy, &reads, oracle) else {
        return;
    };

    // The source destroy cannot go after the boundary if the boundary
    // itself re-initializes the source (a taking copy back into it).
    if need_final_deinit
        && boundary != copy
        && !matches!(func.kind(boundary), InstKind::DestroyAddr { .. })
        && oracle.may_write_to_memory(func, boundary, src)
    {
        return;
    }

    if !linear && !is_destroyed_directly(func, temp_alloc, copy) {
        return;
    }

    if !extend_access_scopes(func, copy, boundary, oracle) {
        return;
    }

    tracing::debug!(
        function = func.name.raw(),
        temp = temp.raw(),
        "replacing temporary with copy source"
    );

    // Does the boundary instruction already perform the final
    // consumption of the (former) temporary contents? If not, the take
    // of the source is compensated with a synthesized destroy.
    let need_to_insert_destroy = need_final_deinit
        && if boundary == copy {
            true
        } else {
            match func.kind(boundary) {
                InstKind::CopyAddr {
                    src: s, take_src, ..
                } => !(*s == temp && *take_src),
                InstKind::Load { addr, qualifier } => {
                    !(*addr == temp && *qualifier == LoadQualifier::Take)
                }
                _ => true,
            }
        };
    if need_to_insert_destroy {
        insert_destroy_after(func, boundary, src);
    }

    // Replace all uses of the temporary with the source; destroys and
    // the deallocation compensate the removed copy by disappearing;
    // non-boundary takes out of the temporary become copying forms.
    for user in func.uses_of(temp) {
        match func.kind(user) {
            InstKind::DestroyAddr { .. } | InstKind::DeallocStack { .. } => func.erase(user),
            InstKind::CopyAddr { take_src, .. } if user != copy => {
                let take = *take_src;
                if take && (!need_final_deinit || boundary != user) {
                    if let InstKind::CopyAddr { take_src, .. } = func.kind_mut(user) {
                        *take_src = false;
                    }
                }
                func.substitute_in(user, temp, src);
            }
            InstKind::Load { qualifier, .. } => {
                let take = *qualifier == LoadQualifier::Take;
                if take && (!need_final_deinit || boundary != user) {
                    if let InstKind::Load { qualifier, .. } = func.kind_mut(user) {
                        *qualifier = LoadQualifier::Copy;
                    }
                }
                func.substitute_in(user, temp, src);
            }
            // The initializer itself becomes src → src here; every
            // other accepted use kind cannot destroy the temporary and
            // is redirected as-is.
            _ => func.substitute_in(user, temp, src),
        }
    }

    func.erase(temp_alloc);
}

/// Insert `destroy_addr %addr` immediately after `anchor`. When the
/// anchor terminates its block, the destroy goes at the head of each
/// successor instead.
fn insert_destroy_after(func: &mut Function, anchor: InstId, addr: ValueId) {
    if func.kind(anchor).is_terminator() {
        for succ in func.successors(func.block_of(anchor)) {
            func.insert_at_block_start(succ, InstKind::DestroyAddr { addr });
        }
    } else {
        func.insert_after(anchor, InstKind::DestroyAddr { addr });
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

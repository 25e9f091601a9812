//! Temporary-elimination pass driver.
//!
//! Scans each block in program order and dispatches candidate
//! instructions: address copies to copy elimination, stores to store
//! elimination. Copies whose source and destination coincide after
//! rewriting — the identity form the copy-rewriter leaves behind, or
//! copies of a temporary back to its own source exposed by earlier
//! iterations — are queued and erased after the scan, handing each
//! erased copy's source definition to the dead-code simplifier.
//! Enum-typed values whose slots were store-eliminated are queued for
//! lifetime completion.
//!
//! One forward scan per invocation; re-running the pass may expose
//! further candidates, which is left to the caller's scheduling.

use vela_ir::{Function, InstId, InstKind, TypePool, ValueId};

use crate::alias::AliasOracle;
use crate::complete::complete_lifetime;
use crate::copy_elim::try_eliminate_copy;
use crate::simplify::simplify_and_erase;
use crate::store_elim::{try_eliminate_store, StoreElim};

/// Work counts from one [`eliminate_temporaries`] invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TempElimStats {
    /// Identity copies removed (copy-eliminated temporaries plus
    /// already-identical copies swept up by this run).
    pub copies_eliminated: usize,
    /// Store-initialized temporaries rewritten to value form.
    pub stores_eliminated: usize,
}

impl TempElimStats {
    /// Whether this run changed the function at all.
    pub fn changed(self) -> bool {
        self.copies_eliminated > 0 || self.stores_eliminated > 0
    }
}

/// Run temporary elimination over `func`.
pub fn eliminate_temporaries(
    func: &mut Function,
    pool: &TypePool,
    oracle: &dyn AliasOracle,
) -> TempElimStats {
    let mut stats = TempElimStats::default();
    let mut dead_copies: Vec<InstId> = Vec::new();
    let mut values_to_complete: Vec<ValueId> = Vec::new();

    let blocks: Vec<_> = func.block_ids().collect();
    for bb in blocks {
        let mut i = 0;
        while i < func.block(bb).insts.len() {
            let inst = func.block(bb).insts[i];
            match func.kind(inst) {
                InstKind::CopyAddr { .. } => {
                    // May erase instructions around the copy, but never
                    // the copy itself.
                    try_eliminate_copy(func, pool, inst, oracle);
                    if let InstKind::CopyAddr { src, dest, .. } = func.kind(inst) {
                        if src == dest {
                            dead_copies.push(inst);
                            stats.copies_eliminated += 1;
                        }
                    }
                    i = func.position(inst) + 1;
                }
                InstKind::Store { value, .. } => {
                    let stored = *value;
                    let stored_is_enum = pool.is_or_has_enum(func.value_type(stored));
                    match try_eliminate_store(func, pool, inst) {
                        StoreElim::Unchanged => i += 1,
                        StoreElim::Rewritten { next } => {
                            stats.stores_eliminated += 1;
                            // The slot held an enum: its address-based
                            // lifetime may have had gaps on payload-free
                            // paths that are observable now that the
                            // value is first-class.
                            if stored_is_enum {
                                values_to_complete.push(stored);
                            }
                            i = match next {
                                Some(next) => func.position(next),
                                None => func.block(bb).insts.len(),
                            };
                        }
                    }
                }
                _ => i += 1,
            }
        }
    }

    for copy in dead_copies {
        let src_def = match func.kind(copy) {
            InstKind::CopyAddr { src, .. } => func.defining_inst(*src),
            _ => None,
        };
        func.erase(copy);
        // The erased copy may have been the last use of an access
        // scope or projection chain opened just for it.
        if let Some(def) = src_def {
            simplify_and_erase(func, def);
        }
    }

    for value in values_to_complete {
        complete_lifetime(func, pool, value);
    }

    if stats.changed() {
        tracing::debug!(
            function = func.name.raw(),
            copies = stats.copies_eliminated,
            stores = stats.stores_eliminated,
            "eliminated temporaries"
        );
    }

    stats
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests;

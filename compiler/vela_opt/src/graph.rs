//! Shared CFG utilities for the optimizer passes.
//!
//! Generic graph operations on [`Function`] that several passes need.
//! They live here rather than in a specific pass module so that passes
//! do not import from each other.

use rustc_hash::FxHashSet;
use vela_ir::{BlockId, Function};

/// Compute the predecessor list for each block (deduplicated).
///
/// Returns a vector indexed by block index, where each entry is the
/// list of distinct predecessor block IDs.
pub(crate) fn compute_predecessors(func: &Function) -> Vec<Vec<BlockId>> {
    let num_blocks = func.num_blocks();
    let mut predecessors: Vec<Vec<BlockId>> = vec![Vec::new(); num_blocks];

    for block in func.block_ids() {
        let mut seen = FxHashSet::default();
        for succ in func.successors(block) {
            if succ.index() < num_blocks && seen.insert(succ) {
                predecessors[succ.index()].push(block);
            }
        }
    }

    predecessors
}

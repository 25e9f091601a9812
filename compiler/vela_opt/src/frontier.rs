//! Lifetime frontier computation.
//!
//! Given a definition point and the set of instructions using the
//! defined value (or address), computes the **frontier**: the minimal
//! set of program points at which the lifetime has just ended on every
//! path. Each point is either "before instruction `pos` of a block"
//! (`pos > 0`: the lifetime ended inside the block, right after
//! `pos - 1`) or "at the head of a block" (`pos == 0`: the lifetime
//! ended on the incoming control-flow edge).
//!
//! The computation never modifies the CFG. Where a correct frontier
//! would require splitting an edge or inserting past a terminator, it
//! returns `None` and callers treat the situation conservatively.

use rustc_hash::{FxHashMap, FxHashSet};
use vela_ir::{BlockId, Function, InstId};

use crate::graph::compute_predecessors;

/// A program point on a lifetime frontier: before the instruction at
/// `pos` in `block` (`pos == 0` means the block head).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontierPoint {
    pub block: BlockId,
    pub pos: usize,
}

/// Compute the lifetime frontier for a value defined at
/// (`def_block`, `def_pos`) and used by `users`.
///
/// With no users, the lifetime ends immediately after the definition.
/// Returns `None` when a frontier point would fall past a terminator or
/// when the use set is inconsistent with the CFG.
pub fn compute_frontier(
    func: &Function,
    def_block: BlockId,
    def_pos: usize,
    users: &FxHashSet<InstId>,
) -> Option<Vec<FrontierPoint>> {
    if users.is_empty() {
        return point_after(func, def_block, def_pos).map(|p| vec![p]);
    }

    // Last user position per block.
    let mut last_user: FxHashMap<BlockId, usize> = FxHashMap::default();
    for &user in users {
        let block = func.block_of(user);
        let pos = func.position(user);
        let entry = last_user.entry(block).or_insert(pos);
        if pos > *entry {
            *entry = pos;
        }
    }

    // Blocks with the value live at entry: every block on a backward
    // path from a user block to the definition block. The definition
    // block itself is excluded — the value is born mid-block.
    let predecessors = compute_predecessors(func);
    let mut live_in: FxHashSet<BlockId> = FxHashSet::default();
    let mut worklist: Vec<BlockId> = Vec::new();
    for &block in last_user.keys() {
        if block != def_block && live_in.insert(block) {
            worklist.push(block);
        }
    }
    while let Some(block) = worklist.pop() {
        for &pred in &predecessors[block.index()] {
            if pred != def_block && live_in.insert(pred) {
                worklist.push(pred);
            }
        }
    }

    // Deterministic block order: definition block first, then live
    // blocks by index.
    let mut live_blocks: Vec<BlockId> = live_in.iter().copied().collect();
    live_blocks.sort_by_key(|b| b.index());
    live_blocks.insert(0, def_block);

    let mut frontier: Vec<FrontierPoint> = Vec::new();
    let mut seen: FxHashSet<(BlockId, usize)> = FxHashSet::default();

    for block in live_blocks {
        let succs = func.successors(block);
        let live_out = succs.iter().any(|s| live_in.contains(s));
        if live_out {
            // Lifetime leaves this block; it ends at the head of any
            // successor it does not continue into.
            for &succ in &succs {
                if !live_in.contains(&succ) && seen.insert((succ, 0)) {
                    frontier.push(FrontierPoint { block: succ, pos: 0 });
                }
            }
        } else {
            // Lifetime ends inside this block, after its last user (or
            // after the definition, if the defining block has none).
            let end = match last_user.get(&block) {
                Some(&pos) => pos,
                None if block == def_block => def_pos,
                // Live-in block with no user and no live successor:
                // the backward walk and forward reachability disagree.
                None => return None,
            };
            let point = point_after(func, block, end)?;
            if seen.insert((point.block, point.pos)) {
                frontier.push(point);
            }
        }
    }

    Some(frontier)
}

/// The frontier point immediately after position `pos` in `block`, or
/// `None` when `pos` holds the block's terminator (there is no "after").
fn point_after(func: &Function, block: BlockId, pos: usize) -> Option<FrontierPoint> {
    let insts = &func.block(block).insts;
    if let Some(&inst) = insts.get(pos) {
        if func.kind(inst).is_terminator() {
            return None;
        }
    }
    Some(FrontierPoint {
        block,
        pos: pos + 1,
    })
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests;

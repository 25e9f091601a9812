//! Lifetime completion for values.
//!
//! Converting an enum-typed slot from address form to value form can
//! expose lifetime gaps: the address could legally go dead on paths
//! where the payload case never occurs, but a first-class value must be
//! destroyed exactly once on every path. [`complete_lifetime`] restores
//! that invariant by inserting destroys at the value's liveness
//! frontier wherever the path's last use does not already consume it.

use rustc_hash::FxHashSet;
use vela_ir::{BlockId, Function, InstId, InstKind, TypePool, ValueDef, ValueId};

use crate::frontier::compute_frontier;

/// Insert destroys so that `value` is destroyed exactly once on every
/// path, per the liveness criterion: the lifetime ends at the frontier
/// of its uses. Trivial values need no destroys and are left alone.
pub fn complete_lifetime(func: &mut Function, pool: &TypePool, value: ValueId) {
    if pool.is_trivial(func.value_type(value)) {
        return;
    }

    let (def_block, def_pos) = match func.def_of(value) {
        ValueDef::Result(inst) => (func.block_of(inst), func.position(inst)),
        ValueDef::BlockParam { block, .. } => (block, 0),
        ValueDef::Param(_) => (BlockId::new(0), 0),
    };

    let users: FxHashSet<InstId> = func.uses_of(value).into_iter().collect();

    let Some(frontier) = compute_frontier(func, def_block, def_pos, &users) else {
        tracing::debug!(
            function = func.name.raw(),
            value = value.raw(),
            "lifetime completion skipped: no insertable frontier"
        );
        return;
    };

    // Anchor the insertions before applying any of them — inserting
    // shifts positions within a block, so frontier positions cannot be
    // used directly once mutation starts.
    enum InsertAt {
        After(InstId),
        BlockStart(BlockId),
    }
    let mut insertions: Vec<InsertAt> = Vec::new();
    for point in frontier {
        if point.pos == 0 {
            // The lifetime ended on the incoming edge.
            insertions.push(InsertAt::BlockStart(point.block));
            continue;
        }
        let prev = func.block(point.block).insts[point.pos - 1];
        if users.contains(&prev) && is_consuming_use(func, prev, value) {
            // The path's last use already ends the lifetime.
            continue;
        }
        insertions.push(InsertAt::After(prev));
    }

    for insertion in insertions {
        match insertion {
            InsertAt::After(anchor) => {
                func.insert_after(anchor, InstKind::DestroyValue { value });
            }
            InsertAt::BlockStart(block) => {
                func.insert_at_block_start(block, InstKind::DestroyValue { value });
            }
        }
    }
}

/// Whether `inst` consumes `value`: transfers its ownership onward or
/// destroys it.
fn is_consuming_use(func: &Function, inst: InstId, value: ValueId) -> bool {
    match func.kind(inst) {
        InstKind::DestroyValue { value: v } => *v == value,
        InstKind::Store { value: v, .. } => *v == value,
        kind if kind.is_terminator() => kind.operands().contains(&value),
        kind => match kind.argument_convention(value) {
            Some(conv) => !conv.is_guaranteed(),
            None => false,
        },
    }
}

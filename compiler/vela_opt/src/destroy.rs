//! Destroy-pattern validation for non-linear-ownership functions.
//!
//! The copy-rewriter assumes the temporary is initialized by the
//! candidate copy and destroyed on every path by a recognized direct
//! operation. Under linear ownership the use-lists themselves guarantee
//! this; outside it, storage may legally be destroyed indirectly (for
//! example by loading the value and releasing it), so the assumption
//! must be checked before rewriting.

use rustc_hash::FxHashSet;
use vela_ir::{Function, InstId, InstKind};

use crate::frontier::compute_frontier;

/// Check that the temporary allocated by `temp_alloc` and initialized
/// by `copy` is destroyed in a recognized way on every path: at each
/// point of its lifetime frontier, the immediately preceding
/// instruction must be a direct destroy of the temporary or a whole-
/// object taking copy out of it.
///
/// A frontier point at a block head means the lifetime ended on a
/// control-flow edge; that pattern is not handled and disqualifies.
pub(crate) fn is_destroyed_directly(func: &Function, temp_alloc: InstId, copy: InstId) -> bool {
    let Some(temp) = func.result(temp_alloc) else {
        return false;
    };

    // The frontier is computed from every use except the initializer
    // and the deallocations: it must land exactly on the destroy
    // points.
    let mut users: FxHashSet<InstId> = FxHashSet::default();
    for user in func.uses_of(temp) {
        if user == copy || matches!(func.kind(user), InstKind::DeallocStack { .. }) {
            continue;
        }
        users.insert(user);
    }

    let def_block = func.block_of(copy);
    let def_pos = func.position(copy);
    let Some(frontier) = compute_frontier(func, def_block, def_pos, &users) else {
        return false;
    };

    for point in frontier {
        // A lifetime ending at a block head crossed a control-flow
        // edge; there is no single preceding instruction to inspect.
        if point.pos == 0 {
            return false;
        }
        let prev = func.block(point.block).insts[point.pos - 1];
        match func.kind(prev) {
            InstKind::DestroyAddr { .. } => {}
            InstKind::CopyAddr { src, take_src, .. } if *src == temp && *take_src => {}
            _ => return false,
        }
    }
    true
}

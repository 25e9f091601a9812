//! Source-modification check for the copy-rewriter.
//!
//! The destroy points of a temporary are commonly in a different block
//! than its reads, so they cannot bound the live range directly.
//! Instead, every recorded read is known to be in the initializer's
//! block; scanning forward from the initializer until all of them have
//! been passed finds the instruction that effectively ends the
//! temporary's useful lifetime — provided the copy source is not
//! written to anywhere in between.

use rustc_hash::FxHashSet;
use vela_ir::{Function, InstId, InstKind};

use crate::alias::AliasOracle;

/// Find the last recorded read of the temporary initialized by `copy`,
/// verifying that the copy's source is not modified before it.
///
/// Returns the boundary instruction — the last read, or `copy` itself
/// when there are no reads — or `None` if the source may be written
/// within the temporary's useful lifetime.
///
/// An instruction that both reads and writes the source (a copy can)
/// is assumed to write after reading, so a write by the boundary
/// instruction itself is fine — except for calls and yields, where a
/// callee may write the source *before* the call's apparent read of the
/// temporary; those fail conservatively.
pub(crate) fn last_use_while_source_unmodified(
    func: &Function,
    copy: InstId,
    reads: &FxHashSet<InstId>,
    oracle: &dyn AliasOracle,
) -> Option<InstId> {
    if reads.is_empty() {
        return Some(copy);
    }

    let copy_src = match func.kind(copy) {
        InstKind::CopyAddr { src, .. } => *src,
        other => panic!("source-modification check on non-copy {other:?}"),
    };

    let block = func.block_of(copy);
    let start = func.position(copy) + 1;
    let mut reads_found = 0usize;

    for &inst in &func.block(block).insts[start..] {
        if reads.contains(&inst) {
            reads_found += 1;
        }

        // Past the last read, modifications of the source no longer
        // matter.
        if reads_found == reads.len() {
            let kind = func.kind(inst);
            if (kind.is_full_apply() || matches!(kind, InstKind::Yield { .. }))
                && oracle.may_write_to_memory(func, inst, copy_src)
            {
                return None;
            }
            return Some(inst);
        }

        if oracle.may_write_to_memory(func, inst, copy_src) {
            tracing::trace!(function = func.name.raw(), "source modified within temporary lifetime");
            return None;
        }
    }

    // Not all recorded reads were seen before the end of the block —
    // the collector and this scan have drifted apart.
    debug_assert!(false, "recorded reads not all found in initializer block");
    None
}

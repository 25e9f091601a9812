//! Access-scope extension across the copy-elimination rewrite.
//!
//! The copy source is often itself the result of a read access:
//!
//! ```text
//!   %a = begin_access [Read] %src
//!   copy_addr %a to [init] %temp
//!   end_access %a
//!   use %temp
//! ```
//!
//! Rewriting `use %temp` to `use %a` would move a use of the scope past
//! its end. When that is the only obstacle, the `end_access` is moved
//! down to just after the last use instead — but only when doing so
//! cannot interleave with another scope or extend a read scope across a
//! write.

use vela_ir::{AccessKind, Function, InstId, InstKind, ValueId};

use crate::alias::AliasOracle;

/// Try to relocate an `end_access` of a scope aliasing the copy source
/// so the scope covers every use of the temporary up to `boundary`.
///
/// Returns `false` (leaving the IR unchanged) when relocation is needed
/// but impossible. At most one `end_access` is moved; a second
/// `end_access` after a candidate was chosen fails, as does any
/// `begin_access` (scope nesting) or potential write to the scope's
/// memory after the candidate. A boundary that terminates the block
/// cannot have instructions moved after it.
pub(crate) fn extend_access_scopes(
    func: &mut Function,
    copy: InstId,
    boundary: InstId,
    oracle: &dyn AliasOracle,
) -> bool {
    if boundary == copy {
        return true;
    }

    let copy_src = match func.kind(copy) {
        InstKind::CopyAddr { src, .. } => *src,
        other => panic!("scope extension on non-copy {other:?}"),
    };

    let block = func.block_of(copy);
    let start = func.position(copy) + 1;
    let end = func.position(boundary) + 1;
    let mut to_move: Option<(InstId, ValueId)> = None;

    for &inst in &func.block(block).insts[start..end] {
        if let InstKind::EndAccess { scope } = func.kind(inst) {
            // Moving one end_access over another would reorder scope
            // ends; keep it simple and give up.
            if to_move.is_some() {
                return false;
            }
            let scope = *scope;
            // Aliasing Modify scopes cannot be here — the source-
            // modification check already ran. Where the oracle's
            // no-alias answer is weaker than its write answer, a
            // non-read scope can still show up; ignore it.
            if !oracle.is_no_alias(func, copy_src, scope) && scope_is_read(func, scope) {
                // Terminators cannot have instructions moved after them.
                if func.kind(boundary).is_terminator() {
                    return false;
                }
                to_move = Some((inst, scope));
            }
        } else if let Some((_, scope)) = to_move {
            // Crossing a begin_access would break scope nesting.
            if matches!(
                func.kind(inst),
                InstKind::BeginAccess { .. } | InstKind::BeginUnpairedAccess { .. }
            ) {
                return false;
            }
            // A read scope must not be extended over a potential write.
            // A call here can only contain read accesses of this memory
            // (a writing call would have failed the source-modification
            // check), so extending over it is fine.
            if oracle.may_write_to_memory(func, inst, scope) {
                return false;
            }
        }
    }

    if let Some((end_access, _)) = to_move {
        func.move_after(end_access, boundary);
    }
    true
}

/// Whether `scope` (a `begin_access` result) opens a Read scope.
fn scope_is_read(func: &Function, scope: ValueId) -> bool {
    match func.defining_inst(scope).map(|inst| func.kind(inst)) {
        Some(InstKind::BeginAccess { kind, .. }) => *kind == AccessKind::Read,
        _ => {
            debug_assert!(false, "end_access scope is not a begin_access result");
            false
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

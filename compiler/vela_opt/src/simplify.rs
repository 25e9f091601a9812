//! Dead-code simplification after a rewrite.
//!
//! Erasing an identity copy can leave its source definition — an
//! access scope opened just for the copy, a projection chain, a
//! dependence marker — without any remaining use.
//! [`simplify_and_erase`] erases such an instruction and transitively
//! chases the definitions of its own operands.
//!
//! Only structurally dead patterns are handled; anything with memory
//! or ownership effects of its own is left alone. Copies are never
//! erased here — the pass driver owns dead-copy bookkeeping.

use vela_ir::{Function, InstId, InstKind};

/// Erase `inst` if it is dead, then transitively simplify the
/// definitions of its operands. Instructions that are still used, or
/// whose kind is not recognized as erasable, are left in place.
pub fn simplify_and_erase(func: &mut Function, inst: InstId) {
    let mut worklist: Vec<InstId> = vec![inst];

    while let Some(inst) = worklist.pop() {
        if func.is_erased(inst) {
            continue;
        }

        match func.kind(inst) {
            // An access scope whose only remaining uses are its ends
            // brackets nothing.
            InstKind::BeginAccess { addr, .. } => {
                let addr = *addr;
                let Some(scope) = func.result(inst) else {
                    continue;
                };
                let uses = func.uses_of(scope);
                if !uses
                    .iter()
                    .all(|&u| matches!(func.kind(u), InstKind::EndAccess { .. }))
                {
                    continue;
                }
                for end in uses {
                    func.erase(end);
                }
                func.erase(inst);
                if let Some(def) = func.defining_inst(addr) {
                    worklist.push(def);
                }
            }

            // Pure address projections and forwarding markers with no
            // remaining use.
            InstKind::StructElementAddr { base: operand, .. }
            | InstKind::TupleElementAddr { base: operand, .. }
            | InstKind::UncheckedAddrCast { addr: operand, .. }
            | InstKind::UncheckedTakeEnumDataAddr { addr: operand, .. }
            | InstKind::OpenExistentialAddr { addr: operand, .. } => {
                let operand = *operand;
                let Some(result) = func.result(inst) else {
                    continue;
                };
                if func.has_uses(result) {
                    continue;
                }
                func.erase(inst);
                if let Some(def) = func.defining_inst(operand) {
                    worklist.push(def);
                }
            }

            InstKind::MarkDependence { value, base } => {
                let (value, base) = (*value, *base);
                let Some(result) = func.result(inst) else {
                    continue;
                };
                if func.has_uses(result) {
                    continue;
                }
                func.erase(inst);
                if let Some(def) = func.defining_inst(value) {
                    worklist.push(def);
                }
                if let Some(def) = func.defining_inst(base) {
                    worklist.push(def);
                }
            }

            // A slot used only by its deallocations never held a value.
            InstKind::AllocStack { .. } => {
                let Some(slot) = func.result(inst) else {
                    continue;
                };
                let uses = func.uses_of(slot);
                if !uses
                    .iter()
                    .all(|&u| matches!(func.kind(u), InstKind::DeallocStack { .. }))
                {
                    continue;
                }
                for dealloc in uses {
                    func.erase(dealloc);
                }
                func.erase(inst);
            }

            // Everything else — including copies — keeps its effects.
            _ => {}
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

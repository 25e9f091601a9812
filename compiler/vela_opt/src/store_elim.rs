//! Store elimination: redundant-load elimination through a temporary.
//!
//! The value form of the temporary pattern:
//!
//! ```text
//!   %temp = alloc_stack $T
//!   store %src to [init] %temp
//!   // no writes to %temp
//!   %v = load [take] %temp
//!   dealloc_stack %temp
//! ```
//!
//! A store always consumes its source operand, so unlike copy
//! elimination there is no source-modification analysis: every use of
//! the temporary is rewritten directly in terms of the stored value and
//! the slot disappears. The set of use kinds accepted by the pre-scan
//! is rewritten exhaustively in the commit phase; a kind reaching
//! commit unhandled means the two have drifted apart, which is a fatal
//! internal-consistency failure, not a disqualification.

use vela_ir::{Function, InstId, InstKind, LoadQualifier, StoreQualifier, TypePool, ValueId};

/// Outcome of a store-elimination attempt, advising the driver's
/// instruction iteration.
pub(crate) enum StoreElim {
    /// Nothing changed; continue with the next instruction.
    Unchanged,
    /// The store, the allocation, and the temporary's uses are gone.
    /// `next` is the first surviving instruction after the erased
    /// store, if any.
    Rewritten { next: Option<InstId> },
}

/// Try to eliminate the temporary initialized by `store`.
pub(crate) fn try_eliminate_store(
    func: &mut Function,
    pool: &TypePool,
    store: InstId,
) -> StoreElim {
    let (stored, temp, qualifier) = match func.kind(store) {
        InstKind::Store {
            value,
            dest,
            qualifier,
        } => (*value, *dest, *qualifier),
        _ => return StoreElim::Unchanged,
    };
    // Only an initializing store begins the recognized lifetime shape.
    if qualifier == StoreQualifier::Assign {
        return StoreElim::Unchanged;
    }

    let Some(temp_alloc) = func.defining_inst(temp) else {
        return StoreElim::Unchanged;
    };
    match func.kind(temp_alloc) {
        InstKind::AllocStack {
            lexical,
            dynamic_lifetime,
            ..
        } => {
            // A lexical slot is tied to a source-visible scope; a
            // dynamic-lifetime slot may be conditionally initialized.
            // Neither converts to a plain value lifetime.
            if *lexical || *dynamic_lifetime {
                return StoreElim::Unchanged;
            }
        }
        _ => return StoreElim::Unchanged,
    }

    // Bail if any use is not one of the kinds the commit phase below
    // knows how to rewrite.
    for user in func.uses_of(temp) {
        if user == store {
            continue;
        }
        match func.kind(user) {
            InstKind::DestroyAddr { .. }
            | InstKind::DeallocStack { .. }
            | InstKind::Load { .. }
            | InstKind::FixLifetime { .. } => {}
            InstKind::CopyAddr { dest, .. } => {
                // A copy back into the temporary reinitializes it.
                if *dest == temp {
                    return StoreElim::Unchanged;
                }
            }
            InstKind::MarkDependence { value, .. } => {
                // Only the base operand can be re-pointed at the stored
                // value.
                if *value == temp {
                    return StoreElim::Unchanged;
                }
            }
            _ => return StoreElim::Unchanged,
        }
    }

    tracing::debug!(
        function = func.name.raw(),
        temp = temp.raw(),
        "replacing temporary with stored value"
    );

    // A store is always a consuming operation, so the uses can be
    // rewritten without lifetime analysis.
    let mut to_delete: Vec<InstId> = Vec::new();
    for user in func.uses_of(temp) {
        if user == store {
            continue;
        }
        match func.kind(user) {
            InstKind::DestroyAddr { .. } => {
                if !pool.is_trivial(func.value_type(stored)) {
                    func.insert_before(user, InstKind::DestroyValue { value: stored });
                }
                to_delete.push(user);
            }
            InstKind::DeallocStack { .. } => to_delete.push(user),
            InstKind::CopyAddr {
                src,
                dest,
                take_src,
                init_dest,
            } => {
                debug_assert_eq!(*src, temp, "pre-scan rejects copies into the temporary");
                let (dest, take, init) = (*dest, *take_src, *init_dest);
                let qualifier = if init {
                    StoreQualifier::Init
                } else {
                    StoreQualifier::Assign
                };
                let mut source = stored;
                if !take {
                    source = duplicate_before(func, user, stored);
                }
                func.insert_before(
                    user,
                    InstKind::Store {
                        value: source,
                        dest,
                        qualifier,
                    },
                );
                to_delete.push(user);
            }
            InstKind::Load { qualifier, .. } => {
                // The stored value is the loaded value. A non-consuming
                // load duplicates it first; a take uses it directly.
                let duplicates = *qualifier == LoadQualifier::Copy;
                let mut replacement = stored;
                if duplicates {
                    replacement = duplicate_before(func, user, stored);
                }
                let result = result_of(func, user);
                func.replace_all_uses(result, replacement);
                to_delete.push(user);
            }
            InstKind::FixLifetime { .. } => {
                func.insert_before(user, InstKind::FixLifetime { value: stored });
                to_delete.push(user);
            }
            InstKind::MarkDependence { value, .. } => {
                let value = *value;
                let rebuilt = func.insert_before(
                    user,
                    InstKind::MarkDependence {
                        value,
                        base: stored,
                    },
                );
                let old_result = result_of(func, user);
                let new_result = result_of(func, rebuilt);
                func.replace_all_uses(old_result, new_result);
                to_delete.push(user);
            }
            other => panic!("store elimination: unhandled use of temporary: {other:?}"),
        }
    }

    while let Some(inst) = to_delete.pop() {
        func.erase(inst);
    }

    let store_pos = func.position(store);
    let next = func.block(func.block_of(store)).insts.get(store_pos + 1).copied();
    func.erase(store);
    func.erase(temp_alloc);

    StoreElim::Rewritten { next }
}

/// Emit `copy_value %value` just before `anchor` and return the copy.
fn duplicate_before(func: &mut Function, anchor: InstId, value: ValueId) -> ValueId {
    let copy = func.insert_before(anchor, InstKind::CopyValue { value });
    result_of(func, copy)
}

fn result_of(func: &Function, inst: InstId) -> ValueId {
    func.result(inst)
        .unwrap_or_else(|| panic!("instruction {inst:?} has no result"))
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

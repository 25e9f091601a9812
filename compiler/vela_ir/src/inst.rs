//! Instruction kinds for the Vela address IR.
//!
//! [`InstKind`] is a closed tagged union: every operation the optimizer
//! reasons about has its own arm, and analysis code matches exhaustively
//! so a new kind forces an explicit decision at every use site rather
//! than silently falling into a default.
//!
//! Instructions reference values by [`ValueId`] and blocks by
//! [`BlockId`]; the owning [`Function`](crate::Function) arena assigns
//! result values. Terminators are ordinary instruction kinds that may
//! only appear last in a block — `try_apply` and `yield` are call-like
//! *and* terminators, matching the source IR this models.

use smallvec::{smallvec, SmallVec};

use crate::function::{BlockId, ValueId};
use crate::name::Name;
use crate::types::TypeId;

// ── Qualifiers and conventions ──────────────────────────────────────

/// Access kind of a `begin_access` scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Read-only access. No writes to the accessed memory may occur
    /// inside the scope.
    Read,
    /// Read-write access.
    Modify,
}

/// Access mode of an `open_existential_addr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExistentialAccess {
    /// The opened address is only read.
    Immutable,
    /// The opened address may be mutated or consumed.
    Mutable,
}

/// Ownership qualifier of a `load`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadQualifier {
    /// Duplicate the stored value; storage stays initialized.
    Copy,
    /// Move the stored value out; storage becomes uninitialized.
    Take,
}

/// Ownership qualifier of a `store`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreQualifier {
    /// The destination was uninitialized.
    Init,
    /// The destination held a value, which is destroyed first.
    Assign,
}

/// Ownership convention of a parameter or call-site argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamConvention {
    /// The callee only reads the argument and never invalidates it for
    /// the duration of the call.
    Guaranteed,
    /// The callee takes ownership and must destroy the value.
    Owned,
    /// The callee may read and write through the address.
    Inout,
}

impl ParamConvention {
    /// Returns `true` for the read-only convention.
    #[inline]
    pub fn is_guaranteed(self) -> bool {
        matches!(self, ParamConvention::Guaranteed)
    }
}

// ── Instruction kinds ───────────────────────────────────────────────

/// A single operation in the address IR.
///
/// Result-producing kinds get their result [`ValueId`] from the owning
/// function when appended. Operand slots hold [`ValueId`]s; redirecting
/// an operand ([`substitute_value`](InstKind::substitute_value)) is the
/// only way an existing instruction is rewritten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstKind {
    /// Allocate an uninitialized stack slot. Result: the slot address.
    AllocStack {
        /// Type of the stored value.
        ty: TypeId,
        /// Lifetime is tied to a source-visible scope and must not be
        /// shortened past another lexical value's scope.
        lexical: bool,
        /// The slot may be conditionally (un)initialized.
        dynamic_lifetime: bool,
    },
    /// Free a stack slot. The stored value must already be gone.
    DeallocStack { addr: ValueId },

    /// Copy the value at `src` to `dest`.
    CopyAddr {
        src: ValueId,
        dest: ValueId,
        /// `src` is consumed (left uninitialized) rather than duplicated.
        take_src: bool,
        /// `dest` was uninitialized (no implicit destroy of old value).
        init_dest: bool,
    },
    /// Write an object value into an address.
    Store {
        value: ValueId,
        dest: ValueId,
        qualifier: StoreQualifier,
    },
    /// Read the value at an address. Result: the loaded value.
    Load {
        addr: ValueId,
        qualifier: LoadQualifier,
    },
    /// Borrow the value at an address without copying. Result: a scoped
    /// read-only value that must be closed by `end_borrow`.
    LoadBorrow { addr: ValueId },
    /// Close a `load_borrow` scope.
    EndBorrow { borrow: ValueId },

    /// Open an access scope. Result: the accessed address.
    BeginAccess { addr: ValueId, kind: AccessKind },
    /// Close an access scope. The operand is the `begin_access` result.
    /// A scope may have one `end_access` per exit edge.
    EndAccess { scope: ValueId },
    /// Open an access scope with no paired end (runtime-tracked).
    BeginUnpairedAccess { addr: ValueId, kind: AccessKind },

    /// Destroy the value at an address, leaving it uninitialized.
    DestroyAddr { addr: ValueId },
    /// Destroy an object value.
    DestroyValue { value: ValueId },
    /// Duplicate an object value. Result: the copy.
    CopyValue { value: ValueId },
    /// Assert the operand is live here. No memory effect.
    FixLifetime { value: ValueId },
    /// Tie `value`'s validity to `base`'s lifetime. Result: `value`,
    /// forwarded.
    MarkDependence { value: ValueId, base: ValueId },

    /// Address of a struct field. Result: the field address.
    StructElementAddr {
        base: ValueId,
        field: u32,
        ty: TypeId,
    },
    /// Address of a tuple element. Result: the element address.
    TupleElementAddr {
        base: ValueId,
        index: u32,
        ty: TypeId,
    },
    /// Reinterpret an address at another type. Result: the cast address.
    UncheckedAddrCast { addr: ValueId, ty: TypeId },
    /// Project an enum payload address. Invalidates the stored enum
    /// value except for optional-like enums. Result: the payload address.
    UncheckedTakeEnumDataAddr {
        addr: ValueId,
        variant: u32,
        ty: TypeId,
    },
    /// Open an existential address at its concrete type. Result: the
    /// opened address.
    OpenExistentialAddr {
        addr: ValueId,
        access: ExistentialAccess,
        ty: TypeId,
    },

    /// Call a function. Result: the (direct) call result.
    Apply {
        callee: Name,
        args: Vec<ValueId>,
        conventions: Vec<ParamConvention>,
        ty: TypeId,
    },
    /// Begin a coroutine call. Result: the continuation token whose
    /// uses (`end_apply`/`abort_apply`) close the call's access window.
    BeginApply {
        callee: Name,
        args: Vec<ValueId>,
        conventions: Vec<ParamConvention>,
    },
    /// Resume and finish a coroutine call.
    EndApply { token: ValueId },
    /// Abort a coroutine call.
    AbortApply { token: ValueId },
    /// Create a closure capturing `args`. Result: the closure value.
    PartialApply {
        callee: Name,
        args: Vec<ValueId>,
        conventions: Vec<ParamConvention>,
        /// Closure storage is a non-escaping stack allocation.
        on_stack: bool,
        ty: TypeId,
    },

    // Terminators.
    /// Return from the function.
    Return { value: Option<ValueId> },
    /// Unconditional branch, passing arguments to the target's block
    /// parameters.
    Br { target: BlockId, args: Vec<ValueId> },
    /// Two-way conditional branch.
    CondBr {
        cond: ValueId,
        then_target: BlockId,
        else_target: BlockId,
    },
    /// Call a throwing function. The result is delivered as the normal
    /// successor's block parameter.
    TryApply {
        callee: Name,
        args: Vec<ValueId>,
        conventions: Vec<ParamConvention>,
        normal: BlockId,
        error: BlockId,
    },
    /// Yield values out of a coroutine.
    Yield {
        values: Vec<ValueId>,
        conventions: Vec<ParamConvention>,
        resume: BlockId,
        unwind: BlockId,
    },
    /// Control never reaches here.
    Unreachable,
}

impl InstKind {
    /// All operand values of this instruction, in slot order.
    pub fn operands(&self) -> SmallVec<[ValueId; 4]> {
        match self {
            InstKind::AllocStack { .. } | InstKind::Unreachable => SmallVec::new(),

            InstKind::DeallocStack { addr }
            | InstKind::Load { addr, .. }
            | InstKind::LoadBorrow { addr }
            | InstKind::BeginAccess { addr, .. }
            | InstKind::BeginUnpairedAccess { addr, .. }
            | InstKind::DestroyAddr { addr }
            | InstKind::UncheckedAddrCast { addr, .. }
            | InstKind::UncheckedTakeEnumDataAddr { addr, .. }
            | InstKind::OpenExistentialAddr { addr, .. } => smallvec![*addr],

            InstKind::EndBorrow { borrow } => smallvec![*borrow],
            InstKind::EndAccess { scope } => smallvec![*scope],
            InstKind::DestroyValue { value }
            | InstKind::CopyValue { value }
            | InstKind::FixLifetime { value } => smallvec![*value],
            InstKind::EndApply { token } | InstKind::AbortApply { token } => smallvec![*token],
            InstKind::StructElementAddr { base, .. } | InstKind::TupleElementAddr { base, .. } => {
                smallvec![*base]
            }

            InstKind::CopyAddr { src, dest, .. } => smallvec![*src, *dest],
            InstKind::Store { value, dest, .. } => smallvec![*value, *dest],
            InstKind::MarkDependence { value, base } => smallvec![*value, *base],

            InstKind::Apply { args, .. }
            | InstKind::BeginApply { args, .. }
            | InstKind::PartialApply { args, .. }
            | InstKind::TryApply { args, .. }
            | InstKind::Br { args, .. } => args.iter().copied().collect(),
            InstKind::Yield { values, .. } => values.iter().copied().collect(),

            InstKind::Return { value } => value.iter().copied().collect(),
            InstKind::CondBr { cond, .. } => smallvec![*cond],
        }
    }

    /// Replace every operand slot holding `old` with `new`.
    pub fn substitute_value(&mut self, old: ValueId, new: ValueId) {
        fn sub(v: &mut ValueId, old: ValueId, new: ValueId) {
            if *v == old {
                *v = new;
            }
        }
        fn sub_all(vs: &mut [ValueId], old: ValueId, new: ValueId) {
            for v in vs {
                sub(v, old, new);
            }
        }
        match self {
            InstKind::AllocStack { .. } | InstKind::Unreachable => {}

            InstKind::DeallocStack { addr }
            | InstKind::Load { addr, .. }
            | InstKind::LoadBorrow { addr }
            | InstKind::BeginAccess { addr, .. }
            | InstKind::BeginUnpairedAccess { addr, .. }
            | InstKind::DestroyAddr { addr }
            | InstKind::UncheckedAddrCast { addr, .. }
            | InstKind::UncheckedTakeEnumDataAddr { addr, .. }
            | InstKind::OpenExistentialAddr { addr, .. } => sub(addr, old, new),

            InstKind::EndBorrow { borrow } => sub(borrow, old, new),
            InstKind::EndAccess { scope } => sub(scope, old, new),
            InstKind::DestroyValue { value }
            | InstKind::CopyValue { value }
            | InstKind::FixLifetime { value } => sub(value, old, new),
            InstKind::EndApply { token } | InstKind::AbortApply { token } => sub(token, old, new),
            InstKind::StructElementAddr { base, .. } | InstKind::TupleElementAddr { base, .. } => {
                sub(base, old, new)
            }

            InstKind::CopyAddr { src, dest, .. } => {
                sub(src, old, new);
                sub(dest, old, new);
            }
            InstKind::Store { value, dest, .. } => {
                sub(value, old, new);
                sub(dest, old, new);
            }
            InstKind::MarkDependence { value, base } => {
                sub(value, old, new);
                sub(base, old, new);
            }

            InstKind::Apply { args, .. }
            | InstKind::BeginApply { args, .. }
            | InstKind::PartialApply { args, .. }
            | InstKind::TryApply { args, .. }
            | InstKind::Br { args, .. } => sub_all(args, old, new),
            InstKind::Yield { values, .. } => sub_all(values, old, new),

            InstKind::Return { value } => {
                if let Some(v) = value {
                    sub(v, old, new);
                }
            }
            InstKind::CondBr { cond, .. } => sub(cond, old, new),
        }
    }

    /// Returns `true` if this kind may only appear last in a block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Return { .. }
                | InstKind::Br { .. }
                | InstKind::CondBr { .. }
                | InstKind::TryApply { .. }
                | InstKind::Yield { .. }
                | InstKind::Unreachable
        )
    }

    /// Successor block IDs of a terminator (empty for non-terminators).
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            InstKind::Br { target, .. } => smallvec![*target],
            InstKind::CondBr {
                then_target,
                else_target,
                ..
            } => smallvec![*then_target, *else_target],
            InstKind::TryApply { normal, error, .. } => smallvec![*normal, *error],
            InstKind::Yield { resume, unwind, .. } => smallvec![*resume, *unwind],
            _ => SmallVec::new(),
        }
    }

    /// Returns `true` for full call sites: `apply`, `try_apply`,
    /// `begin_apply`. (`partial_apply` creates a closure, it does not
    /// run the callee.)
    pub fn is_full_apply(&self) -> bool {
        matches!(
            self,
            InstKind::Apply { .. } | InstKind::TryApply { .. } | InstKind::BeginApply { .. }
        )
    }

    /// The argument convention under which a call-like instruction (or
    /// yield) receives `value`, or `None` if `value` is not an argument.
    ///
    /// When the same value is passed in several positions, the most
    /// conservative (non-guaranteed) convention wins.
    pub fn argument_convention(&self, value: ValueId) -> Option<ParamConvention> {
        let (args, conventions) = match self {
            InstKind::Apply {
                args, conventions, ..
            }
            | InstKind::BeginApply {
                args, conventions, ..
            }
            | InstKind::PartialApply {
                args, conventions, ..
            }
            | InstKind::TryApply {
                args, conventions, ..
            } => (args, conventions),
            InstKind::Yield {
                values,
                conventions,
                ..
            } => (values, conventions),
            _ => return None,
        };
        debug_assert_eq!(args.len(), conventions.len(), "convention per argument");

        let mut found = None;
        for (arg, conv) in args.iter().zip(conventions) {
            if *arg == value {
                match found {
                    None => found = Some(*conv),
                    Some(prev) if prev.is_guaranteed() && !conv.is_guaranteed() => {
                        found = Some(*conv);
                    }
                    Some(_) => {}
                }
            }
        }
        found
    }
}

// ── Tests ───────────────────────────────────────────────────────────

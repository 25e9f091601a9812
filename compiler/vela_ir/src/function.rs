//! Functions, blocks, and the instruction/value arenas.
//!
//! A [`Function`] owns all of its instructions and values in index
//! arenas. Blocks hold an ordered `Vec<InstId>`; erasing an instruction
//! removes it from its block and tombstones the arena slot, so every
//! outstanding [`InstId`] stays stable across mutation.
//!
//! Use-lists are derived, not maintained: [`Function::uses_of`] scans
//! the live instructions in program order. Optimizations snapshot the
//! result into a worklist before mutating — nothing here iterates a
//! collection it is rewriting.

use smallvec::SmallVec;

use crate::inst::{InstKind, ParamConvention};
use crate::name::Name;
use crate::types::TypeId;

// ── ID newtypes ─────────────────────────────────────────────────────

/// Value ID within a function.
///
/// Identifies a function parameter, a block parameter, or an
/// instruction result. IDs are allocated sequentially starting from 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ValueId(u32);

impl ValueId {
    /// Create a new value ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Instruction ID within a function.
///
/// Stable across block mutation: erasing an instruction tombstones its
/// arena slot instead of shifting later IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct InstId(u32);

impl InstId {
    /// Create a new instruction ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Basic block ID within a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// Create a new block ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// Where a value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueDef {
    /// Function parameter with the given index.
    Param(u32),
    /// Block parameter: `index`-th parameter of `block`.
    BlockParam { block: BlockId, index: u32 },
    /// Result of an instruction.
    Result(InstId),
}

#[derive(Clone, Debug)]
struct ValueData {
    ty: TypeId,
    def: ValueDef,
}

/// A function parameter.
///
/// Parameters are address parameters (indirect conventions): the value
/// is an address into caller-owned storage, and `convention` states
/// what the function may do through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param {
    /// The value bound to this parameter.
    pub value: ValueId,
    /// The pointee type.
    pub ty: TypeId,
    /// Ownership convention the caller passed the address under.
    pub convention: ParamConvention,
}

// ── Blocks ──────────────────────────────────────────────────────────

/// A basic block: ordered instructions ending in one terminator.
#[derive(Clone, Debug)]
pub struct Block {
    /// This block's identifier.
    pub id: BlockId,
    /// Block parameters — values passed from predecessors via branch
    /// arguments (or delivered by `try_apply`).
    pub params: Vec<ValueId>,
    /// Instructions in program order. In a completed function the last
    /// entry is the block's terminator.
    pub insts: Vec<InstId>,
}

// ── Instruction arena slots ─────────────────────────────────────────

#[derive(Clone, Debug)]
struct InstData {
    kind: InstKind,
    block: BlockId,
    result: Option<ValueId>,
    erased: bool,
}

// ── Function ────────────────────────────────────────────────────────

/// A function body in the address IR.
///
/// Owns every block, instruction, and value. All mutation goes through
/// methods so the arenas and block orders stay consistent.
#[derive(Clone, Debug)]
pub struct Function {
    /// The function's mangled name.
    pub name: Name,
    /// Whether the function operates under the linear-ownership
    /// discipline: every owned value has a single well-defined point of
    /// destruction and use-lists are exact. Outside this mode only
    /// conservative pattern-matching on recognized destroy operations is
    /// trustworthy.
    pub linear_ownership: bool,
    params: Vec<Param>,
    blocks: Vec<Block>,
    insts: Vec<InstData>,
    values: Vec<ValueData>,
}

impl Function {
    /// Create an empty function.
    pub fn new(name: Name, linear_ownership: bool) -> Self {
        Self {
            name,
            linear_ownership,
            params: Vec::new(),
            blocks: Vec::new(),
            insts: Vec::new(),
            values: Vec::new(),
        }
    }

    // ── Parameters ──────────────────────────────────────────────

    /// Add an address parameter with the given pointee type and
    /// convention. Returns its value.
    pub fn add_param(&mut self, ty: TypeId, convention: ParamConvention) -> ValueId {
        let index = u32::try_from(self.params.len())
            .unwrap_or_else(|_| panic!("parameter count exceeds u32::MAX"));
        let value = self.new_value(ty, ValueDef::Param(index));
        self.params.push(Param {
            value,
            ty,
            convention,
        });
        value
    }

    /// The function's parameters, in declaration order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    // ── Blocks ──────────────────────────────────────────────────

    /// Append a new empty block.
    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId::new(
            u32::try_from(self.blocks.len())
                .unwrap_or_else(|_| panic!("block count exceeds u32::MAX")),
        );
        self.blocks.push(Block {
            id,
            params: Vec::new(),
            insts: Vec::new(),
        });
        id
    }

    /// Add a parameter to a block. Returns its value.
    pub fn add_block_param(&mut self, block: BlockId, ty: TypeId) -> ValueId {
        let index = u32::try_from(self.block(block).params.len())
            .unwrap_or_else(|_| panic!("block parameter count exceeds u32::MAX"));
        let value = self.new_value(ty, ValueDef::BlockParam { block, index });
        self.block_mut(block).params.push(value);
        value
    }

    /// Look up a block.
    pub fn block(&self, id: BlockId) -> &Block {
        self.blocks
            .get(id.index())
            .unwrap_or_else(|| panic!("BlockId {} out of bounds", id.raw()))
    }

    /// All block IDs, in layout order. The first block is the entry.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..u32::try_from(self.blocks.len()).unwrap_or_else(|_| panic!("block count exceeds u32::MAX")))
            .map(BlockId::new)
    }

    /// Number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// The block's terminator, if the block is complete.
    pub fn terminator(&self, block: BlockId) -> Option<InstId> {
        let last = *self.block(block).insts.last()?;
        self.kind(last).is_terminator().then_some(last)
    }

    // ── Instruction construction ────────────────────────────────

    /// Append an instruction to a block. Creates and returns the
    /// instruction; a result value is allocated for result-producing
    /// kinds.
    pub fn append(&mut self, block: BlockId, kind: InstKind) -> InstId {
        debug_assert!(
            self.terminator(block).is_none(),
            "appending to a terminated block"
        );
        let inst = self.new_inst(block, kind);
        self.block_mut(block).insts.push(inst);
        inst
    }

    /// Insert an instruction immediately before `anchor`.
    pub fn insert_before(&mut self, anchor: InstId, kind: InstKind) -> InstId {
        let block = self.block_of(anchor);
        let pos = self.position(anchor);
        let inst = self.new_inst(block, kind);
        self.block_mut(block).insts.insert(pos, inst);
        inst
    }

    /// Insert an instruction immediately after `anchor`.
    ///
    /// # Panics
    ///
    /// Debug-panics if `anchor` is a terminator — nothing can execute
    /// after one.
    pub fn insert_after(&mut self, anchor: InstId, kind: InstKind) -> InstId {
        debug_assert!(
            !self.kind(anchor).is_terminator(),
            "inserting after a terminator"
        );
        let block = self.block_of(anchor);
        let pos = self.position(anchor);
        let inst = self.new_inst(block, kind);
        self.block_mut(block).insts.insert(pos + 1, inst);
        inst
    }

    /// Insert an instruction at the head of a block.
    pub fn insert_at_block_start(&mut self, block: BlockId, kind: InstKind) -> InstId {
        let inst = self.new_inst(block, kind);
        self.block_mut(block).insts.insert(0, inst);
        inst
    }

    /// Move an existing instruction to immediately after `anchor`
    /// (possibly in another block).
    pub fn move_after(&mut self, inst: InstId, anchor: InstId) {
        debug_assert!(
            !self.kind(anchor).is_terminator(),
            "moving after a terminator"
        );
        let old_block = self.block_of(inst);
        let old_pos = self.position(inst);
        self.block_mut(old_block).insts.remove(old_pos);

        let new_block = self.block_of(anchor);
        let anchor_pos = self.position(anchor);
        self.block_mut(new_block).insts.insert(anchor_pos + 1, inst);
        self.inst_mut(inst).block = new_block;
    }

    /// Erase an instruction: remove it from its block and tombstone the
    /// arena slot. The ID stays valid but
    /// [`is_erased`](Self::is_erased) becomes `true`.
    ///
    /// # Panics
    ///
    /// Debug-panics if the instruction's result still has uses.
    pub fn erase(&mut self, inst: InstId) {
        debug_assert!(!self.is_erased(inst), "double erase of {inst:?}");
        if let Some(result) = self.result(inst) {
            debug_assert!(
                !self.has_uses(result),
                "erasing {inst:?} whose result still has uses"
            );
        }
        let block = self.block_of(inst);
        let pos = self.position(inst);
        self.block_mut(block).insts.remove(pos);
        self.inst_mut(inst).erased = true;
    }

    /// Whether an instruction has been erased.
    pub fn is_erased(&self, inst: InstId) -> bool {
        self.inst(inst).erased
    }

    // ── Instruction queries ─────────────────────────────────────

    /// The instruction's kind.
    pub fn kind(&self, inst: InstId) -> &InstKind {
        &self.inst(inst).kind
    }

    /// Mutable access to the instruction's kind, for flag flips and
    /// operand redirection.
    pub fn kind_mut(&mut self, inst: InstId) -> &mut InstKind {
        &mut self.inst_mut(inst).kind
    }

    /// The block containing this instruction.
    pub fn block_of(&self, inst: InstId) -> BlockId {
        self.inst(inst).block
    }

    /// The instruction's index within its block.
    ///
    /// # Panics
    ///
    /// Panics if the instruction was erased.
    pub fn position(&self, inst: InstId) -> usize {
        let block = self.block_of(inst);
        self.block(block)
            .insts
            .iter()
            .position(|&i| i == inst)
            .unwrap_or_else(|| panic!("{inst:?} not in its block (erased?)"))
    }

    /// The instruction's result value, if its kind produces one.
    pub fn result(&self, inst: InstId) -> Option<ValueId> {
        self.inst(inst).result
    }

    /// Successor blocks of a block's terminator.
    pub fn successors(&self, block: BlockId) -> SmallVec<[BlockId; 2]> {
        match self.terminator(block) {
            Some(term) => self.kind(term).successors(),
            None => SmallVec::new(),
        }
    }

    // ── Values and uses ─────────────────────────────────────────

    /// The type of a value. For addresses this is the pointee type.
    pub fn value_type(&self, value: ValueId) -> TypeId {
        self.value(value).ty
    }

    /// Where the value is defined.
    pub fn def_of(&self, value: ValueId) -> ValueDef {
        self.value(value).def
    }

    /// The instruction defining this value, or `None` for parameters.
    pub fn defining_inst(&self, value: ValueId) -> Option<InstId> {
        match self.def_of(value) {
            ValueDef::Result(inst) => Some(inst),
            ValueDef::Param(_) | ValueDef::BlockParam { .. } => None,
        }
    }

    /// All live instructions using `value`, in program order (block
    /// layout order, then position). An instruction appears once even
    /// if several of its operand slots hold `value`.
    pub fn uses_of(&self, value: ValueId) -> Vec<InstId> {
        let mut uses = Vec::new();
        for block in &self.blocks {
            for &inst in &block.insts {
                if self.kind(inst).operands().contains(&value) {
                    uses.push(inst);
                }
            }
        }
        uses
    }

    /// Whether any live instruction uses `value`.
    pub fn has_uses(&self, value: ValueId) -> bool {
        self.blocks.iter().any(|block| {
            block
                .insts
                .iter()
                .any(|&inst| self.kind(inst).operands().contains(&value))
        })
    }

    /// Redirect every operand slot of `inst` holding `old` to `new`.
    pub fn substitute_in(&mut self, inst: InstId, old: ValueId, new: ValueId) {
        self.kind_mut(inst).substitute_value(old, new);
    }

    /// Redirect every use of `old` in the function to `new`.
    pub fn replace_all_uses(&mut self, old: ValueId, new: ValueId) {
        let uses = self.uses_of(old);
        for inst in uses {
            self.substitute_in(inst, old, new);
        }
    }

    // ── Internals ───────────────────────────────────────────────

    fn new_value(&mut self, ty: TypeId, def: ValueDef) -> ValueId {
        let id = ValueId::new(
            u32::try_from(self.values.len())
                .unwrap_or_else(|_| panic!("value count exceeds u32::MAX")),
        );
        self.values.push(ValueData { ty, def });
        id
    }

    fn new_inst(&mut self, block: BlockId, kind: InstKind) -> InstId {
        let id = InstId::new(
            u32::try_from(self.insts.len())
                .unwrap_or_else(|_| panic!("instruction count exceeds u32::MAX")),
        );
        let result_ty = self.derived_result_type(&kind);
        self.insts.push(InstData {
            kind,
            block,
            result: None,
            erased: false,
        });
        if let Some(ty) = result_ty {
            let result = self.new_value(ty, ValueDef::Result(id));
            self.inst_mut(id).result = Some(result);
        }
        id
    }

    /// Result type of a kind, or `None` for result-less kinds.
    ///
    /// Forwarding kinds (loads, borrows, access scopes, value copies,
    /// dependence markers) derive the type from their operand; kinds
    /// whose result type is not derivable carry it explicitly.
    fn derived_result_type(&self, kind: &InstKind) -> Option<TypeId> {
        match kind {
            InstKind::AllocStack { ty, .. } => Some(*ty),

            InstKind::Load { addr, .. }
            | InstKind::LoadBorrow { addr }
            | InstKind::BeginAccess { addr, .. } => Some(self.value_type(*addr)),

            InstKind::CopyValue { value } | InstKind::MarkDependence { value, .. } => {
                Some(self.value_type(*value))
            }

            InstKind::StructElementAddr { ty, .. }
            | InstKind::TupleElementAddr { ty, .. }
            | InstKind::UncheckedAddrCast { ty, .. }
            | InstKind::UncheckedTakeEnumDataAddr { ty, .. }
            | InstKind::OpenExistentialAddr { ty, .. }
            | InstKind::Apply { ty, .. }
            | InstKind::PartialApply { ty, .. } => Some(*ty),

            InstKind::BeginApply { .. } => Some(TypeId::TOKEN),

            InstKind::DeallocStack { .. }
            | InstKind::CopyAddr { .. }
            | InstKind::Store { .. }
            | InstKind::EndBorrow { .. }
            | InstKind::EndAccess { .. }
            | InstKind::BeginUnpairedAccess { .. }
            | InstKind::DestroyAddr { .. }
            | InstKind::DestroyValue { .. }
            | InstKind::FixLifetime { .. }
            | InstKind::EndApply { .. }
            | InstKind::AbortApply { .. }
            | InstKind::Return { .. }
            | InstKind::Br { .. }
            | InstKind::CondBr { .. }
            | InstKind::TryApply { .. }
            | InstKind::Yield { .. }
            | InstKind::Unreachable => None,
        }
    }

    fn block_mut(&mut self, id: BlockId) -> &mut Block {
        let len = self.blocks.len();
        self.blocks
            .get_mut(id.index())
            .unwrap_or_else(|| panic!("BlockId {} out of bounds (have {len})", id.raw()))
    }

    fn inst(&self, id: InstId) -> &InstData {
        self.insts
            .get(id.index())
            .unwrap_or_else(|| panic!("InstId {} out of bounds", id.raw()))
    }

    fn inst_mut(&mut self, id: InstId) -> &mut InstData {
        let len = self.insts.len();
        self.insts
            .get_mut(id.index())
            .unwrap_or_else(|| panic!("InstId {} out of bounds (have {len})", id.raw()))
    }

    fn value(&self, id: ValueId) -> &ValueData {
        self.values
            .get(id.index())
            .unwrap_or_else(|| panic!("ValueId {} out of bounds", id.raw()))
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

//! Shared test utilities for the optimizer passes.
//!
//! Factory functions for the IR shapes the temporary-elimination tests
//! build over and over: a function with an address parameter, a stack
//! slot, an initializing copy or store, reads, and teardown. Only
//! compiled in test builds.

use vela_ir::{
    BlockId, Function, InstId, InstKind, LoadQualifier, Name, ParamConvention, StoreQualifier,
    TypeId, ValueId,
};

/// A function under linear ownership with one block.
pub(crate) fn linear_func() -> (Function, BlockId) {
    let mut func = Function::new(Name::from_raw(1), true);
    let bb = func.add_block();
    (func, bb)
}

/// A function outside linear ownership with one block.
pub(crate) fn nonlinear_func() -> (Function, BlockId) {
    let mut func = Function::new(Name::from_raw(1), false);
    let bb = func.add_block();
    (func, bb)
}

/// Add a guaranteed address parameter of object type.
pub(crate) fn guaranteed_param(func: &mut Function) -> ValueId {
    func.add_param(TypeId::OBJECT, ParamConvention::Guaranteed)
}

/// Add an owned address parameter of object type.
pub(crate) fn owned_param(func: &mut Function) -> ValueId {
    func.add_param(TypeId::OBJECT, ParamConvention::Owned)
}

/// Append `alloc_stack` for an object-typed, non-lexical slot.
pub(crate) fn alloc_temp(func: &mut Function, bb: BlockId) -> (InstId, ValueId) {
    alloc_temp_ty(func, bb, TypeId::OBJECT)
}

/// Append `alloc_stack` for a non-lexical slot of the given type.
pub(crate) fn alloc_temp_ty(func: &mut Function, bb: BlockId, ty: TypeId) -> (InstId, ValueId) {
    let alloc = func.append(
        bb,
        InstKind::AllocStack {
            ty,
            lexical: false,
            dynamic_lifetime: false,
        },
    );
    let addr = func.result(alloc).unwrap_or_else(|| panic!("alloc_stack has a result"));
    (alloc, addr)
}

/// Append `copy_addr src to [init] dest`.
pub(crate) fn copy_init(func: &mut Function, bb: BlockId, src: ValueId, dest: ValueId) -> InstId {
    func.append(
        bb,
        InstKind::CopyAddr {
            src,
            dest,
            take_src: false,
            init_dest: true,
        },
    )
}

/// Append `copy_addr [take] src to [init] dest`.
pub(crate) fn copy_take_init(
    func: &mut Function,
    bb: BlockId,
    src: ValueId,
    dest: ValueId,
) -> InstId {
    func.append(
        bb,
        InstKind::CopyAddr {
            src,
            dest,
            take_src: true,
            init_dest: true,
        },
    )
}

/// Append `store value to [init] dest`.
pub(crate) fn store_init(func: &mut Function, bb: BlockId, value: ValueId, dest: ValueId) -> InstId {
    func.append(
        bb,
        InstKind::Store {
            value,
            dest,
            qualifier: StoreQualifier::Init,
        },
    )
}

/// Append `load [copy] addr`, returning the load and its result.
pub(crate) fn load_copy(func: &mut Function, bb: BlockId, addr: ValueId) -> (InstId, ValueId) {
    let load = func.append(
        bb,
        InstKind::Load {
            addr,
            qualifier: LoadQualifier::Copy,
        },
    );
    let value = func.result(load).unwrap_or_else(|| panic!("load has a result"));
    (load, value)
}

/// Append `load [take] addr`, returning the load and its result.
pub(crate) fn load_take(func: &mut Function, bb: BlockId, addr: ValueId) -> (InstId, ValueId) {
    let load = func.append(
        bb,
        InstKind::Load {
            addr,
            qualifier: LoadQualifier::Take,
        },
    );
    let value = func.result(load).unwrap_or_else(|| panic!("load has a result"));
    (load, value)
}

/// Append `destroy_addr addr`.
pub(crate) fn destroy_addr(func: &mut Function, bb: BlockId, addr: ValueId) -> InstId {
    func.append(bb, InstKind::DestroyAddr { addr })
}

/// Append `dealloc_stack addr`.
pub(crate) fn dealloc(func: &mut Function, bb: BlockId, addr: ValueId) -> InstId {
    func.append(bb, InstKind::DeallocStack { addr })
}

/// Append an `apply` reading `arg` under the guaranteed convention.
pub(crate) fn apply_guaranteed(func: &mut Function, bb: BlockId, arg: ValueId) -> InstId {
    func.append(
        bb,
        InstKind::Apply {
            callee: Name::from_raw(100),
            args: vec![arg],
            conventions: vec![ParamConvention::Guaranteed],
            ty: TypeId::INT,
        },
    )
}

/// Append an `apply` consuming `arg` under the owned convention.
pub(crate) fn apply_owned(func: &mut Function, bb: BlockId, arg: ValueId) -> InstId {
    func.append(
        bb,
        InstKind::Apply {
            callee: Name::from_raw(100),
            args: vec![arg],
            conventions: vec![ParamConvention::Owned],
            ty: TypeId::INT,
        },
    )
}

/// Append an `apply` mutating `arg` under the inout convention.
pub(crate) fn apply_inout(func: &mut Function, bb: BlockId, arg: ValueId) -> InstId {
    func.append(
        bb,
        InstKind::Apply {
            callee: Name::from_raw(100),
            args: vec![arg],
            conventions: vec![ParamConvention::Inout],
            ty: TypeId::INT,
        },
    )
}

/// Append `return`.
pub(crate) fn ret(func: &mut Function, bb: BlockId) -> InstId {
    func.append(bb, InstKind::Return { value: None })
}

/// Count live instructions matching `pred` across the function.
pub(crate) fn count_matching(func: &Function, pred: impl Fn(&InstKind) -> bool) -> usize {
    func.block_ids()
        .flat_map(|bb| func.block(bb).insts.clone())
        .filter(|&inst| pred(func.kind(inst)))
        .count()
}

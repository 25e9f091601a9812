use pretty_assertions::assert_eq;
use vela_ir::{AccessKind, InstKind, LoadQualifier, TypeId, TypePool};

use crate::alias::AccessPathAliasing;
use crate::test_helpers::{
    alloc_temp, alloc_temp_ty, apply_guaranteed, apply_inout, copy_init, copy_take_init,
    count_matching, dealloc, destroy_addr, guaranteed_param, linear_func, load_copy, load_take,
    owned_param, ret, store_init,
};

use super::*;

// ── Copy elimination scenarios ──────────────────────────────────────

/// `temp = alloc; copy src → temp [init]; v = load temp; destroy temp`
/// becomes `v = load src` with the slot and its teardown removed.
#[test]
fn copy_into_temporary_is_forwarded_to_the_source() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);
    let (_, temp) = alloc_temp(&mut func, bb);
    copy_init(&mut func, bb, src, temp);
    let (load, v) = load_copy(&mut func, bb, temp);
    func.append(bb, InstKind::DestroyValue { value: v });
    destroy_addr(&mut func, bb, temp);
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.copies_eliminated, 1);
    assert_eq!(stats.stores_eliminated, 0);
    assert!(matches!(
        func.kind(load),
        InstKind::Load { addr, .. } if *addr == src
    ));
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::AllocStack { .. })), 0);
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::CopyAddr { .. })), 0);
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::DestroyAddr { .. })), 0);
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::DeallocStack { .. })), 0);
}

/// A taking copy consumes the source, so the rewrite must synthesize
/// `destroy_addr src` right after the last read.
#[test]
fn taking_copy_gets_a_compensating_source_destroy() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = owned_param(&mut func);
    let (_, temp) = alloc_temp(&mut func, bb);
    copy_take_init(&mut func, bb, src, temp);
    let (load, v) = load_copy(&mut func, bb, temp);
    func.append(bb, InstKind::DestroyValue { value: v });
    destroy_addr(&mut func, bb, temp);
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.copies_eliminated, 1);
    // Exactly one destroy of the source, immediately after the load.
    let destroys: Vec<_> = func
        .block(bb)
        .insts
        .iter()
        .filter(|&&i| matches!(func.kind(i), InstKind::DestroyAddr { addr } if *addr == src))
        .collect();
    assert_eq!(destroys.len(), 1);
    let after_load = func.block(bb).insts[func.position(load) + 1];
    assert!(matches!(
        func.kind(after_load),
        InstKind::DestroyAddr { addr } if *addr == src
    ));
}

/// When the boundary itself takes the whole temporary, that take is the
/// final consumption of the source and no destroy is synthesized.
#[test]
fn taking_copy_with_take_load_consumes_the_source_directly() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = owned_param(&mut func);
    let (_, temp) = alloc_temp(&mut func, bb);
    copy_take_init(&mut func, bb, src, temp);
    let (load, v) = load_take(&mut func, bb, temp);
    func.append(bb, InstKind::DestroyValue { value: v });
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.copies_eliminated, 1);
    assert!(matches!(
        func.kind(load),
        InstKind::Load { addr, qualifier: LoadQualifier::Take } if *addr == src
    ));
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::DestroyAddr { .. })), 0);
}

/// `begin_access [Read] src; copy scope → temp; end_access; use temp`
/// relocates the end_access past the (rewritten) use.
#[test]
fn source_access_scope_is_extended_over_the_uses() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);
    let begin = func.append(
        bb,
        InstKind::BeginAccess {
            addr: src,
            kind: AccessKind::Read,
        },
    );
    let scope = func.result(begin).unwrap();
    let (_, temp) = alloc_temp(&mut func, bb);
    copy_init(&mut func, bb, scope, temp);
    let end = func.append(bb, InstKind::EndAccess { scope });
    let call = apply_guaranteed(&mut func, bb, temp);
    destroy_addr(&mut func, bb, temp);
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.copies_eliminated, 1);
    // The use now reads through the scope, and the scope end follows it.
    assert!(matches!(
        func.kind(call),
        InstKind::Apply { args, .. } if args.as_slice() == [scope].as_slice()
    ));
    assert!(!func.is_erased(begin));
    assert!(func.position(end) > func.position(call));
}

/// Relocation that would cross a scope boundary disqualifies the whole
/// candidate; the IR is untouched.
#[test]
fn scope_extension_failure_leaves_the_copy_alone() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);
    let other = owned_param(&mut func);
    let begin = func.append(
        bb,
        InstKind::BeginAccess {
            addr: src,
            kind: AccessKind::Read,
        },
    );
    let scope = func.result(begin).unwrap();
    let (_, temp) = alloc_temp(&mut func, bb);
    copy_init(&mut func, bb, scope, temp);
    let end = func.append(bb, InstKind::EndAccess { scope });
    // A nested scope opens between the end and the use.
    let begin_other = func.append(
        bb,
        InstKind::BeginAccess {
            addr: other,
            kind: AccessKind::Read,
        },
    );
    let other_scope = func.result(begin_other).unwrap();
    let call = apply_guaranteed(&mut func, bb, temp);
    func.append(bb, InstKind::EndAccess { scope: other_scope });
    destroy_addr(&mut func, bb, temp);
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.copies_eliminated, 0);
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::AllocStack { .. })), 1);
    assert!(matches!(
        func.kind(call),
        InstKind::Apply { args, .. } if args.as_slice() == [temp].as_slice()
    ));
    assert!(func.position(end) < func.position(call));
}

/// A potential write to the source inside the temporary's lifetime
/// blocks the elimination entirely.
#[test]
fn source_write_within_the_lifetime_is_conservative() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = owned_param(&mut func);
    let (_, temp) = alloc_temp(&mut func, bb);
    copy_init(&mut func, bb, src, temp);
    apply_inout(&mut func, bb, src);
    let (load, v) = load_copy(&mut func, bb, temp);
    func.append(bb, InstKind::DestroyValue { value: v });
    destroy_addr(&mut func, bb, temp);
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert!(!stats.changed());
    assert!(matches!(
        func.kind(load),
        InstKind::Load { addr, .. } if *addr == temp
    ));
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::AllocStack { .. })), 1);
}

// ── Store elimination scenarios ─────────────────────────────────────

/// `temp = alloc; store src → temp [init]; v = load [take] temp;
/// dealloc temp` forwards the stored value with no duplication.
#[test]
fn store_into_temporary_forwards_the_value() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);
    let (_, v) = load_copy(&mut func, bb, src);
    let (_, temp) = alloc_temp(&mut func, bb);
    store_init(&mut func, bb, v, temp);
    let (_, u) = load_take(&mut func, bb, temp);
    let consume = func.append(bb, InstKind::DestroyValue { value: u });
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.stores_eliminated, 1);
    assert_eq!(stats.copies_eliminated, 0);
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::CopyValue { .. })), 0);
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::AllocStack { .. })), 0);
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::Store { .. })), 0);
    assert!(matches!(
        func.kind(consume),
        InstKind::DestroyValue { value } if *value == v
    ));
}

/// Store-eliminated enum slots get their value lifetimes completed.
#[test]
fn eliminated_enum_slot_keeps_a_complete_lifetime() {
    let mut pool = TypePool::new();
    let opt = pool.optional_type(TypeId::OBJECT);

    let (mut func, bb) = linear_func();
    let src = func.add_param(opt, vela_ir::ParamConvention::Guaranteed);
    let (_, v) = load_copy(&mut func, bb, src);
    let (_, temp) = alloc_temp_ty(&mut func, bb, opt);
    store_init(&mut func, bb, v, temp);
    // The only read does not consume; the slot destroy carried the
    // value's end of life.
    func.append(bb, InstKind::FixLifetime { value: temp });
    destroy_addr(&mut func, bb, temp);
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.stores_eliminated, 1);
    // The slot's destroy became exactly one value destroy; lifetime
    // completion found it already balanced and added nothing.
    assert_eq!(
        count_matching(&func, |k| matches!(k, InstKind::DestroyValue { value } if *value == v)),
        1
    );
}

// ── Driver behavior ─────────────────────────────────────────────────

/// Re-running the pass on its own output changes nothing.
#[test]
fn the_pass_is_idempotent() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);
    let (_, temp) = alloc_temp(&mut func, bb);
    copy_init(&mut func, bb, src, temp);
    let (_, v) = load_copy(&mut func, bb, temp);
    func.append(bb, InstKind::DestroyValue { value: v });
    destroy_addr(&mut func, bb, temp);
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let first = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);
    assert!(first.changed());

    let before: Vec<Vec<vela_ir::InstId>> = func
        .block_ids()
        .map(|b| func.block(b).insts.clone())
        .collect();
    let second = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);
    let after: Vec<Vec<vela_ir::InstId>> = func
        .block_ids()
        .map(|b| func.block(b).insts.clone())
        .collect();

    assert!(!second.changed());
    assert_eq!(before, after);
}

/// Two independent temporaries in one block are both eliminated in a
/// single run.
#[test]
fn multiple_candidates_in_one_scan() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);

    let (_, temp_a) = alloc_temp(&mut func, bb);
    copy_init(&mut func, bb, src, temp_a);
    let (load_a, va) = load_copy(&mut func, bb, temp_a);
    func.append(bb, InstKind::DestroyValue { value: va });
    destroy_addr(&mut func, bb, temp_a);
    dealloc(&mut func, bb, temp_a);

    let (_, temp_b) = alloc_temp(&mut func, bb);
    copy_init(&mut func, bb, src, temp_b);
    let (load_b, vb) = load_copy(&mut func, bb, temp_b);
    func.append(bb, InstKind::DestroyValue { value: vb });
    destroy_addr(&mut func, bb, temp_b);
    dealloc(&mut func, bb, temp_b);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.copies_eliminated, 2);
    assert!(matches!(func.kind(load_a), InstKind::Load { addr, .. } if *addr == src));
    assert!(matches!(func.kind(load_b), InstKind::Load { addr, .. } if *addr == src));
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::AllocStack { .. })), 0);
}

/// The dead-copy sweep also simplifies an access scope that existed
/// only to feed the eliminated copy.
#[test]
fn scope_feeding_only_the_copy_is_cleaned_up() {
    let pool = TypePool::new();
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);
    let begin = func.append(
        bb,
        InstKind::BeginAccess {
            addr: src,
            kind: AccessKind::Read,
        },
    );
    let scope = func.result(begin).unwrap();
    let (_, temp) = alloc_temp(&mut func, bb);
    copy_init(&mut func, bb, scope, temp);
    func.append(bb, InstKind::EndAccess { scope });
    // No reads at all: the temporary is dead on arrival.
    destroy_addr(&mut func, bb, temp);
    dealloc(&mut func, bb, temp);
    ret(&mut func, bb);

    let stats = eliminate_temporaries(&mut func, &pool, &AccessPathAliasing);

    assert_eq!(stats.copies_eliminated, 1);
    // The scope had no user left after the copy was erased.
    assert!(func.is_erased(begin));
    assert_eq!(count_matching(&func, |k| matches!(k, InstKind::EndAccess { .. })), 0);
}

use rustc_hash::FxHashSet;
use vela_ir::InstKind;

use crate::test_helpers::{
    alloc_temp, copy_init, destroy_addr, guaranteed_param, linear_func, load_copy, ret,
};

use super::*;

#[test]
fn no_users_ends_right_after_definition() {
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);
    let (_, temp) = alloc_temp(&mut func, bb);
    let copy = copy_init(&mut func, bb, src, temp);
    ret(&mut func, bb);

    let frontier =
        compute_frontier(&func, bb, func.position(copy), &FxHashSet::default()).unwrap();
    assert_eq!(
        frontier,
        vec![FrontierPoint {
            block: bb,
            pos: func.position(copy) + 1
        }]
    );
}

#[test]
fn single_block_ends_after_last_user() {
    let (mut func, bb) = linear_func();
    let src = guaranteed_param(&mut func);
    let (_, temp) = alloc_temp(&mut func, bb);
    let copy = copy_init(&mut func, bb, src, temp);
    let (load, _) = load_copy(&mut func, bb, temp);
    let destroy = destroy_addr(&mut func, bb, temp);
    ret(&mut func, bb);

    let users: FxHashSet<_> = [load, destroy].into_iter().collect();
    let frontier = compute_frontier(&func, bb, func.position(copy), &users).unwrap();
    assert_eq!(
        frontier,
        vec![FrontierPoint {
            block: bb,
            pos: func.position(destroy) + 1
        }]
    );
}

#[test]
fn branchy_lifetime_ends_in_each_arm() {
    // bb0: copy; cond_br bb1, bb2
    // bb1: destroy; return
    // bb2: destroy; return
    let (mut func, bb0) = linear_func();
    let src = guaranteed_param(&mut func);
    let cond = func.add_param(vela_ir::TypeId::INT, vela_ir::ParamConvention::Guaranteed);
    let (_, temp) = alloc_temp(&mut func, bb0);
    let copy = copy_init(&mut func, bb0, src, temp);
    let bb1 = func.add_block();
    let bb2 = func.add_block();
    func.append(
        bb0,
        InstKind::CondBr {
            cond,
            then_target: bb1,
            else_target: bb2,
        },
    );
    let d1 = destroy_addr(&mut func, bb1, temp);
    ret(&mut func, bb1);
    let d2 = destroy_addr(&mut func, bb2, temp);
    ret(&mut func, bb2);

    let users: FxHashSet<_> = [d1, d2].into_iter().collect();
    let mut frontier = compute_frontier(&func, bb0, func.position(copy), &users).unwrap();
    frontier.sort_by_key(|p| p.block.index());
    assert_eq!(
        frontier,
        vec![
            FrontierPoint { block: bb1, pos: 1 },
            FrontierPoint { block: bb2, pos: 1 },
        ]
    );
}

#[test]
fn lifetime_dying_on_an_edge_lands_at_block_head() {
    // bb0: copy; cond_br bb1, bb2
    // bb1: destroy; return       <- user here
    // bb2: return                <- no user; frontier at head
    let (mut func, bb0) = linear_func();
    let src = guaranteed_param(&mut func);
    let cond = func.add_param(vela_ir::TypeId::INT, vela_ir::ParamConvention::Guaranteed);
    let (_, temp) = alloc_temp(&mut func, bb0);
    let copy = copy_init(&mut func, bb0, src, temp);
    let bb1 = func.add_block();
    let bb2 = func.add_block();
    func.append(
        bb0,
        InstKind::CondBr {
            cond,
            then_target: bb1,
            else_target: bb2,
        },
    );
    let d1 = destroy_addr(&mut func, bb1, temp);
    ret(&mut func, bb1);
    ret(&mut func, bb2);

    let users: FxHashSet<_> = [d1].into_iter().collect();
    let mut frontier = compute_frontier(&func, bb0, func.position(copy), &users).unwrap();
    frontier.sort_by_key(|p| p.block.index());
    assert_eq!(
        frontier,
        vec![
            FrontierPoint { block: bb1, pos: 1 },
            FrontierPoint { block: bb2, pos: 0 },
        ]
    );
}

#[test]
fn terminator_user_has_no_frontier() {
    // The lifetime would have to end past the terminator; that needs
    // CFG surgery this computation refuses to do.
    let (mut func, bb0) = linear_func();
    let src = guaranteed_param(&mut func);
    let (_, temp) = alloc_temp(&mut func, bb0);
    let copy = copy_init(&mut func, bb0, src, temp);
    let term = func.append(bb0, InstKind::Yield {
        values: vec![temp],
        conventions: vec![vela_ir::ParamConvention::Guaranteed],
        resume: bb0,
        unwind: bb0,
    });

    let users: FxHashSet<_> = [term].into_iter().collect();
    assert_eq!(
        compute_frontier(&func, bb0, func.position(copy), &users),
        None
    );
}

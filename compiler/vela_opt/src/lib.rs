//! IR optimizations for the Vela compiler.
//!
//! This crate provides:
//!
//! - **Temporary elimination** ([`eliminate_temporaries`]) — a peephole
//!   pass removing short-lived stack temporaries that lowering emits to
//!   satisfy calling-convention and initialization rules. A temporary
//!   initialized once by a copy (or store) whose source is provably
//!   unmodified for the temporary's useful lifetime is removed and its
//!   reads redirected to the source.
//!
//! - **Alias analysis** ([`AliasOracle`], [`AccessPathAliasing`]) — the
//!   conservative memory-effect queries the safety checks are written
//!   against, implemented over access-path resolution.
//!
//! - **Lifetime utilities** ([`complete_lifetime`],
//!   [`simplify_and_erase`], [`frontier`]) — value-lifetime frontier
//!   computation, destroy insertion for lifetime completeness, and
//!   dead-code cleanup after rewrites.
//!
//! # Design
//!
//! The pass is a single forward scan per function with no fixpoint:
//! rewriting exposes further candidates only to a later invocation,
//! which the caller schedules. Failure is disqualification — the
//! attempt is abandoned and the IR left unchanged for that candidate —
//! never an error that propagates. Analyses are passed as explicit
//! read-only references; nothing here holds global state.

pub mod access_path;
pub mod alias;
mod collect;
pub mod complete;
mod copy_elim;
mod destroy;
pub mod frontier;
mod graph;
mod modify;
pub mod pass;
mod scopes;
pub mod simplify;
mod store_elim;

#[cfg(test)]
mod test_helpers;

pub use access_path::{resolve_access_path, AccessBase, AccessPath, ProjectionStep};
pub use alias::{AccessPathAliasing, AliasOracle};
pub use complete::complete_lifetime;
pub use pass::{eliminate_temporaries, TempElimStats};
pub use simplify::simplify_and_erase;

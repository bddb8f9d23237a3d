//! # symvs: symbolic execution for message-passing state machines
//!
//! **`symvs`** is the symbolic execution core of a systematic tester for
//! message-passing state-machine programs. Instead of running one concrete
//! execution at a time, it represents *many* concrete runs simultaneously:
//! every mutable value (current state, sender, payload, scheduling choice) is
//! a **value summary**: a partition of the universe of tracked runs into
//! disjoint guarded cases, each carrying one concrete value. A single symbolic
//! step advances a whole batch of runs that agree up to that point, splitting
//! lazily only where behavior diverges.
//!
//! ## Key pieces
//!
//! - **Guards are canonical.** A [`Guard`][crate::guard::Guard] is a boolean
//!   predicate over the choice bits made so far, backed by a reduced ordered
//!   BDD with complement edges ([`bdd`]). Two guards are equal exactly when
//!   they denote the same runs, and unsatisfiability is decided exactly.
//! - **Summaries are immutable.** [`PrimitiveVS`][crate::summary::PrimitiveVS]
//!   (scalars and handles), [`ListVS`][crate::list::ListVS] (symbolically
//!   indexed sequences), and [`UnionVS`][crate::union::UnionVS] (tagged
//!   payloads) all allocate on every operation, so a summary can be shared
//!   across branches freely.
//! - **Dispatch never loses runs.** [`State`][crate::state::State] routes a
//!   guarded message to per-event handlers and reports any uncovered runs as
//!   an unhandled-event bug carrying their exact guard ([`error`]).
//! - **Schedules remember the search tree.** A
//!   [`Schedule`][crate::schedule::Schedule] records, per depth, the decision
//!   being replayed and the untried alternatives, plus a registry of created
//!   machines indexed by symbolic integers; it can be narrowed to a
//!   sub-universe or projected onto a single concrete counterexample path.
//!
//! ## Basic usage
//!
//! ```rust
//! use symvs::guard::GuardCtx;
//! use symvs::schedule::Schedule;
//! use symvs::summary::PrimitiveVS;
//!
//! let ctx = GuardCtx::new();
//! let mut schedule = Schedule::new(&ctx);
//!
//! // A two-way nondeterministic boolean choice at depth 0: explore `true`
//! // now, queue `false` for a later pass.
//! let parts = ctx.choice_partition(2);
//! schedule.add_repeat_bool(PrimitiveVS::new(true, parts[0].clone()), 0);
//! schedule.add_backtrack_bool(vec![PrimitiveVS::new(false, parts[1].clone())], 0);
//! assert_eq!(schedule.num_backtracks(), 1);
//!
//! // Project onto one concrete path for replay.
//! let single = schedule.single_schedule();
//! assert!(single.repeat_bool(0).guard_for(&false).is_false());
//! ```
//!
//! Everything is single-threaded and cooperative: the "many runs" are
//! simulated through guard partitioning, owned by one search driver, with no
//! locking anywhere.

pub mod bdd;
pub mod error;
pub mod event;
pub mod guard;
pub mod list;
pub mod machine;
pub mod schedule;
pub mod state;
pub mod summary;
pub mod union;

//! Guarded value summaries: disjoint partitions of the run universe.
//!
//! A [`PrimitiveVS`] maps each concrete value to the guard of the runs
//! currently holding that value. Guards of distinct values are pairwise
//! disjoint; the disjunction of all guards is the summary's *universe*.
//! Summaries are immutable: every operation allocates a new value, so a
//! summary can be reused across branches without aliasing.

use std::fmt::Debug;
use std::hash::Hash;

use crate::guard::{Guard, GuardCtx};

/// Concrete values a summary can hold.
pub trait SummaryValue: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> SummaryValue for T {}

/// One case of a summary: `value` holds exactly for the runs in `guard`.
#[derive(Debug, Clone)]
pub struct GuardedValue<T> {
    pub value: T,
    pub guard: Guard,
}

/// Common interface of every summary shape.
pub trait ValueSummary: Clone {
    /// Narrow to the runs in `guard`, dropping cases that become impossible.
    ///
    /// A no-op (up to semantic equality) when `guard` covers the universe.
    fn restrict(&self, guard: &Guard) -> Self;

    /// Union of two summaries, coalescing cases that agree on the value.
    ///
    /// Inputs must already be disjoint where their values differ; this is
    /// checked (loudly) in debug builds, not repaired.
    fn merge(&self, other: &Self) -> Self;

    /// The guard of all runs this summary has an opinion about.
    fn universe(&self) -> Guard;

    /// Replace the summary under `guard`, keeping it unchanged elsewhere.
    fn update(&self, guard: &Guard, other: &Self) -> Self {
        self.restrict(&guard.not()).merge(&other.restrict(guard))
    }
}

/// Summary of a scalar or handle value (machine, boolean, integer, state).
#[derive(Debug, Clone)]
pub struct PrimitiveVS<T: SummaryValue> {
    cases: Vec<GuardedValue<T>>,
    universe: Guard,
}

impl<T: SummaryValue> PrimitiveVS<T> {
    /// The summary with no opinion about any run.
    pub fn empty(ctx: &GuardCtx) -> Self {
        Self { cases: Vec::new(), universe: ctx.ff() }
    }

    /// A single value under `guard`.
    pub fn new(value: T, guard: Guard) -> Self {
        if guard.is_false() {
            Self { cases: Vec::new(), universe: guard }
        } else {
            Self { universe: guard.clone(), cases: vec![GuardedValue { value, guard }] }
        }
    }

    /// The disjoint partition, for iteration. No case has a false guard.
    pub fn guarded_values(&self) -> &[GuardedValue<T>] {
        &self.cases
    }

    /// Guard of the runs holding `value`; false if no run does.
    pub fn guard_for(&self, value: &T) -> Guard {
        self.cases
            .iter()
            .find(|gv| gv.value == *value)
            .map(|gv| gv.guard.clone())
            .unwrap_or_else(|| self.universe.ctx().ff())
    }

    pub fn is_empty_summary(&self) -> bool {
        self.universe.is_false()
    }

    /// Apply `f` to every case, coalescing collisions.
    pub fn map<U: SummaryValue>(&self, f: impl Fn(&T) -> U) -> PrimitiveVS<U> {
        let mut out = PrimitiveVS { cases: Vec::new(), universe: self.universe.ctx().ff() };
        for gv in &self.cases {
            out.push_coalescing(f(&gv.value), gv.guard.clone());
        }
        out
    }

    fn push_coalescing(&mut self, value: T, guard: Guard) {
        if guard.is_false() {
            return;
        }
        self.universe = self.universe.or(&guard);
        if let Some(gv) = self.cases.iter_mut().find(|gv| gv.value == value) {
            gv.guard = gv.guard.or(&guard);
        } else {
            self.cases.push(GuardedValue { value, guard });
        }
    }

    #[cfg(debug_assertions)]
    fn assert_disjoint(&self) {
        for (i, a) in self.cases.iter().enumerate() {
            for b in &self.cases[i + 1..] {
                assert!(
                    a.guard.and(&b.guard).is_false(),
                    "summary invariant violated: overlapping guards for {:?} and {:?}",
                    a.value,
                    b.value
                );
            }
        }
    }
}

impl<T: SummaryValue> ValueSummary for PrimitiveVS<T> {
    fn restrict(&self, guard: &Guard) -> Self {
        let mut cases = Vec::with_capacity(self.cases.len());
        for gv in &self.cases {
            let g = gv.guard.and(guard);
            if !g.is_false() {
                cases.push(GuardedValue { value: gv.value.clone(), guard: g });
            }
        }
        Self { cases, universe: self.universe.and(guard) }
    }

    fn merge(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for gv in &other.cases {
            out.push_coalescing(gv.value.clone(), gv.guard.clone());
        }
        #[cfg(debug_assertions)]
        out.assert_disjoint();
        out
    }

    fn universe(&self) -> Guard {
        self.universe.clone()
    }
}

/// Semantic equality: the same values under the same guards, in any order.
impl<T: SummaryValue> PartialEq for PrimitiveVS<T> {
    fn eq(&self, other: &Self) -> bool {
        self.universe == other.universe
            && self.cases.len() == other.cases.len()
            && self.cases.iter().all(|gv| other.guard_for(&gv.value) == gv.guard)
    }
}

impl<T: SummaryValue> Eq for PrimitiveVS<T> {}

impl PrimitiveVS<bool> {
    /// Partial boolean summary that is `true` exactly under `guard`.
    ///
    /// Runs outside `guard` get no case at all; by convention callers treat
    /// missing runs as "unknown/false".
    pub fn true_under(guard: Guard) -> Self {
        Self::new(true, guard)
    }
}

impl PrimitiveVS<i64> {
    pub fn plus(&self, k: i64) -> Self {
        self.map(|v| v + k)
    }
}

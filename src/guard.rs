//! Path conditions over the scheduler's choice bits.
//!
//! A [`Guard`] is an immutable boolean predicate selecting a subset of the
//! tracked concrete runs. Guards are compared by the runs they denote, not by
//! syntactic form: the underlying diagram is canonical, so [`PartialEq`] is
//! semantic equality and [`Guard::is_false`] decides unsatisfiability exactly.
//!
//! Guards are created by the [`GuardCtx`], which owns the diagram manager and
//! allocates choice bits on demand. A `Guard` is two words (a shared handle and
//! a node reference) and is freely cloned; all combinators allocate new values
//! and never mutate shared state.

use std::cell::Cell;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use log::trace;
use num_bigint::BigUint;

use crate::bdd::{Bdd, Ref};

struct Shared {
    bdd: Bdd,
    bits: Cell<u32>,
}

/// Owner of the choice bits and of the diagram manager behind [`Guard`]s.
///
/// Cloning a `GuardCtx` yields another handle to the same context; guards from
/// different contexts must never be combined.
#[derive(Clone)]
pub struct GuardCtx {
    shared: Rc<Shared>,
}

impl GuardCtx {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(Shared { bdd: Bdd::new(), bits: Cell::new(0) }),
        }
    }

    fn wrap(&self, node: Ref) -> Guard {
        Guard { shared: Rc::clone(&self.shared), node }
    }

    /// The guard of all runs.
    pub fn tt(&self) -> Guard {
        self.wrap(self.shared.bdd.one)
    }

    /// The guard of no runs.
    pub fn ff(&self) -> Guard {
        self.wrap(self.shared.bdd.zero)
    }

    /// Allocate a fresh choice bit.
    pub fn fresh_bit(&self) -> Guard {
        let var = self.shared.bits.get() + 1;
        self.shared.bits.set(var);
        trace!("fresh_bit -> x{}", var);
        self.wrap(self.shared.bdd.mk_var(var))
    }

    /// Number of choice bits allocated so far.
    pub fn num_bits(&self) -> u32 {
        self.shared.bits.get()
    }

    /// Split the universe into `n` pairwise-disjoint guards whose disjunction
    /// is `true`, allocating `n - 1` fresh bits. Empty for `n == 0`.
    ///
    /// The encoding is the usual chain: `b0`, `¬b0 ∧ b1`, ...,
    /// `¬b0 ∧ … ∧ ¬b(n-2)`.
    pub fn choice_partition(&self, n: usize) -> Vec<Guard> {
        if n == 0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(n);
        let mut rest = self.tt();
        for _ in 0..n - 1 {
            let bit = self.fresh_bit();
            out.push(rest.and(&bit));
            rest = rest.and(&bit.not());
        }
        out.push(rest);
        out
    }

    /// Number of concrete runs (assignments to the allocated bits) a guard
    /// denotes. Intended for driver-side progress reporting.
    pub fn count_runs(&self, guard: &Guard) -> BigUint {
        debug_assert!(Rc::ptr_eq(&self.shared, &guard.shared), "guard from a different context");
        self.shared.bdd.sat_count(guard.node, self.shared.bits.get())
    }
}

impl Default for GuardCtx {
    fn default() -> Self {
        GuardCtx::new()
    }
}

impl Debug for GuardCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardCtx")
            .field("bits", &self.shared.bits.get())
            .field("bdd", &self.shared.bdd)
            .finish()
    }
}

/// An immutable boolean predicate over the choice bits made so far.
#[derive(Clone)]
pub struct Guard {
    shared: Rc<Shared>,
    node: Ref,
}

impl Guard {
    fn with(&self, node: Ref) -> Guard {
        Guard { shared: Rc::clone(&self.shared), node }
    }

    fn bdd(&self) -> &Bdd {
        &self.shared.bdd
    }

    fn check_ctx(&self, other: &Guard) {
        debug_assert!(
            Rc::ptr_eq(&self.shared, &other.shared),
            "guards from different contexts combined"
        );
    }

    /// A handle to the context this guard belongs to.
    pub fn ctx(&self) -> GuardCtx {
        GuardCtx { shared: Rc::clone(&self.shared) }
    }

    pub fn and(&self, other: &Guard) -> Guard {
        self.check_ctx(other);
        self.with(self.bdd().apply_and(self.node, other.node))
    }

    pub fn or(&self, other: &Guard) -> Guard {
        self.check_ctx(other);
        self.with(self.bdd().apply_or(self.node, other.node))
    }

    pub fn not(&self) -> Guard {
        self.with(self.bdd().apply_not(self.node))
    }

    /// Whether every run in this guard is also in `other`.
    pub fn implies(&self, other: &Guard) -> bool {
        self.check_ctx(other);
        self.bdd().implies(self.node, other.node)
    }

    /// Exact unsatisfiability test: `true` iff no run satisfies this guard.
    pub fn is_false(&self) -> bool {
        self.bdd().is_zero(self.node)
    }

    pub fn is_true(&self) -> bool {
        self.bdd().is_one(self.node)
    }

    /// Semantic equality: both guards denote the same set of runs.
    pub fn same_runs(&self, other: &Guard) -> bool {
        self == other
    }
}

impl PartialEq for Guard {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared) && self.node == other.node
    }
}

impl Eq for Guard {}

impl Hash for Guard {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guard({})", self.node)
    }
}

impl Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_true() {
            write!(f, "true")
        } else if self.is_false() {
            write!(f, "false")
        } else {
            write!(f, "{}", self.node)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        let ctx = GuardCtx::new();
        assert!(ctx.tt().is_true());
        assert!(ctx.ff().is_false());
        assert_eq!(ctx.tt(), ctx.ff().not());
    }

    #[test]
    fn test_semantic_equality() {
        let ctx = GuardCtx::new();
        let a = ctx.fresh_bit();
        let b = ctx.fresh_bit();

        // Same denoted run-set, different construction order.
        assert_eq!(a.and(&b), b.and(&a));
        assert_eq!(a.or(&a.not()), ctx.tt());
        assert_eq!(a.and(&b).not(), a.not().or(&b.not()));
    }

    #[test]
    fn test_implies() {
        let ctx = GuardCtx::new();
        let a = ctx.fresh_bit();
        let b = ctx.fresh_bit();

        assert!(a.and(&b).implies(&a));
        assert!(!a.implies(&a.and(&b)));
        assert!(ctx.ff().implies(&a));
        assert!(a.implies(&ctx.tt()));
    }

    #[test]
    fn test_choice_partition_disjoint_and_exhaustive() {
        let ctx = GuardCtx::new();
        for n in 0..5 {
            let parts = ctx.choice_partition(n);
            assert_eq!(parts.len(), n);

            for (i, a) in parts.iter().enumerate() {
                if n > 1 {
                    assert!(!a.is_false());
                }
                for b in &parts[i + 1..] {
                    assert!(a.and(b).is_false());
                }
            }

            if n > 0 {
                let all = parts.iter().fold(ctx.ff(), |acc, g| acc.or(g));
                assert!(all.is_true());
            }
        }
    }

    #[test]
    fn test_count_runs() {
        let ctx = GuardCtx::new();
        let parts = ctx.choice_partition(2);
        assert_eq!(ctx.num_bits(), 1);
        assert_eq!(ctx.count_runs(&parts[0]), BigUint::from(1u32));
        assert_eq!(ctx.count_runs(&parts[1]), BigUint::from(1u32));
        assert_eq!(ctx.count_runs(&ctx.tt()), BigUint::from(2u32));
        assert_eq!(ctx.count_runs(&ctx.ff()), BigUint::from(0u32));
    }
}

//! Reduced ordered binary decision diagrams with complement edges.
//!
//! This is the engine behind [`Guard`](crate::guard::Guard). The design is
//! manager-centric: every operation goes through the [`Bdd`] manager, which
//! hash-conses nodes so that each boolean function over the choice bits has
//! exactly one representation. Semantic equality of two functions is therefore
//! a comparison of two [`Ref`]s, and unsatisfiability is a comparison against
//! the `zero` terminal; both tests are exact and O(1).
//!
//! Negation is a complement edge: `-f` flips the sign of the reference without
//! allocating. To keep the representation canonical, the high edge of a stored
//! node is never complemented; [`Bdd::mk_node`] restores this by negating both
//! children and the result.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::ops::Neg;

use log::trace;
use num_bigint::BigUint;

/// A reference to a BDD node. The sign encodes a complement edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(self) -> bool {
        self.0 < 0
    }

    /// Index of the referenced node, ignoring the complement edge.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.index())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    var: u32,
    low: Ref,
    high: Ref,
}

/// The diagram manager: node store, unique table, and operation cache.
pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    ite_cache: RefCell<HashMap<(Ref, Ref, Ref), Ref>>,
    pub one: Ref,
    pub zero: Ref,
}

impl Bdd {
    pub fn new() -> Self {
        // Index 0 is a sentinel so that node indices are never zero;
        // index 1 is the `one` terminal (variable 0).
        let sentinel = Node { var: 0, low: Ref(0), high: Ref(0) };
        let one = Ref::positive(1);
        Self {
            nodes: RefCell::new(vec![sentinel, sentinel]),
            unique: RefCell::new(HashMap::new()),
            ite_cache: RefCell::new(HashMap::new()),
            one,
            zero: -one,
        }
    }

    pub fn is_zero(&self, f: Ref) -> bool {
        f == self.zero
    }
    pub fn is_one(&self, f: Ref) -> bool {
        f == self.one
    }
    pub fn is_terminal(&self, f: Ref) -> bool {
        f.index() == 1
    }

    /// Number of allocated nodes, terminal and sentinel included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Variable of the referenced node (0 for terminals).
    pub fn var(&self, f: Ref) -> u32 {
        self.nodes.borrow()[f.index()].var
    }

    pub fn low_node(&self, f: Ref) -> Ref {
        let low = self.nodes.borrow()[f.index()].low;
        if f.is_negated() {
            -low
        } else {
            low
        }
    }

    pub fn high_node(&self, f: Ref) -> Ref {
        let high = self.nodes.borrow()[f.index()].high;
        if f.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn mk_node(&self, var: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(var, 0, "variable index must be nonzero");

        if low == high {
            return low;
        }

        // Canonicity: the stored high edge is never complemented.
        if high.is_negated() {
            return -self.mk_node(var, -low, -high);
        }

        let node = Node { var, low, high };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::positive(i);
        }
        let i = {
            let mut nodes = self.nodes.borrow_mut();
            let i = nodes.len() as u32;
            nodes.push(node);
            i
        };
        self.unique.borrow_mut().insert(node, i);
        Ref::positive(i)
    }

    pub fn mk_var(&self, var: u32) -> Ref {
        self.mk_node(var, self.zero, self.one)
    }

    /// Cofactors of `f` with respect to `var`, which must be at or above
    /// the top variable of `f`.
    fn top_cofactors(&self, f: Ref, var: u32) -> (Ref, Ref) {
        if self.is_terminal(f) || var < self.var(f) {
            return (f, f);
        }
        debug_assert_eq!(var, self.var(f));
        (self.low_node(f), self.high_node(f))
    }

    /// The universal connective.
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        trace!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Terminal cases.
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Normalize so the cached triple has a regular first argument
        // (ite(~F,G,H) = ite(F,H,G)) and a regular second one
        // (ite(F,~G,H) = ~ite(F,G,~H)).
        let (mut f, mut g, mut h) = (f, g, h);
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let mut negate = false;
        if g.is_negated() {
            negate = true;
            g = -g;
            h = -h;
        }

        let key = (f, g, h);
        if let Some(&res) = self.ite_cache.borrow().get(&key) {
            return if negate { -res } else { res };
        }

        let m = [f, g, h]
            .iter()
            .filter(|r| !self.is_terminal(**r))
            .map(|&r| self.var(r))
            .min()
            .expect("first operand is non-terminal here");

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let low = self.apply_ite(f0, g0, h0);
        let high = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, low, high);

        self.ite_cache.borrow_mut().insert(key, res);
        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.one)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    /// Validity of `f → g`. Exact, thanks to canonicity.
    pub fn implies(&self, f: Ref, g: Ref) -> bool {
        self.apply_imply(f, g) == self.one
    }

    /// Number of satisfying assignments over `num_vars` variables.
    pub fn sat_count(&self, f: Ref, num_vars: u32) -> BigUint {
        let max = BigUint::from(1u32) << num_vars;
        let mut cache = HashMap::new();
        self.sat_count_rec(f, &max, &mut cache)
    }

    fn sat_count_rec(&self, f: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(f) {
            return BigUint::ZERO;
        }
        if self.is_one(f) {
            return max.clone();
        }
        if let Some(count) = cache.get(&f) {
            return count.clone();
        }

        let (low, high) = {
            let nodes = self.nodes.borrow();
            let node = &nodes[f.index()];
            (node.low, node.high)
        };

        // Counts are relative to the full assignment space, so conditioning
        // on the node's variable halves the sum of the children's counts.
        let count: BigUint =
            (self.sat_count_rec(low, max, cache) + self.sat_count_rec(high, max, cache)) >> 1u32;
        let count = if f.is_negated() { max - count } else { count };
        cache.insert(f, count.clone());
        count
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new()
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bdd").field("num_nodes", &self.num_nodes()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        let bdd = Bdd::new();
        assert!(bdd.is_one(bdd.one));
        assert!(bdd.is_zero(bdd.zero));
        assert_eq!(bdd.zero, -bdd.one);
        assert!(bdd.is_terminal(bdd.one));
        assert!(bdd.is_terminal(bdd.zero));
    }

    #[test]
    fn test_hash_consing() {
        let bdd = Bdd::new();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(1);
        assert_eq!(x, y);
        assert_ne!(x, bdd.mk_var(2));
    }

    #[test]
    fn test_boolean_laws() {
        let bdd = Bdd::new();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        assert_eq!(bdd.apply_and(x, bdd.one), x);
        assert_eq!(bdd.apply_and(x, bdd.zero), bdd.zero);
        assert_eq!(bdd.apply_or(x, bdd.zero), x);
        assert_eq!(bdd.apply_or(x, -x), bdd.one);
        assert_eq!(bdd.apply_and(x, -x), bdd.zero);
        assert_eq!(bdd.apply_and(x, y), bdd.apply_and(y, x));
        assert_eq!(-bdd.apply_and(x, y), bdd.apply_or(-x, -y));
    }

    #[test]
    fn test_ite_decomposition() {
        let bdd = Bdd::new();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);

        let f = bdd.apply_ite(x, y, z);
        let expected = bdd.apply_or(bdd.apply_and(x, y), bdd.apply_and(-x, z));
        assert_eq!(f, expected);
    }

    #[test]
    fn test_implies() {
        let bdd = Bdd::new();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        let xy = bdd.apply_and(x, y);
        assert!(bdd.implies(xy, x));
        assert!(bdd.implies(xy, y));
        assert!(!bdd.implies(x, xy));
        assert!(bdd.implies(bdd.zero, x));
        assert!(bdd.implies(x, bdd.one));
    }

    #[test]
    fn test_sat_count() {
        let bdd = Bdd::new();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        assert_eq!(bdd.sat_count(bdd.zero, 2), BigUint::from(0u32));
        assert_eq!(bdd.sat_count(bdd.one, 2), BigUint::from(4u32));
        assert_eq!(bdd.sat_count(x, 2), BigUint::from(2u32));
        assert_eq!(bdd.sat_count(bdd.apply_and(x, y), 2), BigUint::from(1u32));
        assert_eq!(bdd.sat_count(bdd.apply_or(x, y), 2), BigUint::from(3u32));
        assert_eq!(bdd.sat_count(bdd.apply_xor(x, y), 2), BigUint::from(2u32));
    }
}

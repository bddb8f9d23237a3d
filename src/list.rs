//! Symbolically indexed list summaries.
//!
//! A [`ListVS`] is a guarded sequence: its length is itself a summary (runs
//! may have appended different numbers of items), and indexing takes a
//! symbolic index, merging the per-index results under the index's own guard
//! split. The item at position `i` only has an opinion about runs whose list
//! is at least `i + 1` long.

use crate::guard::Guard;
use crate::summary::{PrimitiveVS, ValueSummary};

/// A guarded sequence of summaries with symbolic length.
#[derive(Debug, Clone)]
pub struct ListVS<T: ValueSummary> {
    size: PrimitiveVS<i64>,
    items: Vec<T>,
}

impl<T: ValueSummary> ListVS<T> {
    /// An empty list live for the runs in `universe`.
    pub fn new(universe: Guard) -> Self {
        Self { size: PrimitiveVS::new(0, universe), items: Vec::new() }
    }

    /// Symbolic length.
    pub fn size(&self) -> &PrimitiveVS<i64> {
        &self.size
    }

    /// Items in slot order. Slot `i` covers only runs with size > `i`.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Append `item` under its own universe, growing the length only along
    /// that guard. Runs with different current sizes file the item into
    /// different slots; a slot that already exists for other runs is merged
    /// into.
    pub fn add(&self, item: T) -> Self {
        let pc = item.universe();
        let grown = self.size.restrict(&pc).plus(1);
        let size = self.size.update(&pc, &grown);

        let mut items = self.items.clone();
        let mut at = self.size.restrict(&pc).guarded_values().to_vec();
        // Ascending slot order, so a push can only ever extend by one.
        at.sort_by_key(|gv| gv.value);
        for gv in at {
            assert!(gv.value >= 0, "negative list size");
            let slot = gv.value as usize;
            let part = item.restrict(&gv.guard);
            if slot == items.len() {
                items.push(part);
            } else {
                items[slot] = items[slot].merge(&part);
            }
        }
        Self { size, items }
    }

    /// For each run, whether its index falls inside its list.
    pub fn in_range(&self, index: &PrimitiveVS<i64>) -> PrimitiveVS<bool> {
        let ctx = self.size.universe().ctx();
        let mut yes = ctx.ff();
        let mut no = ctx.ff();
        for iv in index.guarded_values() {
            for sv in self.size.guarded_values() {
                let g = iv.guard.and(&sv.guard);
                if g.is_false() {
                    continue;
                }
                if iv.value >= 0 && iv.value < sv.value {
                    yes = yes.or(&g);
                } else {
                    no = no.or(&g);
                }
            }
        }
        let t = PrimitiveVS::new(true, yes);
        let f = PrimitiveVS::new(false, no);
        t.merge(&f)
    }

    /// Symbolic indexing: the merge of `items[i]` restricted to the guard of
    /// each concrete index `i` in `index`.
    ///
    /// The index summary must be non-empty and every concrete index must be a
    /// valid slot; establish both with [`ListVS::in_range`] first. Violations
    /// are core programming errors and panic.
    pub fn get(&self, index: &PrimitiveVS<i64>) -> T {
        assert!(!index.is_empty_summary(), "list indexed with an empty summary");
        let narrowed = self.restrict(&index.universe());

        let mut result: Option<T> = None;
        for iv in index.guarded_values() {
            assert!(
                iv.value >= 0 && (iv.value as usize) < narrowed.items.len(),
                "list index {} out of bounds for {} slots",
                iv.value,
                narrowed.items.len()
            );
            let part = narrowed.items[iv.value as usize].restrict(&iv.guard);
            result = Some(match result {
                Some(acc) => acc.merge(&part),
                None => part,
            });
        }
        result.expect("non-empty index summary has at least one case")
    }
}

impl<T: ValueSummary> ValueSummary for ListVS<T> {
    fn restrict(&self, guard: &Guard) -> Self {
        Self {
            size: self.size.restrict(guard),
            items: self.items.iter().map(|item| item.restrict(guard)).collect(),
        }
    }

    fn merge(&self, other: &Self) -> Self {
        let size = self.size.merge(&other.size);
        let len = self.items.len().max(other.items.len());
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            let item = match (self.items.get(i), other.items.get(i)) {
                (Some(a), Some(b)) => a.merge(b),
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => unreachable!(),
            };
            items.push(item);
        }
        Self { size, items }
    }

    fn universe(&self) -> Guard {
        self.size.universe()
    }
}

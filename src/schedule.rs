//! The search-tree memory: per-depth choices and the machine registry.
//!
//! A [`Schedule`] records every nondeterministic decision of a search pass as
//! one [`Choice`] per depth. Each choice keeps the decision actually taken on
//! the current pass (the *repeat*) and the untried sibling decisions queued
//! for future passes (the *backtracks*), independently for the four choice
//! kinds: sender, boolean, integer, and an opaque element token. The schedule
//! also registers every machine created during the pass, indexed per type by
//! a symbolic integer.
//!
//! Restricting a schedule ([`Schedule::guard`]) produces a new value: the
//! registry and machine set are carried over by value, so writes to the copy
//! never alias back into the schedule it came from.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};

use log::{debug, trace};

use crate::guard::{Guard, GuardCtx};
use crate::list::ListVS;
use crate::machine::{MachineId, MachineKind};
use crate::summary::{PrimitiveVS, ValueSummary};

/// Opaque token for arbitrary-domain choices. The driver maps tokens to the
/// domain values it is choosing among.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Element(pub u64);

/// The decisions recorded at one depth.
///
/// A given depth resolves to one kind in practice; the structure does not
/// enforce this, so callers must not populate more than one kind's repeat per
/// depth.
#[derive(Clone)]
pub struct Choice {
    repeat_sender: PrimitiveVS<MachineId>,
    repeat_bool: PrimitiveVS<bool>,
    repeat_int: PrimitiveVS<i64>,
    repeat_element: PrimitiveVS<Element>,
    backtrack_sender: Vec<PrimitiveVS<MachineId>>,
    backtrack_bool: Vec<PrimitiveVS<bool>>,
    backtrack_int: Vec<PrimitiveVS<i64>>,
    backtrack_element: Vec<PrimitiveVS<Element>>,
}

impl Choice {
    fn new(ctx: &GuardCtx) -> Self {
        Self {
            repeat_sender: PrimitiveVS::empty(ctx),
            repeat_bool: PrimitiveVS::empty(ctx),
            repeat_int: PrimitiveVS::empty(ctx),
            repeat_element: PrimitiveVS::empty(ctx),
            backtrack_sender: Vec::new(),
            backtrack_bool: Vec::new(),
            backtrack_int: Vec::new(),
            backtrack_element: Vec::new(),
        }
    }

    pub fn repeat_sender(&self) -> &PrimitiveVS<MachineId> {
        &self.repeat_sender
    }
    pub fn repeat_bool(&self) -> &PrimitiveVS<bool> {
        &self.repeat_bool
    }
    pub fn repeat_int(&self) -> &PrimitiveVS<i64> {
        &self.repeat_int
    }
    pub fn repeat_element(&self) -> &PrimitiveVS<Element> {
        &self.repeat_element
    }
    pub fn backtrack_sender(&self) -> &[PrimitiveVS<MachineId>] {
        &self.backtrack_sender
    }
    pub fn backtrack_bool(&self) -> &[PrimitiveVS<bool>] {
        &self.backtrack_bool
    }
    pub fn backtrack_int(&self) -> &[PrimitiveVS<i64>] {
        &self.backtrack_int
    }
    pub fn backtrack_element(&self) -> &[PrimitiveVS<Element>] {
        &self.backtrack_element
    }

    /// Guard of the runs this depth has a repeat decision for, across kinds.
    pub fn repeat_universe(&self) -> Guard {
        self.repeat_sender
            .universe()
            .or(&self.repeat_bool.universe())
            .or(&self.repeat_int.universe())
            .or(&self.repeat_element.universe())
    }

    pub fn is_repeat_empty(&self) -> bool {
        self.repeat_universe().is_false()
    }

    pub fn is_backtrack_empty(&self) -> bool {
        self.backtrack_sender.is_empty()
            && self.backtrack_bool.is_empty()
            && self.backtrack_int.is_empty()
            && self.backtrack_element.is_empty()
    }

    pub fn restrict(&self, guard: &Guard) -> Self {
        Self {
            repeat_sender: self.repeat_sender.restrict(guard),
            repeat_bool: self.repeat_bool.restrict(guard),
            repeat_int: self.repeat_int.restrict(guard),
            repeat_element: self.repeat_element.restrict(guard),
            backtrack_sender: self.backtrack_sender.iter().map(|vs| vs.restrict(guard)).collect(),
            backtrack_bool: self.backtrack_bool.iter().map(|vs| vs.restrict(guard)).collect(),
            backtrack_int: self.backtrack_int.iter().map(|vs| vs.restrict(guard)).collect(),
            backtrack_element: self.backtrack_element.iter().map(|vs| vs.restrict(guard)).collect(),
        }
    }

    fn clear_repeat(&mut self, ctx: &GuardCtx) {
        self.repeat_sender = PrimitiveVS::empty(ctx);
        self.repeat_bool = PrimitiveVS::empty(ctx);
        self.repeat_int = PrimitiveVS::empty(ctx);
        self.repeat_element = PrimitiveVS::empty(ctx);
    }

    fn clear_backtrack(&mut self) {
        self.backtrack_sender.clear();
        self.backtrack_bool.clear();
        self.backtrack_int.clear();
        self.backtrack_element.clear();
    }
}

impl Debug for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Choice")
            .field("repeat_universe", &self.repeat_universe())
            .field("backtracks", &(self.backtrack_sender.len()
                + self.backtrack_bool.len()
                + self.backtrack_int.len()
                + self.backtrack_element.len()))
            .finish()
    }
}

/// Depth-indexed choice records plus the registry of created machines.
#[derive(Clone)]
pub struct Schedule {
    ctx: GuardCtx,
    choices: Vec<Choice>,
    created: HashMap<MachineKind, ListVS<PrimitiveVS<MachineId>>>,
    machines: HashSet<MachineId>,
    pc: Guard,
}

impl Schedule {
    pub fn new(ctx: &GuardCtx) -> Self {
        Self {
            ctx: ctx.clone(),
            choices: Vec::new(),
            created: HashMap::new(),
            machines: HashSet::new(),
            pc: ctx.tt(),
        }
    }

    /// Number of recorded depths.
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// The guard this schedule's registry reads are restricted to.
    pub fn pc(&self) -> &Guard {
        &self.pc
    }

    pub fn choice(&self, depth: usize) -> &Choice {
        &self.choices[depth]
    }

    fn at_depth(&mut self, depth: usize) -> &mut Choice {
        while self.choices.len() <= depth {
            self.choices.push(Choice::new(&self.ctx));
        }
        &mut self.choices[depth]
    }

    pub fn add_repeat_sender(&mut self, choice: PrimitiveVS<MachineId>, depth: usize) {
        self.at_depth(depth).repeat_sender = choice;
    }

    pub fn add_repeat_bool(&mut self, choice: PrimitiveVS<bool>, depth: usize) {
        self.at_depth(depth).repeat_bool = choice;
    }

    pub fn add_repeat_int(&mut self, choice: PrimitiveVS<i64>, depth: usize) {
        self.at_depth(depth).repeat_int = choice;
    }

    pub fn add_repeat_element(&mut self, choice: PrimitiveVS<Element>, depth: usize) {
        self.at_depth(depth).repeat_element = choice;
    }

    pub fn add_backtrack_sender(&mut self, choices: Vec<PrimitiveVS<MachineId>>, depth: usize) {
        self.at_depth(depth).backtrack_sender.extend(choices);
    }

    pub fn add_backtrack_bool(&mut self, choices: Vec<PrimitiveVS<bool>>, depth: usize) {
        self.at_depth(depth).backtrack_bool.extend(choices);
    }

    pub fn add_backtrack_int(&mut self, choices: Vec<PrimitiveVS<i64>>, depth: usize) {
        self.at_depth(depth).backtrack_int.extend(choices);
    }

    pub fn add_backtrack_element(&mut self, choices: Vec<PrimitiveVS<Element>>, depth: usize) {
        self.at_depth(depth).backtrack_element.extend(choices);
    }

    pub fn repeat_sender(&self, depth: usize) -> &PrimitiveVS<MachineId> {
        &self.choices[depth].repeat_sender
    }
    pub fn repeat_bool(&self, depth: usize) -> &PrimitiveVS<bool> {
        &self.choices[depth].repeat_bool
    }
    pub fn repeat_int(&self, depth: usize) -> &PrimitiveVS<i64> {
        &self.choices[depth].repeat_int
    }
    pub fn repeat_element(&self, depth: usize) -> &PrimitiveVS<Element> {
        &self.choices[depth].repeat_element
    }
    pub fn backtrack_sender(&self, depth: usize) -> &[PrimitiveVS<MachineId>] {
        &self.choices[depth].backtrack_sender
    }
    pub fn backtrack_bool(&self, depth: usize) -> &[PrimitiveVS<bool>] {
        &self.choices[depth].backtrack_bool
    }
    pub fn backtrack_int(&self, depth: usize) -> &[PrimitiveVS<i64>] {
        &self.choices[depth].backtrack_int
    }
    pub fn backtrack_element(&self, depth: usize) -> &[PrimitiveVS<Element>] {
        &self.choices[depth].backtrack_element
    }

    /// Drop every kind's repeat decision at `depth`.
    pub fn clear_repeat(&mut self, depth: usize) {
        let ctx = self.ctx.clone();
        self.choices[depth].clear_repeat(&ctx);
    }

    /// Drop every kind's backtrack list at `depth`.
    pub fn clear_backtrack(&mut self, depth: usize) {
        self.choices[depth].clear_backtrack();
    }

    /// Drop both the repeat and the backtracks at `depth`.
    pub fn clear_choice(&mut self, depth: usize) {
        self.clear_repeat(depth);
        self.clear_backtrack(depth);
    }

    /// Number of depths that still have an untried alternative of any kind.
    /// The driver keeps searching while this is nonzero.
    pub fn num_backtracks(&self) -> usize {
        self.choices.iter().filter(|c| !c.is_backtrack_empty()).count()
    }

    /// A new schedule with every choice restricted to `guard` and registry
    /// reads restricted to it from now on. The registry contents and machine
    /// set are carried over unrestricted.
    pub fn guard(&self, guard: &Guard) -> Schedule {
        debug!("schedule: narrowing {} depths to {}", self.choices.len(), guard);
        Schedule {
            ctx: self.ctx.clone(),
            choices: self.choices.iter().map(|c| c.restrict(guard)).collect(),
            created: self.created.clone(),
            machines: self.machines.clone(),
            pc: guard.clone(),
        }
    }

    /// Drop depths whose repeat universe has become false, preserving the
    /// order of the rest. Compaction after a restriction.
    pub fn remove_empty_repeat(&self) -> Schedule {
        Schedule {
            ctx: self.ctx.clone(),
            choices: self.choices.iter().filter(|c| !c.is_repeat_empty()).cloned().collect(),
            created: self.created.clone(),
            machines: self.machines.clone(),
            pc: self.pc.clone(),
        }
    }

    /// Project the schedule onto exactly one concrete path.
    ///
    /// Walks depths in order, committing to the first guarded value at each
    /// (kind priority: sender, then bool, then int, then element), then
    /// restricts the whole schedule to the accumulated path condition and
    /// compacts. Used to materialize one counterexample trace for replay.
    pub fn single_schedule(&self) -> Schedule {
        let mut pc = self.ctx.tt();
        for choice in &self.choices {
            let narrowed = choice.restrict(&pc);
            let first = narrowed
                .repeat_sender
                .guarded_values()
                .first()
                .map(|gv| gv.guard.clone())
                .or_else(|| narrowed.repeat_bool.guarded_values().first().map(|gv| gv.guard.clone()))
                .or_else(|| narrowed.repeat_int.guarded_values().first().map(|gv| gv.guard.clone()))
                .or_else(|| {
                    narrowed.repeat_element.guarded_values().first().map(|gv| gv.guard.clone())
                });
            if let Some(g) = first {
                pc = pc.and(&g);
            }
        }
        debug!("schedule: single path condition {}", pc);
        self.guard(&pc).remove_empty_repeat()
    }

    /// Guard under which the execution reaches exactly `size` steps: false
    /// for zero (and beyond the recorded depth, where no run gets), otherwise
    /// the repeat universe of the last included choice.
    pub fn length_cond(&self, size: usize) -> Guard {
        if size == 0 {
            return self.ctx.ff();
        }
        match self.choices.get(size - 1) {
            Some(choice) => choice.repeat_universe(),
            None => self.ctx.ff(),
        }
    }

    /// Record a machine created under `guard`: appended to the per-kind list
    /// (created on first use) and added to the flat machine set
    /// unconditionally.
    pub fn make_machine(&mut self, machine: MachineId, kind: &MachineKind, guard: &Guard) {
        debug!("schedule: created {} of kind {} under {}", machine, kind, guard);
        let to_add = PrimitiveVS::new(machine, guard.clone());
        let list = self
            .created
            .entry(kind.clone())
            .or_insert_with(|| ListVS::new(self.ctx.tt()));
        *list = list.add(to_add);
        self.machines.insert(machine);
    }

    /// Whether some run has a `kind` machine at `index`, once restricted to
    /// this schedule's guard and `other_pc`. Symbolic out-of-range indices
    /// mean "no such machine", never an error.
    pub fn has_machine(
        &self,
        kind: &MachineKind,
        index: &PrimitiveVS<i64>,
        other_pc: &Guard,
    ) -> bool {
        let Some(list) = self.created.get(kind) else {
            trace!("has_machine: no {} ever created", kind);
            return false;
        };
        let valid = list.in_range(index).guard_for(&true);
        if valid.is_false() {
            trace!("has_machine: index out of range for every run");
            return false;
        }
        let machines = list.get(&index.restrict(&valid));
        !machines.restrict(&self.pc).restrict(other_pc).universe().is_false()
    }

    /// The machine summary of `kind` at `index`, restricted to this
    /// schedule's guard. Callers must have established [`Schedule::has_machine`].
    pub fn get_machine(&self, kind: &MachineKind, index: &PrimitiveVS<i64>) -> PrimitiveVS<MachineId> {
        let list = self.created.get(kind).expect("get_machine without has_machine");
        list.get(index).restrict(&self.pc)
    }

    /// Every machine ever created, regardless of guard.
    pub fn machines(&self) -> &HashSet<MachineId> {
        &self.machines
    }
}

impl Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("depths", &self.choices.len())
            .field("machines", &self.machines.len())
            .field("pc", &self.pc)
            .finish()
    }
}

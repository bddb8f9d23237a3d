//! Tagged-union payload summaries.
//!
//! A message payload may have a different shape in different runs. A
//! [`UnionVS`] tracks which payload tag each run carries (itself a summary)
//! together with one payload summary per tag. Dispatch treats payloads as
//! opaque: restrict and pass through.

use std::collections::HashMap;

use crate::event::Event;
use crate::guard::Guard;
use crate::machine::MachineId;
use crate::summary::{PrimitiveVS, ValueSummary};

/// Discriminant of a payload shape.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Tag {
    Bool,
    Int,
    Machine,
    Event,
}

/// One payload shape.
#[derive(Debug, Clone)]
pub enum PayloadVS {
    Bool(PrimitiveVS<bool>),
    Int(PrimitiveVS<i64>),
    Machine(PrimitiveVS<MachineId>),
    Event(PrimitiveVS<Event>),
}

impl PayloadVS {
    pub fn tag(&self) -> Tag {
        match self {
            PayloadVS::Bool(_) => Tag::Bool,
            PayloadVS::Int(_) => Tag::Int,
            PayloadVS::Machine(_) => Tag::Machine,
            PayloadVS::Event(_) => Tag::Event,
        }
    }

    pub fn as_bool(&self) -> Option<&PrimitiveVS<bool>> {
        match self {
            PayloadVS::Bool(vs) => Some(vs),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&PrimitiveVS<i64>> {
        match self {
            PayloadVS::Int(vs) => Some(vs),
            _ => None,
        }
    }

    pub fn as_machine(&self) -> Option<&PrimitiveVS<MachineId>> {
        match self {
            PayloadVS::Machine(vs) => Some(vs),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&PrimitiveVS<Event>> {
        match self {
            PayloadVS::Event(vs) => Some(vs),
            _ => None,
        }
    }
}

impl ValueSummary for PayloadVS {
    fn restrict(&self, guard: &Guard) -> Self {
        match self {
            PayloadVS::Bool(vs) => PayloadVS::Bool(vs.restrict(guard)),
            PayloadVS::Int(vs) => PayloadVS::Int(vs.restrict(guard)),
            PayloadVS::Machine(vs) => PayloadVS::Machine(vs.restrict(guard)),
            PayloadVS::Event(vs) => PayloadVS::Event(vs.restrict(guard)),
        }
    }

    fn merge(&self, other: &Self) -> Self {
        match (self, other) {
            (PayloadVS::Bool(a), PayloadVS::Bool(b)) => PayloadVS::Bool(a.merge(b)),
            (PayloadVS::Int(a), PayloadVS::Int(b)) => PayloadVS::Int(a.merge(b)),
            (PayloadVS::Machine(a), PayloadVS::Machine(b)) => PayloadVS::Machine(a.merge(b)),
            (PayloadVS::Event(a), PayloadVS::Event(b)) => PayloadVS::Event(a.merge(b)),
            (a, b) => panic!("payload tag mismatch: {:?} merged with {:?}", a.tag(), b.tag()),
        }
    }

    fn universe(&self) -> Guard {
        match self {
            PayloadVS::Bool(vs) => vs.universe(),
            PayloadVS::Int(vs) => vs.universe(),
            PayloadVS::Machine(vs) => vs.universe(),
            PayloadVS::Event(vs) => vs.universe(),
        }
    }
}

/// Summary of a payload whose shape may differ across runs.
#[derive(Debug, Clone)]
pub struct UnionVS {
    tag: PrimitiveVS<Tag>,
    cases: HashMap<Tag, PayloadVS>,
}

impl UnionVS {
    /// A union holding one shape, live for that payload's universe.
    pub fn new(payload: PayloadVS) -> Self {
        let tag = PrimitiveVS::new(payload.tag(), payload.universe());
        let mut cases = HashMap::new();
        cases.insert(payload.tag(), payload);
        Self { tag, cases }
    }

    /// Which tag each run carries.
    pub fn tag(&self) -> &PrimitiveVS<Tag> {
        &self.tag
    }

    /// The payload summary for `tag`, if any run carries it.
    pub fn payload(&self, tag: Tag) -> Option<&PayloadVS> {
        self.cases.get(&tag)
    }
}

impl ValueSummary for UnionVS {
    fn restrict(&self, guard: &Guard) -> Self {
        let mut cases = HashMap::with_capacity(self.cases.len());
        for (tag, payload) in &self.cases {
            let narrowed = payload.restrict(guard);
            if !narrowed.universe().is_false() {
                cases.insert(*tag, narrowed);
            }
        }
        Self { tag: self.tag.restrict(guard), cases }
    }

    fn merge(&self, other: &Self) -> Self {
        let tag = self.tag.merge(&other.tag);
        let mut cases = self.cases.clone();
        for (t, payload) in &other.cases {
            match cases.get_mut(t) {
                Some(existing) => *existing = existing.merge(payload),
                None => {
                    cases.insert(*t, payload.clone());
                }
            }
        }
        Self { tag, cases }
    }

    fn universe(&self) -> Guard {
        self.tag.universe()
    }
}

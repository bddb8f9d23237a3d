//! Events and in-flight messages.

use std::fmt::{self, Display};
use std::rc::Rc;

use crate::guard::Guard;
use crate::machine::MachineId;
use crate::summary::{PrimitiveVS, ValueSummary};
use crate::union::UnionVS;

/// Interned event name. Handler tables key on this identity.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Event(Rc<str>);

impl Event {
    pub fn new(name: &str) -> Self {
        Self(Rc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An in-flight message: which event each run carries, to whom, and with what
/// payload. The message is live exactly for the runs in its universe.
#[derive(Debug, Clone)]
pub struct Message {
    event: PrimitiveVS<Event>,
    target: PrimitiveVS<MachineId>,
    payload: Option<UnionVS>,
}

impl Message {
    pub fn new(
        event: PrimitiveVS<Event>,
        target: PrimitiveVS<MachineId>,
        payload: Option<UnionVS>,
    ) -> Self {
        Self { event, target, payload }
    }

    pub fn event(&self) -> &PrimitiveVS<Event> {
        &self.event
    }

    pub fn target(&self) -> &PrimitiveVS<MachineId> {
        &self.target
    }

    pub fn payload(&self) -> Option<&UnionVS> {
        self.payload.as_ref()
    }

    /// The runs this message is live for.
    pub fn universe(&self) -> Guard {
        self.event.universe()
    }

    pub fn restrict(&self, guard: &Guard) -> Self {
        Self {
            event: self.event.restrict(guard),
            target: self.target.restrict(guard),
            payload: self.payload.as_ref().map(|p| p.restrict(guard)),
        }
    }
}

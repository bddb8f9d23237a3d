//! States and symbolic event dispatch.
//!
//! A [`State`] owns a table of per-event handlers, populated at setup time and
//! never mutated during dispatch. Delivering a message walks the message's
//! guarded event cases and invokes the matching handler for each, narrowed to
//! that case's guard; any run left uncovered is an unhandled-event bug,
//! reported with the exact guard of the affected runs.

use std::collections::HashMap;
use std::fmt::{self, Debug};

use log::debug;

use crate::error::{CheckError, CheckResult};
use crate::event::{Event, Message};
use crate::guard::Guard;
use crate::machine::MachineId;
use crate::summary::{PrimitiveVS, ValueSummary};
use crate::union::UnionVS;

/// What a handler asked the owning machine to do next.
///
/// An out-parameter channel: handlers write into it, the machine runtime
/// drains it after dispatch returns. The core passes it through unmodified.
#[derive(Default)]
pub struct Outcome {
    transitions: Vec<Transition>,
    raised: Vec<Message>,
}

/// A requested state change for the runs in `guard`.
pub struct Transition {
    pub target: String,
    pub guard: Guard,
    pub payload: Option<UnionVS>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a transition to `target` for the runs in `guard`.
    pub fn goto_state(&mut self, target: &str, guard: &Guard, payload: Option<UnionVS>) {
        self.transitions.push(Transition {
            target: target.to_owned(),
            guard: guard.clone(),
            payload,
        });
    }

    /// Raise a message for immediate redelivery by the machine runtime.
    pub fn raise(&mut self, message: Message) {
        self.raised.push(message);
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn raised(&self) -> &[Message] {
        &self.raised
    }

    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    pub fn take_raised(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.raised)
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty() && self.raised.is_empty()
    }
}

pub type HandlerFn = Box<dyn Fn(&Guard, MachineId, Option<&UnionVS>, &mut Outcome)>;
pub type EntryFn = Box<dyn Fn(&Guard, MachineId, &mut Outcome, Option<&UnionVS>)>;
pub type ExitFn = Box<dyn Fn(&Guard, MachineId)>;

/// A handler for one event.
pub struct EventHandler {
    event: Event,
    cover: Option<Guard>,
    run: HandlerFn,
}

impl EventHandler {
    /// A handler able to serve every run that carries its event.
    pub fn new(event: Event, run: impl Fn(&Guard, MachineId, Option<&UnionVS>, &mut Outcome) + 'static) -> Self {
        Self { event, cover: None, run: Box::new(run) }
    }

    /// A handler that only serves the runs in `cover`; runs outside it are
    /// reported as unhandled.
    pub fn covering(
        event: Event,
        cover: Guard,
        run: impl Fn(&Guard, MachineId, Option<&UnionVS>, &mut Outcome) + 'static,
    ) -> Self {
        Self { event, cover: Some(cover), run: Box::new(run) }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }
}

/// A named state with its handler table and optional entry/exit hooks.
pub struct State {
    name: String,
    handlers: HashMap<Event, EventHandler>,
    on_entry: Option<EntryFn>,
    on_exit: Option<ExitFn>,
}

impl State {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            handlers: HashMap::new(),
            on_entry: None,
            on_exit: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a handler. Later registrations for the same event win.
    pub fn add_handler(&mut self, handler: EventHandler) {
        self.handlers.insert(handler.event().clone(), handler);
    }

    pub fn with_handler(mut self, handler: EventHandler) -> Self {
        self.add_handler(handler);
        self
    }

    pub fn on_entry(
        mut self,
        hook: impl Fn(&Guard, MachineId, &mut Outcome, Option<&UnionVS>) + 'static,
    ) -> Self {
        self.on_entry = Some(Box::new(hook));
        self
    }

    pub fn on_exit(mut self, hook: impl Fn(&Guard, MachineId) + 'static) -> Self {
        self.on_exit = Some(Box::new(hook));
        self
    }

    /// Entry hook, invoked by the owning machine on transition into this
    /// state. No-op unless overridden.
    pub fn entry(
        &self,
        pc: &Guard,
        machine: MachineId,
        outcome: &mut Outcome,
        payload: Option<&UnionVS>,
    ) {
        if let Some(hook) = &self.on_entry {
            hook(pc, machine, outcome, payload);
        }
    }

    /// Exit hook, invoked by the owning machine on transition out of this
    /// state. No-op unless overridden.
    pub fn exit(&self, pc: &Guard, machine: MachineId) {
        if let Some(hook) = &self.on_exit {
            hook(pc, machine);
        }
    }

    /// For each run in the message's universe, whether this state has a
    /// handler for the event that run carries.
    ///
    /// The result is a partial boolean summary: runs with no matching handler
    /// contribute no case, they do not get an explicit `false` entry.
    pub fn has_handler(&self, message: &Message) -> PrimitiveVS<bool> {
        let mut has = message.universe().ctx().ff();
        for gv in message.event().guarded_values() {
            if let Some(handler) = self.handlers.get(&gv.value) {
                let g = match &handler.cover {
                    Some(cover) => gv.guard.and(cover),
                    None => gv.guard.clone(),
                };
                has = has.or(&g);
            }
        }
        PrimitiveVS::true_under(has).restrict(&message.universe())
    }

    /// Deliver `message` to this state's handlers.
    ///
    /// Each guarded event case is dispatched exactly once; if the handled
    /// guard does not cover the case exactly, the remainder is an
    /// unhandled-event bug and dispatch fails immediately with that exact
    /// guard. Runs under other (disjoint) cases are unaffected by the runs
    /// that failed.
    pub fn handle_event(
        &self,
        message: &Message,
        machine: MachineId,
        outcome: &mut Outcome,
    ) -> CheckResult<()> {
        for gv in message.event().guarded_values() {
            let event = &gv.value;
            let event_pc = &gv.guard;
            debug!("{}: delivering '{}' in state '{}' under {}", machine, event, self.name, event_pc);

            let mut handled = event_pc.ctx().ff();
            if let Some(handler) = self.handlers.get(event) {
                let pc = match &handler.cover {
                    Some(cover) => event_pc.and(cover),
                    None => event_pc.clone(),
                };
                if !pc.is_false() {
                    let narrowed = message.restrict(&pc);
                    (handler.run)(&pc, machine, narrowed.payload(), outcome);
                    handled = handled.or(&pc);
                }
            }

            if !handled.same_runs(event_pc) {
                let missing = event_pc.and(&handled.not());
                debug!("state '{}' missing handler for '{}' under {}", self.name, event, missing);
                return Err(CheckError::UnhandledEvent {
                    state: self.name.clone(),
                    event: event.clone(),
                    guard: missing,
                });
            }
        }
        Ok(())
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::GuardCtx;
    use crate::summary::PrimitiveVS;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ping_message(ctx: &GuardCtx) -> (Message, Guard, Guard) {
        let parts = ctx.choice_partition(2);
        let (g1, g2) = (parts[0].clone(), parts[1].clone());
        let ping = Event::new("Ping");
        let event = PrimitiveVS::new(ping.clone(), g1.clone())
            .merge(&PrimitiveVS::new(ping, g2.clone()));
        let target = PrimitiveVS::new(MachineId::new(0), ctx.tt());
        (Message::new(event, target, None), g1, g2)
    }

    #[test]
    fn test_handler_invoked_once_per_event_case() {
        let ctx = GuardCtx::new();
        let (message, g1, g2) = ping_message(&ctx);

        let seen: Rc<RefCell<Vec<Guard>>> = Rc::new(RefCell::new(Vec::new()));
        let seen2 = Rc::clone(&seen);
        let idle = State::new("Idle").with_handler(EventHandler::new(
            Event::new("Ping"),
            move |pc, _m, _payload, _outcome| seen2.borrow_mut().push(pc.clone()),
        ));

        let mut outcome = Outcome::new();
        idle.handle_event(&message, MachineId::new(0), &mut outcome).unwrap();

        // The two run-subsets coalesce into one event case, handled together.
        let seen = seen.borrow();
        let total = seen.iter().fold(ctx.ff(), |acc, g| acc.or(g));
        assert_eq!(total, g1.or(&g2));
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_unhandled_event_reports_exact_guard() {
        let ctx = GuardCtx::new();
        let (message, g1, g2) = ping_message(&ctx);

        let idle = State::new("Idle");
        let mut outcome = Outcome::new();
        let err = idle.handle_event(&message, MachineId::new(0), &mut outcome).unwrap_err();

        match err {
            CheckError::UnhandledEvent { state, event, guard } => {
                assert_eq!(state, "Idle");
                assert_eq!(event.name(), "Ping");
                assert_eq!(guard, g1.or(&g2));
            }
        }
    }

    #[test]
    fn test_partially_covered_handler_reports_remainder() {
        let ctx = GuardCtx::new();
        let (message, g1, g2) = ping_message(&ctx);

        // The handler only covers g1; the g2 runs must be reported.
        let idle = State::new("Idle").with_handler(EventHandler::covering(
            Event::new("Ping"),
            g1.clone(),
            |_pc, _m, _payload, _outcome| {},
        ));

        let mut outcome = Outcome::new();
        let err = idle.handle_event(&message, MachineId::new(0), &mut outcome).unwrap_err();
        assert_eq!(*err.guard(), g2);
        assert!(err.guard().and(&g1).is_false());
    }

    #[test]
    fn test_has_handler_is_partial() {
        let ctx = GuardCtx::new();
        let parts = ctx.choice_partition(2);
        let (g1, g2) = (parts[0].clone(), parts[1].clone());

        let event = PrimitiveVS::new(Event::new("Ping"), g1.clone())
            .merge(&PrimitiveVS::new(Event::new("Pong"), g2.clone()));
        let target = PrimitiveVS::new(MachineId::new(0), ctx.tt());
        let message = Message::new(event, target, None);

        let idle = State::new("Idle").with_handler(EventHandler::new(
            Event::new("Ping"),
            |_pc, _m, _payload, _outcome| {},
        ));

        let has = idle.has_handler(&message);
        assert_eq!(has.guard_for(&true), g1);
        // No explicit false case for the unhandled runs.
        assert!(has.guard_for(&false).is_false());
        assert_eq!(has.universe(), g1);
    }

    #[test]
    fn test_entry_hook() {
        let ctx = GuardCtx::new();
        let fired: Rc<RefCell<Option<Guard>>> = Rc::new(RefCell::new(None));
        let fired2 = Rc::clone(&fired);
        let state = State::new("Init")
            .on_entry(move |pc, _m, _outcome, _payload| *fired2.borrow_mut() = Some(pc.clone()));

        let mut outcome = Outcome::new();
        let g = ctx.fresh_bit();
        state.entry(&g, MachineId::new(3), &mut outcome, None);
        assert_eq!(fired.borrow().clone(), Some(g));

        // Exit defaults to a no-op.
        state.exit(&ctx.tt(), MachineId::new(3));
    }
}

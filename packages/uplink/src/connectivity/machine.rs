use statig::prelude::*;

use super::state::{LinkEvent, LinkState};

#[derive(Clone, Copy, Debug)]
pub(super) struct LinkMachine {
    pub(super) state: LinkState,
}

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct DispatchContext {
    pub(super) associate: bool,
    pub(super) readiness: Option<bool>,
}

impl LinkMachine {
    pub(super) fn new() -> Self {
        Self {
            state: LinkState::Idle,
        }
    }

    fn enter_ready(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.state = LinkState::Ready;
        context.readiness = Some(true);
        Transition(State::ready())
    }

    fn enter_associating(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.state = LinkState::Associating;
        context.associate = true;
        context.readiness = Some(false);
        Transition(State::associating())
    }
}

#[state_machine(initial = "State::idle()")]
impl LinkMachine {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &LinkEvent) -> Outcome<State> {
        match event {
            LinkEvent::Initialize => {
                self.state = LinkState::Associating;
                Transition(State::associating())
            }
            LinkEvent::StationStarted => {
                context.associate = true;
                Handled
            }
            LinkEvent::AddressAssigned { .. } => self.enter_ready(context),
            LinkEvent::Disconnected { .. } => self.enter_associating(context),
        }
    }

    #[state]
    fn associating(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkEvent,
    ) -> Outcome<State> {
        match event {
            LinkEvent::Initialize => Handled,
            LinkEvent::StationStarted => {
                context.associate = true;
                Handled
            }
            LinkEvent::AddressAssigned { .. } => self.enter_ready(context),
            LinkEvent::Disconnected { .. } => {
                context.associate = true;
                context.readiness = Some(false);
                Handled
            }
        }
    }

    #[state]
    fn ready(&mut self, context: &mut DispatchContext, event: &LinkEvent) -> Outcome<State> {
        match event {
            LinkEvent::Initialize | LinkEvent::StationStarted => Handled,
            LinkEvent::AddressAssigned { .. } => {
                // lease renewed or re-addressed without a link drop
                context.readiness = Some(true);
                Handled
            }
            LinkEvent::Disconnected { .. } => self.enter_associating(context),
        }
    }
}

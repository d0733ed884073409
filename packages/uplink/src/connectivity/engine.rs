use statig::blocking::IntoStateMachineExt as _;

use super::machine::{DispatchContext, LinkMachine};
use super::state::{LinkEvent, LinkState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LinkApplyResult {
    pub(crate) before: LinkState,
    pub(crate) after: LinkState,
    /// An association attempt must be issued.
    pub(crate) associate: bool,
    /// New readiness value, `None` when unchanged.
    pub(crate) readiness: Option<bool>,
}

impl LinkApplyResult {
    pub(crate) fn changed(self) -> bool {
        self.before != self.after
    }
}

pub(crate) struct LinkEngine {
    machine: statig::blocking::StateMachine<LinkMachine>,
}

impl LinkEngine {
    pub(crate) fn new() -> Self {
        Self {
            machine: LinkMachine::new().state_machine(),
        }
    }

    pub(crate) fn state(&self) -> LinkState {
        self.machine.inner().state
    }

    pub(crate) fn apply(&mut self, event: LinkEvent) -> LinkApplyResult {
        let before = self.state();
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        LinkApplyResult {
            before,
            after: self.state(),
            associate: context.associate,
            readiness: context.readiness,
        }
    }
}

impl Default for LinkEngine {
    fn default() -> Self {
        Self::new()
    }
}

use statig::blocking::IntoStateMachineExt as _;

use super::machine::{DispatchContext, JoinHsm};
use super::{JoinPhase, LinkEvent, SyncFlags};

/// What the attempt driver must do after an event was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinAction {
    Wait,
    IssueConnect,
    /// Release the waiting task with the flags raised so far.
    Wake(SyncFlags),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinSnapshot {
    pub phase: JoinPhase,
    pub retries: u8,
    pub max_retries: u8,
    pub flags: SyncFlags,
    pub connect_requests: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinStep {
    pub before: JoinSnapshot,
    pub after: JoinSnapshot,
    pub action: JoinAction,
}

impl JoinStep {
    pub fn changed_phase(self) -> bool {
        self.before.phase != self.after.phase
    }
}

pub struct JoinEngine {
    machine: statig::blocking::StateMachine<JoinHsm>,
}

impl JoinEngine {
    pub fn new(max_retries: u8) -> Self {
        Self {
            machine: JoinHsm::new(max_retries).state_machine(),
        }
    }

    pub fn snapshot(&self) -> JoinSnapshot {
        let inner = self.machine.inner();
        JoinSnapshot {
            phase: inner.phase,
            retries: inner.retries.count(),
            max_retries: inner.retries.ceiling(),
            flags: inner.flags,
            connect_requests: inner.connect_requests,
        }
    }

    pub fn apply(&mut self, event: LinkEvent) -> JoinStep {
        let before = self.snapshot();
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        JoinStep {
            before,
            after: self.snapshot(),
            action: context.action,
        }
    }
}

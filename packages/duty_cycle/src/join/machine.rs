use log::debug;
use statig::prelude::*;

use super::engine::JoinAction;
use super::{JoinPhase, LinkEvent, RetryCounter, SyncFlags};

#[derive(Clone, Copy, Debug)]
pub(super) struct JoinHsm {
    pub(super) phase: JoinPhase,
    pub(super) retries: RetryCounter,
    pub(super) flags: SyncFlags,
    pub(super) connect_requests: u16,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct DispatchContext {
    pub(super) action: JoinAction,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            action: JoinAction::Wait,
        }
    }
}

impl JoinHsm {
    pub(super) fn new(max_retries: u8) -> Self {
        Self {
            phase: JoinPhase::Idle,
            retries: RetryCounter::new(max_retries),
            flags: SyncFlags::empty(),
            connect_requests: 0,
        }
    }

    fn request_connect(&mut self, context: &mut DispatchContext) {
        self.connect_requests = self.connect_requests.saturating_add(1);
        context.action = JoinAction::IssueConnect;
    }

    fn raise(&mut self, context: &mut DispatchContext, flag: SyncFlags) {
        self.flags.insert(flag);
        context.action = JoinAction::Wake(self.flags);
    }

    fn wake_without_flag(&mut self, context: &mut DispatchContext) {
        context.action = JoinAction::Wake(self.flags);
    }
}

#[state_machine(initial = "State::idle()")]
impl JoinHsm {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &LinkEvent) -> Outcome<State> {
        match event {
            LinkEvent::StationStarted => {
                self.request_connect(context);
                self.phase = JoinPhase::Connecting;
                Transition(State::connecting())
            }
            LinkEvent::StationStopped => {
                self.wake_without_flag(context);
                Handled
            }
            // Leftovers from a previous association; the radio has not been
            // asked to connect yet.
            LinkEvent::Disconnected { .. } | LinkEvent::AddressAcquired { .. } => {
                context.action = JoinAction::Wait;
                Handled
            }
        }
    }

    #[state(superstate = "joining")]
    fn connecting(&mut self, context: &mut DispatchContext, event: &LinkEvent) -> Outcome<State> {
        match event {
            LinkEvent::StationStarted => {
                context.action = JoinAction::Wait;
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "joining")]
    fn retrying(&mut self, context: &mut DispatchContext, event: &LinkEvent) -> Outcome<State> {
        match event {
            LinkEvent::StationStarted => {
                context.action = JoinAction::Wait;
                Handled
            }
            _ => Super,
        }
    }

    #[superstate]
    fn joining(&mut self, context: &mut DispatchContext, event: &LinkEvent) -> Outcome<State> {
        match event {
            LinkEvent::Disconnected { .. } => {
                if self.retries.try_increment() {
                    self.request_connect(context);
                    self.phase = JoinPhase::Retrying;
                    Transition(State::retrying())
                } else {
                    self.raise(context, SyncFlags::FAILED);
                    self.phase = JoinPhase::Failed;
                    Transition(State::failed())
                }
            }
            LinkEvent::AddressAcquired { .. } => {
                self.retries.reset();
                self.raise(context, SyncFlags::CONNECTED);
                self.phase = JoinPhase::Connected;
                Transition(State::connected())
            }
            LinkEvent::StationStopped => {
                self.wake_without_flag(context);
                Handled
            }
            LinkEvent::StationStarted => {
                context.action = JoinAction::Wait;
                Handled
            }
        }
    }

    #[state]
    fn connected(&mut self, context: &mut DispatchContext, event: &LinkEvent) -> Outcome<State> {
        debug!("join: {} ignored after connect", event.as_str());
        context.action = JoinAction::Wait;
        Handled
    }

    #[state]
    fn failed(&mut self, context: &mut DispatchContext, event: &LinkEvent) -> Outcome<State> {
        debug!("join: {} ignored after failure", event.as_str());
        context.action = JoinAction::Wait;
        Handled
    }
}

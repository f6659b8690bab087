//! Station-mode network join with a bounded retry ceiling.
//!
//! The radio driver posts [`LinkEvent`]s into a channel from its own event
//! context. One [`JoinAttempt`] owns the retry counter and the sync flags for
//! the duration of a single attempt, feeds each received event through the
//! join state machine, and returns once the machine raises a flag.

mod attempt;
mod engine;
mod machine;

use bitflags::bitflags;

pub use attempt::{
    attempt_join, join_network, post_link_event, JoinAttempt, JoinReport, LinkEventChannel,
    RadioError, StationNetwork, StationRadio, DISCONNECT_REASON_REFUSED, LINK_EVENT_DEPTH,
};
pub use engine::{JoinAction, JoinEngine, JoinSnapshot, JoinStep};

bitflags! {
    /// Wake condition for the waiting duty-cycle task.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SyncFlags: u8 {
        const CONNECTED = 1 << 0;
        const FAILED = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionOutcome {
    Connected,
    Exhausted,
    Unexpected,
}

impl ConnectionOutcome {
    /// `CONNECTED` wins when both flags are raised.
    pub fn from_flags(flags: SyncFlags) -> Self {
        if flags.contains(SyncFlags::CONNECTED) {
            Self::Connected
        } else if flags.contains(SyncFlags::FAILED) {
            Self::Exhausted
        } else {
            Self::Unexpected
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Exhausted => "exhausted",
            Self::Unexpected => "unexpected",
        }
    }

    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Notifications from the radio and IP layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    StationStarted,
    Disconnected { reason: u8 },
    AddressAcquired { ipv4: [u8; 4] },
    StationStopped,
}

impl LinkEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StationStarted => "sta_start",
            Self::Disconnected { .. } => "sta_disconnected",
            Self::AddressAcquired { .. } => "got_ip",
            Self::StationStopped => "sta_stop",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinPhase {
    Idle,
    Connecting,
    Retrying,
    Connected,
    Failed,
}

impl JoinPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Retrying => "Retrying",
            Self::Connected => "Connected",
            Self::Failed => "Failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Connected | Self::Failed)
    }
}

/// Retries used so far in one attempt, never above the ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryCounter {
    count: u8,
    ceiling: u8,
}

impl RetryCounter {
    pub const fn new(ceiling: u8) -> Self {
        Self { count: 0, ceiling }
    }

    pub const fn count(self) -> u8 {
        self.count
    }

    pub const fn ceiling(self) -> u8 {
        self.ceiling
    }

    pub const fn can_retry(self) -> bool {
        self.count < self.ceiling
    }

    pub fn try_increment(&mut self) -> bool {
        if !self.can_retry() {
            return false;
        }
        self.count += 1;
        true
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Disconnect reason labels as reported by the ESP32 Wi-Fi driver.
pub fn disconnect_reason_label(reason: u8) -> &'static str {
    match reason {
        2 => "auth_expire",
        8 => "assoc_leave",
        15 => "4way_handshake_timeout",
        200 => "beacon_timeout",
        201 => "no_ap_found",
        202 => "auth_fail",
        203 => "assoc_fail",
        204 => "handshake_timeout",
        205 => "connection_fail",
        210 => "no_ap_found_compatible_security",
        211 => "no_ap_found_authmode_threshold",
        212 => "no_ap_found_rssi_threshold",
        DISCONNECT_REASON_REFUSED => "connect_refused",
        _ => "other",
    }
}

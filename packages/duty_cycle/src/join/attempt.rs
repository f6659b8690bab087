use core::fmt;

use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    channel::{Channel, TrySendError},
};
use log::{debug, error, info, warn};

use super::engine::{JoinAction, JoinEngine, JoinSnapshot};
use super::{disconnect_reason_label, ConnectionOutcome, LinkEvent, SyncFlags};
use crate::{config::WifiCredentials, cycle::Network};

pub const LINK_EVENT_DEPTH: usize = 8;
/// Reason code used when the driver rejects a connect request outright.
pub const DISCONNECT_REASON_REFUSED: u8 = 0;

pub type LinkEventChannel<M> = Channel<M, LinkEvent, LINK_EVENT_DEPTH>;

/// Non-blocking post from driver context. Returns false, and warns, when the
/// queue is full and the event was dropped.
pub fn post_link_event<M: RawMutex>(events: &LinkEventChannel<M>, event: LinkEvent) -> bool {
    match events.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(dropped)) => {
            warn!(
                "join: link event queue full, dropped {} (depth {})",
                dropped.as_str(),
                LINK_EVENT_DEPTH
            );
            false
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioError {
    NotInitialized,
    InvalidConfig,
    Driver,
}

impl RadioError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::InvalidConfig => "invalid_config",
            Self::Driver => "driver",
        }
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Station interface of the Wi-Fi driver.
///
/// Listeners installed by [`StationRadio::install_listeners`] post into the
/// attempt's [`LinkEventChannel`] from the driver's event context and must
/// never block there.
pub trait StationRadio {
    fn install_listeners(&mut self);

    fn revoke_listeners(&mut self);

    /// Applies the station config and starts the interface. Success is
    /// followed by [`LinkEvent::StationStarted`].
    fn start(&mut self, credentials: &WifiCredentials) -> Result<(), RadioError>;

    /// Issues one connect request. `retry` is 0 for the first request of the
    /// attempt.
    fn connect(&mut self, retry: u8) -> Result<(), RadioError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinReport {
    pub outcome: ConnectionOutcome,
    pub snapshot: Option<JoinSnapshot>,
}

/// One join attempt. Listeners are live between [`JoinAttempt::begin`] and
/// drop, whichever way the attempt ends.
pub struct JoinAttempt<'a, M: RawMutex, R: StationRadio> {
    radio: &'a mut R,
    events: &'a LinkEventChannel<M>,
    engine: JoinEngine,
}

impl<'a, M: RawMutex, R: StationRadio> JoinAttempt<'a, M, R> {
    pub fn begin(radio: &'a mut R, events: &'a LinkEventChannel<M>, max_retries: u8) -> Self {
        events.clear();
        radio.install_listeners();
        Self {
            radio,
            events,
            engine: JoinEngine::new(max_retries),
        }
    }

    pub fn snapshot(&self) -> JoinSnapshot {
        self.engine.snapshot()
    }

    pub async fn run(mut self, credentials: &WifiCredentials) -> JoinReport {
        if let Err(err) = self.radio.start(credentials) {
            error!("join: station start failed err={}", err);
            return self.finish(SyncFlags::empty());
        }
        info!("join: station started ssid={}", credentials.ssid);

        let mut pending = None;
        let flags = loop {
            let event = match pending.take() {
                Some(event) => event,
                None => self.events.receive().await,
            };
            if let LinkEvent::Disconnected { reason } = event {
                info!(
                    "join: disconnected reason={} ({})",
                    reason,
                    disconnect_reason_label(reason)
                );
            }

            let step = self.engine.apply(event);
            if step.changed_phase() {
                debug!(
                    "NET_EVENT {{\"from\":\"{}\",\"to\":\"{}\",\"trigger\":\"{}\",\"retry\":{}}}",
                    step.before.phase.as_str(),
                    step.after.phase.as_str(),
                    event.as_str(),
                    step.after.retries
                );
            }

            match step.action {
                JoinAction::Wait => {}
                JoinAction::IssueConnect => {
                    let retry = step.after.retries;
                    if retry > 0 {
                        info!("join: retry {}/{}", retry, step.after.max_retries);
                    }
                    if let Err(err) = self.radio.connect(retry) {
                        warn!("join: connect request refused err={}", err);
                        pending = Some(LinkEvent::Disconnected {
                            reason: DISCONNECT_REASON_REFUSED,
                        });
                    }
                }
                JoinAction::Wake(flags) => break flags,
            }
        };

        self.finish(flags)
    }

    fn finish(&self, flags: SyncFlags) -> JoinReport {
        let snapshot = self.engine.snapshot();
        let outcome = ConnectionOutcome::from_flags(flags);
        match outcome {
            ConnectionOutcome::Connected => info!(
                "join: connected after {} request(s)",
                snapshot.connect_requests
            ),
            ConnectionOutcome::Exhausted => warn!(
                "join: gave up after {} request(s)",
                snapshot.connect_requests
            ),
            ConnectionOutcome::Unexpected => error!(
                "join: woke without connected/failed flag phase={}",
                snapshot.phase.as_str()
            ),
        }
        JoinReport {
            outcome,
            snapshot: Some(snapshot),
        }
    }
}

impl<M: RawMutex, R: StationRadio> Drop for JoinAttempt<'_, M, R> {
    fn drop(&mut self) {
        self.radio.revoke_listeners();
        self.events.clear();
    }
}

/// Runs one join attempt sequence and reports how it ended.
pub async fn join_network<M: RawMutex, R: StationRadio>(
    radio: &mut R,
    events: &LinkEventChannel<M>,
    credentials: &WifiCredentials,
    max_retries: u8,
) -> ConnectionOutcome {
    attempt_join(radio, events, credentials, max_retries)
        .await
        .outcome
}

/// [`join_network`] with the final attempt snapshot attached. The snapshot is
/// `None` when the credentials were rejected before the radio was touched.
pub async fn attempt_join<M: RawMutex, R: StationRadio>(
    radio: &mut R,
    events: &LinkEventChannel<M>,
    credentials: &WifiCredentials,
    max_retries: u8,
) -> JoinReport {
    if let Err(err) = credentials.validate() {
        error!("join: credentials rejected err={}", err);
        return JoinReport {
            outcome: ConnectionOutcome::Exhausted,
            snapshot: None,
        };
    }
    JoinAttempt::begin(radio, events, max_retries)
        .run(credentials)
        .await
}

/// [`Network`] backed by a station radio and its event channel.
pub struct StationNetwork<'a, M: RawMutex, R: StationRadio> {
    radio: R,
    events: &'a LinkEventChannel<M>,
    last_report: Option<JoinReport>,
}

impl<'a, M: RawMutex, R: StationRadio> StationNetwork<'a, M, R> {
    pub fn new(radio: R, events: &'a LinkEventChannel<M>) -> Self {
        Self {
            radio,
            events,
            last_report: None,
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn last_report(&self) -> Option<JoinReport> {
        self.last_report
    }
}

impl<M: RawMutex, R: StationRadio> Network for StationNetwork<'_, M, R> {
    async fn join(&mut self, credentials: &WifiCredentials, max_retries: u8) -> ConnectionOutcome {
        let report = attempt_join(&mut self.radio, self.events, credentials, max_retries).await;
        self.last_report = Some(report);
        report.outcome
    }
}

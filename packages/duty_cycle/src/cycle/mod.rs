//! Wake-cause dispatch and the sleep discipline around it.
//!
//! [`DutyCycle::execute`] has no error path: every failure below it degrades
//! into a [`CycleReport`] entry, so [`DutyCycle::run`] always reaches
//! [`PowerControl::enter_deep_sleep`].


use core::time::Duration;

use log::{info, warn};

use crate::{
    config::{NodeConfig, WifiCredentials, PAYLOAD_MAX},
    join::ConnectionOutcome,
    line_protocol::encode,
    telemetry::TelemetrySource,
    upload::{UploadRequest, UploadResult, UploadTransport},
    wake::WakeCause,
};

/// Station-mode connectivity as seen by the dispatcher.
#[allow(async_fn_in_trait)]
pub trait Network {
    async fn join(&mut self, credentials: &WifiCredentials, max_retries: u8) -> ConnectionOutcome;
}

#[allow(async_fn_in_trait)]
pub trait PowerControl {
    /// What entering sleep hands back. `Infallible` on hardware.
    type Suspended;

    /// Arms the wake timer. Arming again replaces the previous interval.
    fn arm_timer_wakeup(&mut self, interval: Duration);

    /// Pause before sleep so buffered log output reaches the console.
    async fn settle(&mut self, delay: Duration);

    fn enter_deep_sleep(&mut self) -> Self::Suspended;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleReport {
    pub wake: WakeCause,
    pub join: Option<ConnectionOutcome>,
    pub upload: Option<UploadResult>,
    pub payload_truncated: bool,
}

impl CycleReport {
    const fn new(wake: WakeCause) -> Self {
        Self {
            wake,
            join: None,
            upload: None,
            payload_truncated: false,
        }
    }

    pub fn uploaded(&self) -> bool {
        self.upload.is_some_and(UploadResult::is_success)
    }
}

pub struct DutyCycle<'a, S, N, T, P> {
    config: &'a NodeConfig,
    source: S,
    network: N,
    transport: T,
    power: P,
}

impl<'a, S, N, T, P> DutyCycle<'a, S, N, T, P>
where
    S: TelemetrySource,
    N: Network,
    T: UploadTransport,
    P: PowerControl,
{
    pub fn new(config: &'a NodeConfig, source: S, network: N, transport: T, power: P) -> Self {
        Self {
            config,
            source,
            network,
            transport,
            power,
        }
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    pub async fn execute(&mut self, wake: WakeCause) -> CycleReport {
        self.power.arm_timer_wakeup(self.config.sleep_interval);
        info!(
            "cycle: wake={} sleep_in={}s",
            wake.as_str(),
            self.config.sleep_interval.as_secs()
        );

        let mut report = CycleReport::new(wake);
        if wake.runs_uplink() {
            self.uplink(&mut report).await;
        } else {
            info!("cycle: cold boot, arming sampler");
            self.source.setup(&self.config.thresholds);
        }
        report
    }

    async fn uplink(&mut self, report: &mut CycleReport) {
        let outcome = self
            .network
            .join(&self.config.credentials, self.config.max_retries)
            .await;
        report.join = Some(outcome);
        if !outcome.is_connected() {
            warn!("cycle: join {}, skipping upload", outcome.as_str());
            return;
        }

        let sample = self.source.capture();
        let payload = encode::<PAYLOAD_MAX>(&sample, &self.config.schema);
        report.payload_truncated = payload.is_truncated();
        if payload.is_empty() {
            warn!("cycle: nothing to upload");
            return;
        }

        let request = UploadRequest::new(&self.config.endpoint, payload.as_bytes());
        let result = self.transport.upload(&request).await;
        if !result.is_success() {
            warn!("cycle: upload {}", result);
        }
        report.upload = Some(result);
    }

    /// Runs one cycle and enters deep sleep.
    pub async fn run(mut self, wake: WakeCause) -> P::Suspended {
        let report = self.execute(wake).await;

        self.source.enable();
        info!(
            "cycle: done wake={} join={} upload={} truncated={}",
            report.wake.as_str(),
            report.join.map_or("skipped", ConnectionOutcome::as_str),
            match report.upload {
                Some(result) if result.is_success() => "ok",
                Some(_) => "failed",
                None => "skipped",
            },
            report.payload_truncated
        );
        self.power.settle(self.config.log_flush_delay).await;
        self.power.enter_deep_sleep()
    }
}

//! Hardware-independent duty-cycle core for the barometric sensor node.
//!
//! One wake cycle is: arm the wake timer, branch on why the chip woke, join the
//! station network and upload one line-protocol record when the wake came from
//! the timer, then re-enable co-processor sampling and enter deep sleep. The
//! firmware binary supplies the hardware behind the traits in [`cycle`],
//! [`join`], [`telemetry`], [`upload`] and [`storage`].

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod cycle;
pub mod join;
pub mod line_protocol;
pub mod sampler;
pub mod storage;
pub mod telemetry;
pub mod upload;
pub mod wake;

pub use config::{Endpoint, LineSchema, NodeConfig, SamplingThresholds, TagSet, WifiCredentials};
pub use cycle::{CycleReport, DutyCycle, Network, PowerControl};
pub use join::{
    join_network, post_link_event, ConnectionOutcome, JoinAttempt, LinkEvent, LinkEventChannel,
    StationNetwork, StationRadio, SyncFlags,
};
pub use line_protocol::{encode, Payload};
pub use sampler::{SamplerImage, SamplerImageError};
pub use storage::{bootstrap_storage, PersistentStore, StorageBootstrap, StorageInitError};
pub use telemetry::{FieldValue, TelemetrySample, TelemetrySource};
pub use upload::{
    exchange, log_http_event, HttpEvent, TransportError, UploadRequest, UploadResult,
    UploadTransport,
};
pub use wake::WakeCause;

//! Persistent store bootstrap run once per boot before anything else.

use core::fmt;

use log::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageInitError {
    /// No record has ever been written.
    Blank,
    /// The record was written by a different layout version.
    NewVersionFound { found: u8 },
    Corrupted,
    /// The flash driver itself failed.
    Flash,
}

impl StorageInitError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::NewVersionFound { .. } => "new_version_found",
            Self::Corrupted => "corrupted",
            Self::Flash => "flash",
        }
    }

    /// Conditions an erase can clear. Driver failures are not among them.
    pub const fn needs_erase(self) -> bool {
        matches!(
            self,
            Self::Blank | Self::NewVersionFound { .. } | Self::Corrupted
        )
    }
}

impl fmt::Display for StorageInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewVersionFound { found } => write!(f, "{} ({})", self.as_str(), found),
            _ => f.write_str(self.as_str()),
        }
    }
}

pub trait PersistentStore {
    fn open(&mut self) -> Result<(), StorageInitError>;

    fn erase(&mut self) -> Result<(), StorageInitError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBootstrap {
    Ready,
    Reformatted,
}

/// Opens the store, erasing and reopening once when the contents are
/// unusable. An error here is fatal for the boot.
pub fn bootstrap_storage<S: PersistentStore>(
    store: &mut S,
) -> Result<StorageBootstrap, StorageInitError> {
    match store.open() {
        Ok(()) => {
            info!("storage: ready");
            Ok(StorageBootstrap::Ready)
        }
        Err(err) if err.needs_erase() => {
            warn!("storage: {}; erasing", err);
            store.erase()?;
            store.open().map_err(|err| {
                error!("storage: reopen after erase failed err={}", err);
                err
            })?;
            info!("storage: reformatted");
            Ok(StorageBootstrap::Reformatted)
        }
        Err(err) => {
            error!("storage: open failed err={}", err);
            Err(err)
        }
    }
}

//! Non-volatile settings store (spec §6). Opaque keyed-blob interface;
//! the host owns the actual medium (flash, file, in-memory double for
//! tests). `NetworkInfo` + `ParentInfo` drive role recovery on restore.

use crate::error::{MleError, MleResult};

/// Recognized top-level settings keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingsKey {
    ActiveDataset,
    PendingDataset,
    NetworkInfo,
    ParentInfo,
    ChildInfo,
    SlaacIidSecretKey,
    DadInfo,
    SrpEcdsaKey,
    SrpClientInfo,
    SrpServerInfo,
    BrUlaPrefix,
    BrOnLinkPrefixes,
    BorderAgentId,
    TcatCommrCert,
}

impl SettingsKey {
    /// Keys that MUST be held in a secure region, per spec §6.
    pub fn is_sensitive(self) -> bool {
        matches!(
            self,
            Self::ActiveDataset | Self::PendingDataset | Self::SrpEcdsaKey
        )
    }

    /// Whether this key holds a list (supports `add`/`delete(index)`)
    /// rather than a single blob.
    pub fn is_list_valued(self) -> bool {
        matches!(self, Self::ChildInfo | Self::BrOnLinkPrefixes)
    }
}

/// Top-level version tag every persisted blob is stamped with. A
/// mismatch on restore forces re-attach (spec §6).
pub const SETTINGS_VERSION: u16 = 1;

pub trait SettingsStore {
    /// Read a single-valued key into `out`; returns the byte count
    /// written, or `NotFound` if absent.
    fn get(&self, key: SettingsKey, out: &mut [u8]) -> MleResult<usize>;

    fn set(&mut self, key: SettingsKey, value: &[u8]) -> MleResult<()>;

    fn delete(&mut self, key: SettingsKey) -> MleResult<()>;

    /// Append an entry to a list-valued key.
    fn add(&mut self, key: SettingsKey, value: &[u8]) -> MleResult<()> {
        if !key.is_list_valued() {
            return Err(MleError::InvalidArgs);
        }
        self.set(key, value)
    }

    /// Remove the entry at `index` from a list-valued key.
    fn delete_at(&mut self, key: SettingsKey, index: usize) -> MleResult<()>;

    /// Erase all persisted state.
    fn wipe(&mut self) -> MleResult<()>;
}

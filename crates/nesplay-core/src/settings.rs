use crate::storage::write_atomic;
use crate::volume::MAX_VOLUME_LEVEL;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The persisted settings record, shared by every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsRecord {
    pub volume_level: u8,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            volume_level: MAX_VOLUME_LEVEL,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("failed to write settings to {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Stable identifier of a settings participant.
pub type ParticipantId = &'static str;

type LoadFn = Box<dyn FnMut(&SettingsRecord)>;
type SaveFn = Box<dyn FnMut(&mut SettingsRecord)>;

struct Participant {
    load: LoadFn,
    save: SaveFn,
}

/// Settings record plus the components that read from and write into it.
///
/// Each participant registers a load/save callback pair under a stable id when
/// it is constructed and unregisters when it goes away.
pub struct Settings {
    path: PathBuf,
    record: SettingsRecord,
    participants: BTreeMap<ParticipantId, Participant>,
}

impl Settings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            record: SettingsRecord::default(),
            participants: BTreeMap::new(),
        }
    }

    /// Register a participant. An id that is already registered keeps its
    /// existing callbacks and `false` is returned.
    pub fn register(
        &mut self,
        id: ParticipantId,
        load: impl FnMut(&SettingsRecord) + 'static,
        save: impl FnMut(&mut SettingsRecord) + 'static,
    ) -> bool {
        if self.participants.contains_key(id) {
            return false;
        }
        self.participants.insert(
            id,
            Participant {
                load: Box::new(load),
                save: Box::new(save),
            },
        );
        true
    }

    /// Remove a participant. Removing an unknown id is a no-op.
    pub fn unregister(&mut self, id: ParticipantId) -> bool {
        self.participants.remove(id).is_some()
    }

    pub fn is_registered(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Read the record from disk (defaults on any failure) and let every
    /// participant pull its state from it.
    pub fn load(&mut self) {
        self.record = read_record(&self.path);
        for participant in self.participants.values_mut() {
            (participant.load)(&self.record);
        }
    }

    /// Let every participant push its state into the record, then write it.
    pub fn save(&mut self) -> Result<(), SettingsError> {
        for participant in self.participants.values_mut() {
            (participant.save)(&mut self.record);
        }
        write_record(&self.path, &self.record)
    }
}

pub fn read_record(path: &Path) -> SettingsRecord {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            debug!("No settings at {} ({e}); using defaults", path.display());
            return SettingsRecord::default();
        }
    };

    match toml::from_str::<SettingsRecord>(&text) {
        Ok(record) => record,
        Err(e) => {
            warn!(
                "Failed to parse settings {}: {e}; using defaults",
                path.display()
            );
            SettingsRecord::default()
        }
    }
}

pub fn write_record(path: &Path, record: &SettingsRecord) -> Result<(), SettingsError> {
    let text = toml::to_string_pretty(record)?;
    write_atomic(path, text.as_bytes()).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

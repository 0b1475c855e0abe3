use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::StoreError;
use crate::types::Profile;

pub(crate) const SLOT_NAME: &str = "lifesync_state.json";

/// The single persistence slot holding the JSON-serialized profile.
pub(crate) struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SLOT_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the slot. A missing or unreadable slot yields the default profile;
    /// this never fails.
    pub fn load(&self) -> Profile {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("no saved profile at {:?}, starting fresh", self.path);
                return Profile::default();
            }
            Err(err) => {
                tracing::warn!("failed to read {:?}: {}", self.path, err);
                return Profile::default();
            }
        };

        match merge_onto_defaults(&raw) {
            Ok(profile) => {
                tracing::info!(
                    entries = profile.entries.len(),
                    moods = profile.moods.len(),
                    "loaded profile from {:?}",
                    self.path
                );
                profile
            }
            Err(err) => {
                tracing::warn!("error loading state from {:?}: {}", self.path, err);
                Profile::default()
            }
        }
    }

    /// Overwrites the slot with the whole profile.
    pub fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile)?;
        write_atomic(&self.path, &json)?;
        tracing::trace!("saved profile to {:?}", self.path);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("removed {:?}", self.path);
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Writes a pretty-printed copy of `profile` into `dir`, named after `date`.
pub(crate) fn export(profile: &Profile, dir: &Path, date: NaiveDate) -> Result<PathBuf, StoreError> {
    let path = dir.join(format!("lifesync-export-{}.json", date.format("%Y-%m-%d")));
    let json = serde_json::to_string_pretty(profile)?;
    write_atomic(&path, &json)?;
    tracing::info!("exported profile to {:?}", path);
    Ok(path)
}

/// Overlays the top-level keys of the saved document onto a default profile.
/// Documents that are valid JSON but not objects leave the defaults untouched.
fn merge_onto_defaults(raw: &str) -> Result<Profile, serde_json::Error> {
    let saved: Value = serde_json::from_str(raw)?;
    let mut merged = serde_json::to_value(Profile::default())?;
    if let (Value::Object(base), Value::Object(saved)) = (&mut merged, saved) {
        base.extend(saved);
    }
    serde_json::from_value(merged)
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)
}

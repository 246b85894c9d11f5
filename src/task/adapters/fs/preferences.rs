//! JSON-file preference persistence in a capability directory.

use crate::task::domain::QuerySpec;
use crate::task::ports::{PreferenceStore, PreferenceStoreResult};
use cap_std::fs_utf8::Dir;
use std::io;

/// Preference store writing the selection as pretty JSON into a file.
///
/// Access is scoped to the capability directory handed in at construction;
/// a missing file loads as "no selection saved yet".
#[derive(Debug)]
pub struct JsonFilePreferences {
    dir: Dir,
    file_name: String,
}

impl JsonFilePreferences {
    /// Creates a store writing `file_name` inside `dir`.
    #[must_use]
    pub fn new(dir: Dir, file_name: impl Into<String>) -> Self {
        Self {
            dir,
            file_name: file_name.into(),
        }
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn load(&self) -> PreferenceStoreResult<Option<QuerySpec>> {
        match self.dir.read_to_string(&self.file_name) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, spec: &QuerySpec) -> PreferenceStoreResult<()> {
        let raw = serde_json::to_string_pretty(spec)?;
        self.dir.write(&self.file_name, raw)?;
        Ok(())
    }
}

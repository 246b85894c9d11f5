//! Filesystem adapters for the preference port.

mod preferences;

pub use preferences::JsonFilePreferences;

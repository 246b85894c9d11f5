//! In-memory adapters for the repository and preference ports.

mod preferences;
mod repository;

pub use preferences::InMemoryPreferenceStore;
pub use repository::InMemoryTaskRepository;

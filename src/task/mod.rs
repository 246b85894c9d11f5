//! Client-side task synchronization.
//!
//! Keeps an in-memory task collection consistent with a remote CRUD API
//! while supporting optimistic mutation, per-task mutation ordering,
//! filtering, sorting, search, and race-condition-safe reconciliation. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

//! Taskdeck: a client-side task synchronization engine.
//!
//! This crate keeps an authoritative in-memory task collection consistent
//! with a remote CRUD API: mutations apply optimistically and reconcile
//! against server acknowledgements, requests for the same task are strictly
//! serialized, and the visible sequence is derived by a pure, deterministic
//! query function.
//!
//! # Architecture
//!
//! Taskdeck follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (server emulation,
//!   preference files)
//!
//! # Modules
//!
//! - [`task`]: Optimistic task store, per-task mutation serialization, and
//!   query derivation

pub mod task;

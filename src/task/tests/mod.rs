//! Unit tests for the task synchronization engine.

mod coordinator_tests;
mod query_tests;

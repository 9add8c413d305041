//! Unit tests for deckhand
//!
//! These tests use recording doubles and mocks and run without network I/O.

mod dispatcher_lifecycle;
mod helpers;
mod property_tests;
mod remote_executor;

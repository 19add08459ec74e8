//! Deterministic, pure logic for the gate.
//!
//! Core modules must be free of I/O side effects. Repository state and the
//! persisted context reach the engine only through the traits defined here.

pub mod branch;
pub mod engine;
pub mod remediation;
pub mod rules;
pub mod session;
pub mod types;
